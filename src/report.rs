//! Self-contained HTML dashboard.
//!
//! Output: `<dir>/index.html` + `<dir>/dashboard.json`

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chart::ChartSpec;
use crate::data::{DatasetManifest, Table};
use crate::error::ReportError;
use crate::figure::render_chart;
use crate::filter::{filter_rows, FilterSet, Preset, BUDGET_SLIDER, ROI_SLIDER};
use crate::logging::{log_report_written, ts_now, ProfileScope};
use crate::metrics::{PortfolioSummary, SummaryCard};
use crate::table::{DisplayTable, SortOrder};

#[derive(Debug, Clone, Serialize)]
pub struct PresetEntry {
    pub slug: &'static str,
    pub label: &'static str,
}

/// Everything the page shows, computed once.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub generated_at: String,
    pub manifest: DatasetManifest,
    pub filters: FilterSet,
    pub presets: Vec<PresetEntry>,
    pub summary: PortfolioSummary,
    pub cards: Vec<SummaryCard>,
    pub table: DisplayTable,
    pub chart: ChartSpec,
    /// Plotly figure JSON.
    pub figure: Value,
}

impl Dashboard {
    pub fn build(table: &Table, filters: &FilterSet, spec: &ChartSpec) -> Self {
        let _scope = ProfileScope::new("dashboard_build");
        let filtered = filter_rows(table, filters);
        let summary = PortfolioSummary::from_table(&filtered);
        Self {
            title: "AEGIS Equipment Portfolio Analyzer".to_string(),
            generated_at: ts_now(),
            manifest: table.manifest(),
            filters: filters.clone(),
            presets: Preset::ALL
                .iter()
                .map(|p| PresetEntry {
                    slug: p.slug(),
                    label: p.label(),
                })
                .collect(),
            cards: summary.cards(),
            summary,
            table: DisplayTable::build(&filtered, SortOrder::default()),
            chart: spec.clone(),
            figure: render_chart(&filtered, spec).to_plotly(),
        }
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_html(&self) -> Result<String, ReportError> {
        let blob = serde_json::to_string(self)?;
        // keep the blob from closing its script element
        let blob = blob.replace("</", "<\\/");
        let sliders = serde_json::to_string(&[BUDGET_SLIDER, ROI_SLIDER])?;
        Ok(TEMPLATE
            .replace("__DASHBOARD_TITLE__", &self.title)
            .replace("__SLIDERS__", &sliders)
            .replace("__DASHBOARD_DATA__", &blob))
    }

    /// Write `index.html` and `dashboard.json` into `dir`, creating it.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(dir).map_err(|source| ReportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let outputs = [
            (dir.join("index.html"), self.render_html()?),
            (dir.join("dashboard.json"), self.to_json()?),
        ];
        let mut written = Vec::with_capacity(outputs.len());
        for (path, body) in outputs {
            fs::write(&path, &body).map_err(|source| ReportError::Io {
                path: path.clone(),
                source,
            })?;
            log_report_written(&path.display().to_string(), body.len());
            written.push(path);
        }
        Ok(written)
    }
}

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>__DASHBOARD_TITLE__</title>
  <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
  <style>
    :root {
      --bg: #0a0e1a; --panel: #161b2e; --panel-light: #1e2539; --border: #2d3548;
      --fg: #f5f7fa; --fg-muted: #b4bcd0;
      --blue: #4c9aff; --green: #36d399; --orange: #ff9f43; --red: #ff5e6c; --purple: #9c6ade;
      --sans: Inter, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
      --radius: 8px;
    }
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
    body { font-family: var(--sans); background: var(--bg); color: var(--fg); line-height: 1.5; }
    header { padding: 1.25rem 1.5rem; border-bottom: 1px solid var(--border); background: var(--panel); }
    header h1 { font-size: 1.3rem; font-weight: 700; letter-spacing: -0.01em; }
    header .sub { color: var(--fg-muted); font-size: 0.75rem; }
    main { max-width: 1280px; margin: 0 auto; padding: 1.5rem; display: grid; gap: 1.25rem; }
    .cards { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; }
    .card { background: var(--panel); border: 1px solid var(--border); border-radius: var(--radius); padding: 1rem; }
    .card .label { color: var(--fg-muted); font-size: 0.72rem; text-transform: uppercase; letter-spacing: 0.05em; }
    .card .value { font-size: 1.6rem; font-weight: 700; color: var(--blue); }
    .panel { background: var(--panel); border: 1px solid var(--border); border-radius: var(--radius); padding: 1rem; }
    .filters { display: flex; gap: 1.5rem; flex-wrap: wrap; font-size: 0.8rem; color: var(--fg-muted); }
    .filters b { color: var(--fg); font-weight: 600; }
    .presets span { display: inline-block; padding: 0.15rem 0.5rem; margin-right: 0.4rem; border-radius: 4px; background: var(--panel-light); }
    table { width: 100%; border-collapse: collapse; font-size: 0.8rem; }
    th { text-align: left; color: var(--fg-muted); border-bottom: 1px solid var(--border); padding: 0.4rem; }
    td { padding: 0.35rem 0.4rem; border-bottom: 1px solid var(--panel-light); }
    tr:hover td { background: var(--panel-light); }
    .empty { color: var(--orange); font-weight: 600; padding: 1rem 0; }
    footer { color: var(--fg-muted); font-size: 0.7rem; text-align: center; padding: 1rem; }
  </style>
</head>
<body>
  <header>
    <h1 id="title"></h1>
    <div class="sub" id="subtitle"></div>
  </header>
  <main>
    <section class="cards" id="cards"></section>
    <section class="panel filters" id="filters"></section>
    <section class="panel"><div id="chart"></div></section>
    <section class="panel" id="table"></section>
  </main>
  <footer id="footer"></footer>

  <script type="application/json" id="dashboard-data">__DASHBOARD_DATA__</script>
  <script>
  const D = JSON.parse(document.getElementById('dashboard-data').textContent);
  const SLIDERS = __SLIDERS__;
  const esc = s => String(s).replace(/[&<>"]/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;'}[c]));

  document.getElementById('title').textContent = D.title;
  document.getElementById('subtitle').textContent =
    `${D.manifest.row_count} records · sha256 ${D.manifest.hash_sha256.slice(0, 12)}`;

  document.getElementById('cards').innerHTML = D.cards.map(c =>
    `<div class="card"><div class="label">${esc(c.label)}</div><div class="value">${esc(c.value)}</div></div>`
  ).join('');

  const list = xs => xs.length ? xs.map(esc).join(', ') : 'any';
  const f = D.filters;
  document.getElementById('filters').innerHTML = [
    `<div><b>Departments</b> ${list(f.departments)}</div>`,
    `<div><b>Categories</b> ${list(f.categories)}</div>`,
    `<div><b>Priorities</b> ${list(f.priorities)}</div>`,
    `<div><b>Max budget</b> ${f.max_budget}${SLIDERS[0].suffix}</div>`,
    `<div><b>Min ROI</b> ${f.min_roi}${SLIDERS[1].suffix}</div>`,
    `<div class="presets"><b>Presets</b> ${D.presets.map(p => `<span>${esc(p.label)}</span>`).join('')}</div>`,
  ].join('');

  Plotly.newPlot('chart', D.figure.data, D.figure.layout, {responsive: true, displaylogo: false});

  const t = D.table;
  document.getElementById('table').innerHTML = t.message
    ? `<div class="empty">${esc(t.message)}</div>`
    : `<table><thead><tr>${t.columns.map(c => `<th>${esc(c)}</th>`).join('')}</tr></thead>` +
      `<tbody>${t.rows.map(r => `<tr>${r.map(v => `<td>${esc(v)}</td>`).join('')}</tr>`).join('')}</tbody></table>`;

  document.getElementById('footer').textContent = `Generated ${D.generated_at}`;
  </script>
</body>
</html>
"##;
