use aegis::chart::{build_chart_spec, ChartKind, ChartOptions};
use aegis::data::base_table;
use aegis::error::ValidationError;
use aegis::figure::{render_chart, render_request, Trace};
use aegis::filter::{filter_rows, FilterSet};
use aegis::schema::{ColorBy, Field};

#[test]
fn every_accepted_combination_renders() {
    let table = base_table();
    for kind in ChartKind::ALL {
        for x in kind.x_options() {
            for y in kind.y_options() {
                let options = ChartOptions::default();
                let spec = build_chart_spec(kind, *x, *y, ColorBy::Department, options)
                    .unwrap_or_else(|e| panic!("{} {} {}: {}", kind, x, y, e));
                let fig = render_chart(&table, &spec);
                assert!(fig.message.is_none());
                assert!(!fig.traces.is_empty());
            }
        }
    }
}

#[test]
fn categorical_y_is_always_rejected() {
    for kind in [ChartKind::Bar, ChartKind::Scatter, ChartKind::Box] {
        for y in Field::CATEGORICAL {
            let x = if kind == ChartKind::Box { Field::Department } else { Field::CostM };
            let err = build_chart_spec(kind, x, y, ColorBy::None, ChartOptions::default())
                .unwrap_err();
            assert!(matches!(err, ValidationError::NotNumeric { .. }));
        }
    }
}

#[test]
fn scatter_trendline_groups() {
    let table = base_table();
    let fig = render_request(
        &table,
        ChartKind::Scatter,
        Field::CostM,
        Field::ValueScore,
        ColorBy::Department,
        ChartOptions::default().with_trendline(true),
    );
    let scatters = fig.traces.iter().filter(|t| matches!(t, Trace::Scatter { .. })).count();
    let lines = fig.traces.iter().filter(|t| matches!(t, Trace::Trendline { .. })).count();
    assert_eq!(scatters, 4);
    assert_eq!(lines, 4);
    let points: usize = fig
        .traces
        .iter()
        .map(|t| match t {
            Trace::Scatter { x, .. } => x.len(),
            _ => 0,
        })
        .sum();
    assert_eq!(points, 20);
}

#[test]
fn histogram_bins_span_whole_range() {
    let table = base_table();
    let spec = build_chart_spec(
        ChartKind::Histogram,
        Field::CostM,
        Field::CostM,
        ColorBy::None,
        ChartOptions::default().with_bins(8),
    )
    .unwrap();
    let fig = render_chart(&table, &spec);
    let Trace::Histogram { bins, .. } = &fig.traces[0] else {
        panic!("expected histogram");
    };
    assert_eq!(bins.len(), 8);
    assert_eq!(bins[0].start, 28.0);
    assert!((bins[7].end - 84.0).abs() < 1e-9);
    assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 20);
    assert!(bins[7].count >= 1);
}

#[test]
fn filtered_to_nothing_shows_message() {
    let table = base_table();
    let rows = filter_rows(&table, &FilterSet::default().with_min_roi(10.0));
    let fig = render_request(
        &rows,
        ChartKind::Box,
        Field::Category,
        Field::Roi,
        ColorBy::None,
        ChartOptions::default(),
    );
    assert_eq!(
        fig.message.unwrap().text,
        "No data available for selected filters"
    );
}

#[test]
fn rejected_request_reports_reason() {
    let fig = render_request(
        &base_table(),
        ChartKind::Histogram,
        Field::Priority,
        Field::Roi,
        ColorBy::None,
        ChartOptions::default(),
    );
    assert!(fig.is_error());
    assert!(fig.message.unwrap().text.contains("Histogram"));
}
