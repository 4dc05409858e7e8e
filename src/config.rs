use crate::chart::DEFAULT_BINS;
use crate::filter::{FilterSet, DEFAULT_MAX_BUDGET, DEFAULT_MIN_ROI};

/// Dark theme palette shared by figures and the HTML dashboard.
pub mod palette {
    pub const BACKGROUND: &str = "#0a0e1a";
    pub const PANEL: &str = "#161b2e";
    pub const PANEL_LIGHT: &str = "#1e2539";
    pub const BORDER: &str = "#2d3548";
    pub const TEXT: &str = "#f5f7fa";
    pub const TEXT_SECONDARY: &str = "#b4bcd0";
    pub const ACCENT_BLUE: &str = "#4c9aff";
    pub const ACCENT_GREEN: &str = "#36d399";
    pub const ACCENT_ORANGE: &str = "#ff9f43";
    pub const ACCENT_RED: &str = "#ff5e6c";
    pub const ACCENT_PURPLE: &str = "#9c6ade";
    pub const FONT_FAMILY: &str = "Inter, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif";
}

#[derive(Debug, Clone)]
pub struct Config {
    pub report_dir: String,
    pub server_addr: String,
    pub hist_bins: usize,
    pub max_budget: f64,
    pub min_roi: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            report_dir: std::env::var("REPORT_DIR")
                .unwrap_or_else(|_| "out/dashboard".to_string()),
            server_addr: std::env::var("SERVER_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8765".to_string()),
            hist_bins: std::env::var("HIST_BINS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|b| *b > 0)
                .unwrap_or(DEFAULT_BINS),
            max_budget: std::env::var("MAX_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BUDGET),
            min_roi: std::env::var("MIN_ROI")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MIN_ROI),
        }
    }

    /// Everything selected, thresholds from the environment.
    pub fn default_filters(&self) -> FilterSet {
        FilterSet::default()
            .with_max_budget(self.max_budget)
            .with_min_roi(self.min_roi)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_dir: "out/dashboard".to_string(),
            server_addr: "127.0.0.1:8765".to_string(),
            hist_bins: DEFAULT_BINS,
            max_budget: DEFAULT_MAX_BUDGET,
            min_roi: DEFAULT_MIN_ROI,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filters_use_thresholds() {
        let cfg = Config {
            max_budget: 120.0,
            min_roi: 1.5,
            ..Config::default()
        };
        let filters = cfg.default_filters();
        assert_eq!(filters.max_budget, 120.0);
        assert_eq!(filters.min_roi, 1.5);
        assert_eq!(filters.departments.len(), 4);
    }
}
