// Risk scoring buckets shared by the map and the dashboard widgets
use serde::Serialize;

pub const CRITICAL_THRESHOLD: f64 = 0.7;
pub const WARNING_THRESHOLD: f64 = 0.4;

pub const MARKER_BASE_RADIUS: f64 = 8.0;
pub const MARKER_RADIUS_SCALE: f64 = 12.0;

pub const CRITICAL_COLOR: &str = "#ff4d4f";
pub const WARNING_COLOR: &str = "#faad14";
pub const LOW_COLOR: &str = "#52c41a";
pub const UNKNOWN_COLOR: &str = "#8c8c8c";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Critical,
    Warning,
    Low,
}

impl RiskLevel {
    /// Buckets a score; an absent score is drawn as low risk.
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s >= CRITICAL_THRESHOLD => RiskLevel::Critical,
            Some(s) if s >= WARNING_THRESHOLD => RiskLevel::Warning,
            _ => RiskLevel::Low,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Critical => CRITICAL_COLOR,
            RiskLevel::Warning => WARNING_COLOR,
            RiskLevel::Low => LOW_COLOR,
        }
    }

    /// Label used in lists and tables.
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::Warning => "Medium",
            RiskLevel::Low => "Low",
        }
    }

    /// Status word shown in map tooltips.
    pub fn status(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::Warning => "Warning",
            RiskLevel::Low => "Ok",
        }
    }
}

/// Marker radius, `8 + 12 * score`, with an absent score treated as zero.
pub fn marker_radius(score: Option<f64>) -> f64 {
    MARKER_BASE_RADIUS + score.unwrap_or(0.0) * MARKER_RADIUS_SCALE
}

/// `"45.0%"`, or `"N/A"` when there is no score.
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.1}%", s * 100.0),
        None => "N/A".to_string(),
    }
}
