// Dashboard domain model
use super::chart::ChartData;
use super::noise::Lcg;
use super::risk_map::RiskMap;
use super::widgets::{Alert, DigitalTwin, MaterialShare, RecentInspection, RiskDistribution, TopRisk};
use serde::{Deserialize, Serialize};

pub const SPARKLINE_POINTS: usize = 12;

/// Aggregate counters served by the backend; carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_length: f64,
    pub total_inspections: i64,
    pub critical_defects: i64,
    pub active_pipes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub id: String,
    pub title: String,
    pub value: f64,
    pub precision: u32,
    pub color: String,
    pub sparkline: Vec<i64>,
}

impl StatCard {
    fn new(id: &str, title: &str, value: f64, precision: u32, color: &str, sparkline: Vec<i64>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            value,
            precision,
            color: color.to_string(),
            sparkline,
        }
    }

    /// The four statistic cards, in display order.
    pub fn from_stats(stats: &DashboardStats, seed: u64) -> Vec<StatCard> {
        vec![
            StatCard::new("total_length", "Total length (km)", stats.total_length, 1, "#1890ff", sparkline(seed)),
            StatCard::new(
                "total_inspections",
                "Inspections",
                stats.total_inspections as f64,
                0,
                "#52c41a",
                sparkline(seed.wrapping_add(1)),
            ),
            StatCard::new(
                "critical_defects",
                "Critical defects",
                stats.critical_defects as f64,
                0,
                "#ff4d4f",
                sparkline(seed.wrapping_add(2)),
            ),
            StatCard::new(
                "active_pipes",
                "Active pipes",
                stats.active_pipes as f64,
                0,
                "#722ed1",
                sparkline(seed.wrapping_add(3)),
            ),
        ]
    }
}

/// Decorative sparkline of integers in `[10, 30)`.
pub fn sparkline(seed: u64) -> Vec<i64> {
    let mut rng = Lcg::new(seed);
    (0..SPARKLINE_POINTS)
        .map(|_| (rng.next_f64() * 20.0).floor() as i64 + 10)
        .collect()
}

/// Widgets of the console, in layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Stats,
    TopRisk,
    DigitalTwin,
    Map,
    Trend,
    RiskDistribution,
    Materials,
    RecentInspections,
    Alerts,
}

impl Widget {
    pub const ALL: [Widget; 9] = [
        Widget::Stats,
        Widget::TopRisk,
        Widget::DigitalTwin,
        Widget::Map,
        Widget::Trend,
        Widget::RiskDistribution,
        Widget::Materials,
        Widget::RecentInspections,
        Widget::Alerts,
    ];

    /// Widgets fed by the pipe list.
    pub const FROM_PIPES: [Widget; 7] = [
        Widget::TopRisk,
        Widget::DigitalTwin,
        Widget::Map,
        Widget::RiskDistribution,
        Widget::Materials,
        Widget::RecentInspections,
        Widget::Alerts,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchErrors {
    pub stats: bool,
    pub pipes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub stats: DashboardStats,
    pub cards: Vec<StatCard>,
    pub top_risk: TopRisk,
    pub digital_twin: Option<DigitalTwin>,
    pub risk_distribution: RiskDistribution,
    pub materials: Vec<MaterialShare>,
    pub recent_inspections: Vec<RecentInspection>,
    pub alerts: Vec<Alert>,
    pub map: RiskMap,
    pub trend: Option<ChartData>,
    pub errors: FetchErrors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards_carry_stats_verbatim() {
        let stats: DashboardStats = serde_json::from_str(
            r#"{"total_length": 120.5, "total_inspections": 40, "critical_defects": 3, "active_pipes": 25}"#,
        )
        .unwrap();

        let cards = StatCard::from_stats(&stats, 7);
        let values: Vec<f64> = cards.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![120.5, 40.0, 3.0, 25.0]);
        assert_eq!(cards[0].precision, 1);
    }

    #[test]
    fn test_sparkline_is_seeded() {
        let line = sparkline(11);
        assert_eq!(line.len(), SPARKLINE_POINTS);
        assert!(line.iter().all(|v| (10..30).contains(v)));
        assert_eq!(line, sparkline(11));
    }
}
