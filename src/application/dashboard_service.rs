// Dashboard service - Use case for building the console snapshot
use crate::application::clock::Clock;
use crate::application::pipe_catalog::PipeCatalog;
use crate::application::trend_service::TrendService;
use crate::domain::chart::ChartData;
use crate::domain::dashboard::{Dashboard, DashboardStats, FetchErrors, StatCard, Widget};
use crate::domain::pipe::Pipe;
use crate::domain::risk_map::RiskMap;
use crate::domain::widgets::{
    alerts, material_breakdown, recent_inspections, Alert, DigitalTwin, MaterialShare, RecentInspection,
    RiskDistribution, TopRisk,
};
use chrono::NaiveDate;
use std::sync::Arc;

pub const DASHBOARD_TITLE: &str = "Pipeline Monitoring";

/// Every widget that is derived from one pipe snapshot.
#[derive(Debug, Clone)]
pub struct PipeWidgets {
    pub top_risk: TopRisk,
    pub digital_twin: Option<DigitalTwin>,
    pub map: RiskMap,
    pub risk_distribution: RiskDistribution,
    pub materials: Vec<MaterialShare>,
    pub recent_inspections: Vec<RecentInspection>,
    pub alerts: Vec<Alert>,
}

impl PipeWidgets {
    pub fn build(pipes: &[Pipe], today: NaiveDate) -> Self {
        Self {
            top_risk: TopRisk::from_pipes(pipes),
            digital_twin: pipes.first().map(DigitalTwin::of),
            map: RiskMap::project(pipes),
            risk_distribution: RiskDistribution::from_pipes(pipes),
            materials: material_breakdown(pipes),
            recent_inspections: recent_inspections(pipes, today),
            alerts: alerts(pipes),
        }
    }

    /// One JSON payload per widget, for progressive delivery.
    pub fn into_updates(self) -> Vec<(Widget, serde_json::Value)> {
        let to_value = |result: serde_json::Result<serde_json::Value>| {
            result.unwrap_or_else(|e| {
                tracing::error!("Widget serialization error: {}", e);
                serde_json::Value::Null
            })
        };

        vec![
            (Widget::TopRisk, to_value(serde_json::to_value(self.top_risk))),
            (Widget::DigitalTwin, to_value(serde_json::to_value(self.digital_twin))),
            (Widget::Map, to_value(serde_json::to_value(self.map))),
            (Widget::RiskDistribution, to_value(serde_json::to_value(self.risk_distribution))),
            (Widget::Materials, to_value(serde_json::to_value(self.materials))),
            (Widget::RecentInspections, to_value(serde_json::to_value(self.recent_inspections))),
            (Widget::Alerts, to_value(serde_json::to_value(self.alerts))),
        ]
    }
}

#[derive(Clone)]
pub struct DashboardService {
    catalog: PipeCatalog,
    trend: TrendService,
    clock: Arc<dyn Clock>,
    sparkline_seed: u64,
}

impl DashboardService {
    pub fn new(catalog: PipeCatalog, trend: TrendService, clock: Arc<dyn Clock>, sparkline_seed: u64) -> Self {
        Self {
            catalog,
            trend,
            clock,
            sparkline_seed,
        }
    }

    pub fn catalog(&self) -> &PipeCatalog {
        &self.catalog
    }

    pub fn trend(&self) -> &TrendService {
        &self.trend
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn stat_cards(&self, stats: &DashboardStats) -> Vec<StatCard> {
        StatCard::from_stats(stats, self.sparkline_seed)
    }

    pub fn trend_chart(&self) -> Option<ChartData> {
        match self.trend.projection() {
            Ok(projection) => Some(projection.to_chart()),
            Err(e) => {
                tracing::warn!("Trend projection unavailable: {}", e);
                None
            }
        }
    }

    /// Builds the whole console. Failed fetches leave their widgets empty.
    pub async fn snapshot(&self) -> Dashboard {
        let (stats, pipes) = tokio::join!(self.catalog.stats(), self.catalog.list_pipes());

        let mut errors = FetchErrors::default();
        let stats = stats.unwrap_or_else(|e| {
            tracing::warn!("Error fetching dashboard stats: {}", e);
            errors.stats = true;
            DashboardStats::default()
        });
        let pipes = pipes.unwrap_or_else(|e| {
            tracing::warn!("Error fetching pipes: {}", e);
            errors.pipes = true;
            Vec::new()
        });

        let widgets = PipeWidgets::build(&pipes, self.today());

        Dashboard {
            title: DASHBOARD_TITLE.to_string(),
            cards: self.stat_cards(&stats),
            stats,
            top_risk: widgets.top_risk,
            digital_twin: widgets.digital_twin,
            risk_distribution: widgets.risk_distribution,
            materials: widgets.materials,
            recent_inspections: widgets.recent_inspections,
            alerts: widgets.alerts,
            map: widgets.map,
            trend: self.trend_chart(),
            errors,
        }
    }
}
