// Risk map projection: markers per pipe and heat segments between neighbours
use super::pipe::{GeoPoint, Pipe};
use super::risk::{format_score, marker_radius, RiskLevel};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMarker {
    pub pipe_id: String,
    pub qr_code: String,
    pub position: GeoPoint,
    pub risk_score: Option<f64>,
    pub radius: f64,
    pub level: RiskLevel,
    pub color: &'static str,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatSegment {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub risk: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskMap {
    pub markers: Vec<RiskMarker>,
    pub segments: Vec<HeatSegment>,
}

impl RiskMap {
    /// Projects a pipe snapshot onto the map.
    ///
    /// Pipes without a plottable location are skipped. Segments join pipes that
    /// are adjacent in sum-order (sorted by `lat + lon`), which is a cheap
    /// adjacency proxy and not a true nearest-neighbour search.
    pub fn project(pipes: &[Pipe]) -> Self {
        let mut placed: Vec<(&Pipe, GeoPoint)> = pipes
            .iter()
            .filter_map(|pipe| pipe.plottable_location().map(|point| (pipe, point)))
            .collect();

        let markers = placed
            .iter()
            .map(|(pipe, point)| Self::marker(pipe, *point))
            .collect();

        placed.sort_by(|(_, a), (_, b)| sum_order_key(a).total_cmp(&sum_order_key(b)));

        let segments = placed
            .windows(2)
            .map(|pair| {
                let (first, from) = pair[0];
                let (second, to) = pair[1];
                let risk = segment_risk(first.risk_score, second.risk_score);
                HeatSegment {
                    from,
                    to,
                    risk,
                    color: RiskLevel::from_score(Some(risk)).color(),
                }
            })
            .collect();

        Self { markers, segments }
    }

    fn marker(pipe: &Pipe, position: GeoPoint) -> RiskMarker {
        let level = RiskLevel::from_score(pipe.risk_score);
        let tooltip = format!(
            "QR: {}\nRisk Score: {}\nStatus: {}",
            pipe.qr_code,
            format_score(pipe.risk_score),
            level.status()
        );

        RiskMarker {
            pipe_id: pipe.id.clone(),
            qr_code: pipe.qr_code.clone(),
            position,
            risk_score: pipe.risk_score,
            radius: marker_radius(pipe.risk_score),
            level,
            color: level.color(),
            tooltip,
        }
    }
}

fn sum_order_key(point: &GeoPoint) -> f64 {
    point.lat + point.lon
}

/// Mean of both endpoint scores, the single known score, or zero.
fn segment_risk(a: Option<f64>, b: Option<f64>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => (a + b) / 2.0,
        (Some(score), None) | (None, Some(score)) => score,
        (None, None) => 0.0,
    }
}
