// Widgets derived from a pipe snapshot
use super::pipe::Pipe;
use super::risk::{format_score, RiskLevel, UNKNOWN_COLOR};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

pub const TOP_RISK_LIMIT: usize = 5;
pub const RECENT_INSPECTIONS_LIMIT: usize = 10;
pub const ALERTS_LIMIT: usize = 5;
const NAMED_MATERIALS: usize = 3;
const MATERIAL_COLORS: [&str; NAMED_MATERIALS] = ["#1890ff", "#52c41a", "#faad14"];
const OTHER_MATERIAL: &str = "Other";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRiskEntry {
    pub rank: usize,
    pub pipe_id: String,
    pub qr_code: String,
    pub risk_score: f64,
    pub score_label: String,
    pub level: RiskLevel,
    pub level_label: &'static str,
    pub color: &'static str,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRisk {
    pub entries: Vec<TopRiskEntry>,
    pub empty_message: Option<String>,
}

impl TopRisk {
    pub fn from_pipes(pipes: &[Pipe]) -> Self {
        let mut scored: Vec<(&Pipe, f64)> = pipes
            .iter()
            .filter_map(|p| p.risk_score.map(|score| (p, score)))
            .collect();
        scored.sort_by(|(_, a), (_, b)| b.total_cmp(a));

        let entries: Vec<TopRiskEntry> = scored
            .into_iter()
            .take(TOP_RISK_LIMIT)
            .enumerate()
            .map(|(index, (pipe, score))| {
                let level = RiskLevel::from_score(Some(score));
                TopRiskEntry {
                    rank: index + 1,
                    pipe_id: pipe.id.clone(),
                    qr_code: pipe.qr_code.clone(),
                    risk_score: score,
                    score_label: format_score(Some(score)),
                    level,
                    level_label: level.label(),
                    color: level.color(),
                    location: pipe
                        .location
                        .and_then(|loc| loc.point())
                        .map(|point| format!("{:.4}, {:.4}", point.lat, point.lon)),
                }
            })
            .collect();

        let empty_message = entries.is_empty().then(|| "No risk data".to_string());
        Self { entries, empty_message }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskBucket {
    pub key: &'static str,
    pub label: &'static str,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskDistribution {
    pub buckets: Vec<RiskBucket>,
}

impl RiskDistribution {
    /// Buckets in the order critical, warning, low, unknown.
    pub fn from_pipes(pipes: &[Pipe]) -> Self {
        let (mut critical, mut warning, mut low, mut unknown) = (0, 0, 0, 0);
        for pipe in pipes {
            match pipe.risk_score {
                None => unknown += 1,
                score => match RiskLevel::from_score(score) {
                    RiskLevel::Critical => critical += 1,
                    RiskLevel::Warning => warning += 1,
                    RiskLevel::Low => low += 1,
                },
            }
        }

        let bucket = |key, level: RiskLevel, count| RiskBucket {
            key,
            label: level.label(),
            count,
            color: level.color(),
        };

        Self {
            buckets: vec![
                bucket("critical", RiskLevel::Critical, critical),
                bucket("warning", RiskLevel::Warning, warning),
                bucket("low", RiskLevel::Low, low),
                RiskBucket {
                    key: "unknown",
                    label: "Not assessed",
                    count: unknown,
                    color: UNKNOWN_COLOR,
                },
            ],
        }
    }

    #[cfg(test)]
    pub fn count(&self, key: &str) -> usize {
        self.buckets
            .iter()
            .find(|b| b.key == key)
            .map(|b| b.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialShare {
    pub name: String,
    pub count: usize,
    pub percent: u32,
    pub color: &'static str,
}

/// Share of pipes per material: the three most common plus an aggregated "Other".
pub fn material_breakdown(pipes: &[Pipe]) -> Vec<MaterialShare> {
    if pipes.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut other = 0;
    for pipe in pipes {
        match pipe.material.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(material) => *counts.entry(material).or_default() += 1,
            None => other += 1,
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total = pipes.len() as f64;
    let percent = |count: usize| ((count as f64 / total) * 100.0).round() as u32;

    let mut shares: Vec<MaterialShare> = Vec::new();
    for (index, (name, count)) in ranked.into_iter().enumerate() {
        if index < NAMED_MATERIALS {
            shares.push(MaterialShare {
                name: name.to_string(),
                count,
                percent: percent(count),
                color: MATERIAL_COLORS[index],
            });
        } else {
            other += count;
        }
    }

    if other > 0 {
        shares.push(MaterialShare {
            name: OTHER_MATERIAL.to_string(),
            count: other,
            percent: percent(other),
            color: UNKNOWN_COLOR,
        });
    }

    shares
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusTag {
    pub label: String,
    pub color: &'static str,
}

impl StatusTag {
    pub fn for_status(status: &str) -> Self {
        match status {
            "active" => Self {
                label: "Active".to_string(),
                color: "green",
            },
            "maintenance" => Self {
                label: "Maintenance".to_string(),
                color: "orange",
            },
            other => Self {
                label: other.to_string(),
                color: "default",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentInspection {
    pub pipe_id: String,
    pub qr_code: String,
    pub date: NaiveDate,
    pub status: StatusTag,
    pub risk_score: Option<f64>,
    pub risk_color: &'static str,
    pub inspector: String,
}

/// One row per pipe for the first ten pipes, dated back one day per row.
pub fn recent_inspections(pipes: &[Pipe], today: NaiveDate) -> Vec<RecentInspection> {
    pipes
        .iter()
        .take(RECENT_INSPECTIONS_LIMIT)
        .enumerate()
        .map(|(index, pipe)| RecentInspection {
            pipe_id: pipe.id.clone(),
            qr_code: pipe.qr_code.clone(),
            date: today - Duration::days(index as i64),
            status: StatusTag::for_status(&pipe.current_status),
            risk_score: pipe.risk_score,
            risk_color: RiskLevel::from_score(pipe.risk_score).color(),
            inspector: format!("Engineer {}", char::from(b'A' + (index % 5) as u8)),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Critical,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub pipe_id: String,
}

/// Critical-risk pipes first, then pipes under maintenance.
pub fn alerts(pipes: &[Pipe]) -> Vec<Alert> {
    let critical = pipes
        .iter()
        .filter(|p| RiskLevel::from_score(p.risk_score) == RiskLevel::Critical)
        .map(|p| Alert {
            kind: AlertKind::Critical,
            title: "Critical risk detected".to_string(),
            message: format!("Pipe {} requires immediate attention", p.qr_code),
            pipe_id: p.id.clone(),
        });

    let maintenance = pipes
        .iter()
        .filter(|p| p.current_status == "maintenance")
        .map(|p| Alert {
            kind: AlertKind::Warning,
            title: "Scheduled maintenance".to_string(),
            message: format!("Pipe {} is scheduled for maintenance", p.qr_code),
            pipe_id: p.id.clone(),
        });

    critical.chain(maintenance).take(ALERTS_LIMIT).collect()
}

const DEFAULT_WALL_MM: f64 = 10.0;
const DEFAULT_DIAMETER_MM: i64 = 200;
const MAX_WALL_MM: f64 = 20.0;
const TWIN_OUTER_RADIUS: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigitalTwin {
    pub pipe_id: String,
    pub qr_code: String,
    pub wall_thickness_mm: f64,
    pub diameter_mm: i64,
    pub thickness_ratio: f64,
    pub outer_radius: f64,
    pub inner_radius: f64,
    pub thickness_color: &'static str,
}

impl DigitalTwin {
    pub fn of(pipe: &Pipe) -> Self {
        let wall = pipe.wall_thickness_mm.filter(|w| *w > 0.0).unwrap_or(DEFAULT_WALL_MM);
        let diameter = pipe.diameter_mm.filter(|d| *d > 0).unwrap_or(DEFAULT_DIAMETER_MM);
        let ratio = (wall / MAX_WALL_MM).min(1.0);

        let thickness_color = if wall < 5.0 {
            RiskLevel::Critical.color()
        } else if wall < 10.0 {
            RiskLevel::Warning.color()
        } else {
            RiskLevel::Low.color()
        };

        Self {
            pipe_id: pipe.id.clone(),
            qr_code: pipe.qr_code.clone(),
            wall_thickness_mm: wall,
            diameter_mm: diameter,
            thickness_ratio: ratio,
            outer_radius: TWIN_OUTER_RADIUS,
            inner_radius: TWIN_OUTER_RADIUS * (1.0 - ratio * 0.3),
            thickness_color,
        }
    }
}
