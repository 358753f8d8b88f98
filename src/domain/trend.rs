// Defect trend projection
use super::chart::{ChartData, ChartPoint, ReferenceLine, SeriesData, SeriesStyle};
use super::noise::Lcg;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const PROJECTION_HORIZON: u32 = 60;
pub const JITTER_AMPLITUDE: f64 = 2.5;
pub const CRITICAL_RATIO: f64 = 0.3;

/// Years a `YYYY-MM` label can carry.
const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

const TOTAL_COLOR: &str = "#1890ff";
const CRITICAL_COLOR: &str = "#ff4d4f";
const TODAY_COLOR: &str = "#52c41a";

#[derive(Debug, Error, PartialEq)]
pub enum TrendError {
    #[error("no historical points to project from")]
    EmptyHistory,
    #[error("invalid period '{0}', expected YYYY-MM")]
    InvalidPeriod(String),
}

/// A calendar month, labelled `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, TrendError> {
        if !(1..=12).contains(&month) || !YEARS.contains(&year) {
            return Err(TrendError::InvalidPeriod(format!("{}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn add_months(&self, months: u32) -> Self {
        let zero_based = self.year as i64 * 12 + (self.month as i64 - 1) + months as i64;
        Self {
            year: zero_based.div_euclid(12) as i32,
            month: zero_based.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TrendError::InvalidPeriod(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Period::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Historical,
    Projected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: Period,
    pub count: i64,
    pub critical: i64,
    #[serde(default = "historical_kind")]
    pub kind: PointKind,
}

fn historical_kind() -> PointKind {
    PointKind::Historical
}

impl TrendPoint {
    pub fn historical(period: Period, count: i64, critical: i64) -> Self {
        Self {
            period,
            count,
            critical,
            kind: PointKind::Historical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendProjection {
    /// Historical points followed by projected points.
    pub points: Vec<TrendPoint>,
    pub history_len: usize,
    pub slope: f64,
    /// Index into `points` of the "today" marker.
    pub today_index: usize,
}

impl TrendProjection {
    /// Extrapolates `PROJECTION_HORIZON` months past the present.
    ///
    /// The slope is `(last - first) / len` over the history. Each projected month
    /// adds uniform jitter in `[-2.5, 2.5)` drawn from `jitter`, then clamps at zero.
    pub fn project(history: &[TrendPoint], now: Period, jitter: &mut Lcg) -> Result<Self, TrendError> {
        let (first, last) = match (history.first(), history.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(TrendError::EmptyHistory),
        };

        let slope = (last.count - first.count) as f64 / history.len() as f64;
        let anchor = now.max(last.period);

        let mut points = history.to_vec();
        for i in 1..=PROJECTION_HORIZON {
            let base = last.count as f64
                + slope * i as f64
                + jitter.uniform(-JITTER_AMPLITUDE, JITTER_AMPLITUDE);
            let count = base.round().max(0.0) as i64;
            let critical = (count as f64 * CRITICAL_RATIO).round().max(0.0) as i64;

            points.push(TrendPoint {
                period: anchor.add_months(i),
                count,
                critical,
                kind: PointKind::Projected,
            });
        }

        let today_index = points
            .iter()
            .position(|p| p.period == now)
            .unwrap_or(history.len() - 1);

        Ok(Self {
            points,
            history_len: history.len(),
            slope,
            today_index,
        })
    }

    pub fn historical(&self) -> &[TrendPoint] {
        &self.points[..self.history_len]
    }

    pub fn projected(&self) -> &[TrendPoint] {
        &self.points[self.history_len..]
    }

    pub fn today(&self) -> &TrendPoint {
        &self.points[self.today_index]
    }

    pub fn to_chart(&self) -> ChartData {
        let totals = |points: &[TrendPoint]| -> Vec<ChartPoint> {
            points
                .iter()
                .map(|p| ChartPoint::new(p.period.to_string(), p.count as f64))
                .collect()
        };
        let criticals = |points: &[TrendPoint]| -> Vec<ChartPoint> {
            points
                .iter()
                .map(|p| ChartPoint::new(p.period.to_string(), p.critical as f64))
                .collect()
        };

        let series = vec![
            SeriesData::new(
                "count",
                "Total defects (actual)",
                Some(TOTAL_COLOR),
                SeriesStyle::Solid,
                totals(self.historical()),
            ),
            SeriesData::new(
                "critical",
                "Critical (actual)",
                Some(CRITICAL_COLOR),
                SeriesStyle::Solid,
                criticals(self.historical()),
            ),
            SeriesData::new(
                "predicted",
                "Forecast (5 years)",
                Some(TOTAL_COLOR),
                SeriesStyle::Dashed,
                totals(self.projected()),
            ),
            SeriesData::new(
                "predicted_critical",
                "Critical (forecast)",
                Some(CRITICAL_COLOR),
                SeriesStyle::Dashed,
                criticals(self.projected()),
            ),
            SeriesData::new(
                "confidence",
                "Forecast band",
                Some(TOTAL_COLOR),
                SeriesStyle::Band,
                totals(self.projected()),
            ),
        ];

        ChartData {
            id: "defect_trend".to_string(),
            title: "Defect trend".to_string(),
            series,
            reference: Some(ReferenceLine {
                label: "Today".to_string(),
                at: self.today().period.to_string(),
                color: TODAY_COLOR.to_string(),
            }),
        }
    }
}

/// The monthly history the console ships with when none is configured.
pub fn default_history() -> Vec<TrendPoint> {
    [(1, 12, 2), (2, 15, 3), (3, 18, 4), (4, 14, 3), (5, 20, 5), (6, 22, 6)]
        .into_iter()
        .map(|(month, count, critical)| TrendPoint::historical(Period { year: 2024, month }, count, critical))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    #[test]
    fn test_period_parse_and_display() {
        assert_eq!(period("2024-06").to_string(), "2024-06");
        assert_eq!(period("2024-6").to_string(), "2024-06");
        assert!("2024-13".parse::<Period>().is_err());
        assert!("June".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_rejects_out_of_range_years() {
        assert!(Period::new(i32::MAX, 1).is_err());
        assert!(Period::new(0, 1).is_err());
        assert!("2147483647-01".parse::<Period>().is_err());
        assert!(serde_json::from_str::<TrendPoint>(
            r#"{"period": "2147483647-12", "count": 1, "critical": 0}"#
        )
        .is_err());
        assert_eq!(period("9999-12").to_string(), "9999-12");
    }

    #[test]
    fn test_period_add_months_rolls_year() {
        assert_eq!(period("2024-11").add_months(2), period("2025-01"));
        assert_eq!(period("2024-01").add_months(60), period("2029-01"));
    }

    #[test]
    fn test_projects_sixty_months_past_history() {
        let history = default_history();
        let now = period("2026-10");
        let projection = TrendProjection::project(&history, now, &mut Lcg::new(1)).unwrap();

        assert_eq!(projection.points.len(), history.len() + 60);
        assert_eq!(projection.projected().len(), 60);
        assert_eq!(projection.projected()[0].period, period("2026-11"));
        assert_eq!(projection.projected()[59].period, period("2031-10"));

        for point in projection.projected() {
            assert_eq!(point.kind, PointKind::Projected);
            assert!(point.count >= 0);
            assert!(point.critical >= 0);
            assert_eq!(point.critical, (point.count as f64 * 0.3).round() as i64);
        }
    }

    #[test]
    fn test_slope_from_first_and_last() {
        let history = default_history();
        let projection = TrendProjection::project(&history, period("2024-06"), &mut Lcg::new(1)).unwrap();
        // (22 - 12) / 6
        assert!((projection.slope - 10.0 / 6.0).abs() < 1e-9);

        // Jitter is bounded, so each point sits within 3 of the trend line.
        for (i, point) in projection.projected().iter().enumerate() {
            let expected = 22.0 + projection.slope * (i + 1) as f64;
            assert!((point.count as f64 - expected).abs() <= 3.0);
        }
    }

    #[test]
    fn test_same_seed_same_projection() {
        let history = default_history();
        let now = period("2026-10");
        let a = TrendProjection::project(&history, now, &mut Lcg::new(99)).unwrap();
        let b = TrendProjection::project(&history, now, &mut Lcg::new(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_declining_trend_clamps_at_zero() {
        let history = vec![
            TrendPoint::historical(period("2024-01"), 40, 10),
            TrendPoint::historical(period("2024-02"), 0, 0),
        ];
        let projection = TrendProjection::project(&history, period("2024-02"), &mut Lcg::new(3)).unwrap();
        assert!(projection.projected().iter().all(|p| p.count == 0 && p.critical == 0));
    }

    #[test]
    fn test_single_point_is_flat() {
        let history = vec![TrendPoint::historical(period("2024-01"), 10, 3)];
        let projection = TrendProjection::project(&history, period("2024-01"), &mut Lcg::new(5)).unwrap();
        assert_eq!(projection.slope, 0.0);
        assert!(projection.projected().iter().all(|p| (7..=13).contains(&p.count)));
    }

    #[test]
    fn test_empty_history_is_an_error() {
        let result = TrendProjection::project(&[], period("2024-01"), &mut Lcg::new(5));
        assert_eq!(result, Err(TrendError::EmptyHistory));
    }

    #[test]
    fn test_today_marker() {
        let history = default_history();

        let inside = TrendProjection::project(&history, period("2024-03"), &mut Lcg::new(1)).unwrap();
        assert_eq!(inside.today().period, period("2024-03"));

        // Current month is never a projected label, so the marker falls back to the last point.
        let later = TrendProjection::project(&history, period("2026-10"), &mut Lcg::new(1)).unwrap();
        assert_eq!(later.today_index, history.len() - 1);
    }

    #[test]
    fn test_chart_series_layout() {
        let projection = TrendProjection::project(&default_history(), period("2024-06"), &mut Lcg::new(1)).unwrap();
        let chart = projection.to_chart();

        assert_eq!(chart.series.len(), 5);
        assert_eq!(chart.series("count").unwrap().points.len(), 6);
        assert_eq!(chart.series("predicted").unwrap().style, SeriesStyle::Dashed);
        assert_eq!(chart.series("confidence").unwrap().style, SeriesStyle::Band);
        assert_eq!(chart.reference.as_ref().unwrap().at, "2024-06");
    }

    #[test]
    fn test_history_deserializes_without_kind() {
        let point: TrendPoint =
            serde_json::from_str(r#"{"period": "2024-05", "count": 20, "critical": 5}"#).unwrap();
        assert_eq!(point.kind, PointKind::Historical);
        assert_eq!(point.period, period("2024-05"));
    }
}
