// Chart render models
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStyle {
    Solid,
    Dashed,
    /// Filled area with no stroke.
    Band,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub style: SeriesStyle,
    pub points: Vec<ChartPoint>,
}

impl SeriesData {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        color: Option<&str>,
        style: SeriesStyle,
        points: Vec<ChartPoint>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.map(str::to_string),
            style,
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub label: String,
    pub at: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub series: Vec<SeriesData>,
    pub reference: Option<ReferenceLine>,
}

#[cfg(test)]
impl ChartData {
    pub fn series(&self, id: &str) -> Option<&SeriesData> {
        self.series.iter().find(|s| s.id == id)
    }
}
