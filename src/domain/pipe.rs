// Pipe domain model
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_COMPANY: &str = "COMPANY";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[cfg(test)]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Both coordinates non-zero.
    pub fn is_plottable(&self) -> bool {
        self.lat != 0.0 && self.lon != 0.0
    }
}

/// Location as the backend sends it; either coordinate may be null or absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl Location {
    pub fn point(&self) -> Option<GeoPoint> {
        Some(GeoPoint {
            lat: self.lat?,
            lon: self.lon?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub id: String,
    pub qr_code: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub production_date: Option<NaiveDate>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub diameter_mm: Option<i64>,
    #[serde(default)]
    pub wall_thickness_mm: Option<f64>,
    #[serde(default)]
    pub length_meters: Option<f64>,
    pub current_status: String,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub predicted_lifetime_years: Option<i64>,
    #[serde(default)]
    pub location: Option<Location>,
}

impl Pipe {
    /// Location if it can be placed on the map.
    pub fn plottable_location(&self) -> Option<GeoPoint> {
        self.location
            .and_then(|loc| loc.point())
            .filter(GeoPoint::is_plottable)
    }
}

#[cfg(test)]
impl Pipe {
    pub fn new(id: impl Into<String>, qr_code: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            qr_code: qr_code.into(),
            manufacturer: None,
            production_date: None,
            material: None,
            diameter_mm: None,
            wall_thickness_mm: None,
            length_meters: None,
            current_status: status.into(),
            risk_score: None,
            predicted_lifetime_years: None,
            location: None,
        }
    }

    pub fn with_risk(mut self, score: f64) -> Self {
        self.risk_score = Some(score);
        self
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some(Location {
            lat: Some(lat),
            lon: Some(lon),
        });
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }
}

/// Body of the create-pipe mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPipe {
    #[serde(default = "default_company")]
    pub company: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub diameter_mm: Option<i64>,
    #[serde(default)]
    pub wall_thickness_mm: Option<f64>,
    #[serde(default)]
    pub length_meters: Option<f64>,
}

fn default_company() -> String {
    DEFAULT_COMPANY.to_string()
}

#[derive(Debug, Error, PartialEq)]
pub enum PipeValidationError {
    #[error("company name is required")]
    MissingCompany,
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: &'static str, min: f64 },
}

impl NewPipe {
    #[cfg(test)]
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            manufacturer: None,
            material: None,
            diameter_mm: None,
            wall_thickness_mm: None,
            length_meters: None,
        }
    }

    pub fn validate(&self) -> Result<(), PipeValidationError> {
        if self.company.trim().is_empty() {
            return Err(PipeValidationError::MissingCompany);
        }
        if let Some(diameter) = self.diameter_mm {
            if diameter < 1 {
                return Err(PipeValidationError::BelowMinimum {
                    field: "diameter_mm",
                    min: 1.0,
                });
            }
        }
        check_min("wall_thickness_mm", self.wall_thickness_mm, 0.1)?;
        check_min("length_meters", self.length_meters, 0.1)?;
        Ok(())
    }
}

fn check_min(field: &'static str, value: Option<f64>, min: f64) -> Result<(), PipeValidationError> {
    match value {
        Some(v) if v < min || v.is_nan() => Err(PipeValidationError::BelowMinimum { field, min }),
        _ => Ok(()),
    }
}
