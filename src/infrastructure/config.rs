use crate::application::qr_service::{MAX_PREVIEWS, PREVIEW_TTL};
use crate::domain::trend::{default_history, TrendPoint};
use anyhow::Context;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "PIPEDASH";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub trend: TrendSettings,
    #[serde(default)]
    pub widgets: WidgetSettings,
    #[serde(default)]
    pub previews: PreviewSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token; only ever supplied at runtime.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiSettings {
    pub fn require_token(&self) -> anyhow::Result<String> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .with_context(|| format!("no API token configured; set {}_API__TOKEN", ENV_PREFIX))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapSettings {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    #[serde(default = "default_center_lon")]
    pub center_lon: f64,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
    #[serde(default = "default_attribution")]
    pub attribution: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lon: default_center_lon(),
            zoom: default_zoom(),
            tile_url: default_tile_url(),
            attribution: default_attribution(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrendSettings {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_history")]
    pub history: Vec<TrendPoint>,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            history: default_history(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetSettings {
    #[serde(default = "default_seed")]
    pub sparkline_seed: u64,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            sparkline_seed: default_seed(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreviewSettings {
    /// Seconds before a preview nobody closed is released.
    #[serde(default = "default_preview_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_preview_capacity")]
    pub capacity: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_preview_ttl_secs(),
            capacity: default_preview_capacity(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_center_lat() -> f64 {
    51.1694
}

fn default_center_lon() -> f64 {
    71.4491
}

fn default_zoom() -> u8 {
    13
}

fn default_tile_url() -> String {
    "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png".to_string()
}

fn default_attribution() -> String {
    "&copy; OpenStreetMap contributors &copy; CARTO".to_string()
}

fn default_preview_ttl_secs() -> u64 {
    PREVIEW_TTL.as_secs()
}

fn default_preview_capacity() -> usize {
    MAX_PREVIEWS
}

fn default_seed() -> u64 {
    2024
}

/// Loads `config/dashboard.*` (optional) overlaid with `PIPEDASH_*` variables.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
