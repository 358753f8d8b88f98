// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::qr_service::QrPreviewService;
use crate::application::streaming_service::StreamingDashboardService;
use crate::infrastructure::config::MapSettings;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub streaming_service: StreamingDashboardService,
    pub qr_service: QrPreviewService,
    pub map_settings: MapSettings,
}
