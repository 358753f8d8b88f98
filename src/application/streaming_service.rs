// Streaming dashboard service - Progressive loading, one message per widget
use crate::application::dashboard_service::{DashboardService, PipeWidgets, DASHBOARD_TITLE};
use crate::domain::dashboard::Widget;
use serde::Serialize;
use serde_json::json;
use std::time::Instant;
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    Skeleton { title: String, widgets: Vec<Widget> },
    WidgetUpdate { widget: Widget, data: serde_json::Value },
    WidgetFailed { widget: Widget, reason: String },
    Complete { widgets: usize, duration_ms: u64 },
}

#[derive(Clone)]
pub struct StreamingDashboardService {
    dashboard: DashboardService,
}

impl StreamingDashboardService {
    pub fn new(dashboard: DashboardService) -> Self {
        Self { dashboard }
    }

    /// Sends the skeleton at once, then each widget as its data resolves.
    ///
    /// Widgets arrive in no particular order. `Complete` is sent after every
    /// fetch task has finished.
    pub async fn stream_dashboard(&self) -> mpsc::Receiver<StreamMessage> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let start_time = Instant::now();

        let skeleton = StreamMessage::Skeleton {
            title: DASHBOARD_TITLE.to_string(),
            widgets: Widget::ALL.to_vec(),
        };
        let _ = tx.send(skeleton).await;

        let mut tasks = Vec::new();

        // 1. Statistic cards
        {
            let tx = tx.clone();
            let service = self.dashboard.clone();
            tasks.push(tokio::spawn(async move {
                let msg = match service.catalog().stats().await {
                    Ok(stats) => StreamMessage::WidgetUpdate {
                        widget: Widget::Stats,
                        data: json!({ "cards": service.stat_cards(&stats), "stats": stats }),
                    },
                    Err(e) => {
                        tracing::warn!("Error fetching dashboard stats: {}", e);
                        StreamMessage::WidgetFailed {
                            widget: Widget::Stats,
                            reason: "Failed to load statistics".to_string(),
                        }
                    }
                };
                let _ = tx.send(msg).await;
            }));
        }

        // 2. Everything derived from the pipe list
        {
            let tx = tx.clone();
            let service = self.dashboard.clone();
            tasks.push(tokio::spawn(async move {
                match service.catalog().list_pipes().await {
                    Ok(pipes) => {
                        let widgets = PipeWidgets::build(&pipes, service.today());
                        for (widget, data) in widgets.into_updates() {
                            let _ = tx.send(StreamMessage::WidgetUpdate { widget, data }).await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Error fetching pipes: {}", e);
                        for widget in Widget::FROM_PIPES {
                            let msg = StreamMessage::WidgetFailed {
                                widget,
                                reason: "Failed to load pipes".to_string(),
                            };
                            let _ = tx.send(msg).await;
                        }
                    }
                }
            }));
        }

        // 3. Trend chart
        {
            let tx = tx.clone();
            let service = self.dashboard.clone();
            tasks.push(tokio::spawn(async move {
                let msg = match service.trend_chart() {
                    Some(chart) => StreamMessage::WidgetUpdate {
                        widget: Widget::Trend,
                        data: serde_json::to_value(chart).unwrap_or(serde_json::Value::Null),
                    },
                    None => StreamMessage::WidgetFailed {
                        widget: Widget::Trend,
                        reason: "No trend history".to_string(),
                    },
                };
                let _ = tx.send(msg).await;
            }));
        }

        // 4. Completion once every task is done
        tokio::spawn(async move {
            for result in futures::future::join_all(tasks).await {
                if let Err(e) = result {
                    tracing::error!("Dashboard widget task failed: {}", e);
                }
            }

            let complete = StreamMessage::Complete {
                widgets: Widget::ALL.len(),
                duration_ms: start_time.elapsed().as_millis() as u64,
            };
            let _ = tx.send(complete).await;
        });

        rx
    }
}
