// In-memory repository used by the service and handler tests
use crate::application::pipe_repository::{PipeRepository, QrImage, RepositoryError};
use crate::domain::dashboard::DashboardStats;
use crate::domain::pipe::{NewPipe, Pipe};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
struct State {
    pipes: Vec<Pipe>,
    stats: DashboardStats,
    calls: HashMap<&'static str, usize>,
    fail_reads: bool,
    reject_creates: Option<Option<String>>,
    list_gate: Option<Arc<Notify>>,
}

#[derive(Default)]
pub struct InMemoryPipeRepository {
    state: Mutex<State>,
}

impl InMemoryPipeRepository {
    pub fn with_pipes(pipes: Vec<Pipe>) -> Self {
        let repo = Self::default();
        repo.state.lock().unwrap().pipes = pipes;
        repo
    }

    pub fn set_stats(&self, stats: DashboardStats) {
        self.state.lock().unwrap().stats = stats;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn reject_creates(&self, detail: Option<&str>) {
        self.state.lock().unwrap().reject_creates = Some(detail.map(str::to_string));
    }

    /// The next list call snapshots the pipes, then waits for `gate` before answering.
    pub fn gate_next_list(&self, gate: Arc<Notify>) {
        self.state.lock().unwrap().list_gate = Some(gate);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.state.lock().unwrap().calls.get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(method).or_default() += 1;
        if state.fail_reads && method != "create_pipe" {
            return Err(RepositoryError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn image(label: &str, size: u32) -> QrImage {
        QrImage {
            label: label.to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from(format!("png:{}:{}", label, size)),
        }
    }
}

#[async_trait]
impl PipeRepository for InMemoryPipeRepository {
    async fn list_pipes(&self) -> Result<Vec<Pipe>, RepositoryError> {
        self.record("list_pipes")?;
        let (pipes, gate) = {
            let mut state = self.state.lock().unwrap();
            (state.pipes.clone(), state.list_gate.take())
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(pipes)
    }

    async fn pipe_by_qr(&self, qr_code: &str) -> Result<Pipe, RepositoryError> {
        self.record("pipe_by_qr")?;
        let state = self.state.lock().unwrap();
        state
            .pipes
            .iter()
            .find(|p| p.qr_code == qr_code)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(qr_code.to_string()))
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError> {
        self.record("dashboard_stats")?;
        Ok(self.state.lock().unwrap().stats.clone())
    }

    async fn create_pipe(&self, new_pipe: &NewPipe) -> Result<Pipe, RepositoryError> {
        self.record("create_pipe")?;
        let mut state = self.state.lock().unwrap();
        if let Some(detail) = state.reject_creates.clone() {
            return Err(RepositoryError::Rejected { status: 400, detail });
        }

        let n = state.pipes.len() + 1;
        let mut pipe = Pipe::new(
            format!("pipe-{}", n),
            format!("PL-{}-{:08}", new_pipe.company, n),
            "active",
        );
        pipe.manufacturer = new_pipe.manufacturer.clone();
        pipe.material = new_pipe.material.clone();
        pipe.diameter_mm = new_pipe.diameter_mm;
        pipe.wall_thickness_mm = new_pipe.wall_thickness_mm;
        pipe.length_meters = new_pipe.length_meters;
        state.pipes.push(pipe.clone());
        state.stats.active_pipes += 1;
        Ok(pipe)
    }

    async fn qr_image_by_code(&self, qr_code: &str, size: u32) -> Result<QrImage, RepositoryError> {
        self.record("qr_image_by_code")?;
        Ok(Self::image(qr_code, size))
    }

    async fn qr_image_by_pipe(&self, pipe_id: &str, size: u32) -> Result<QrImage, RepositoryError> {
        self.record("qr_image_by_pipe")?;
        let state = self.state.lock().unwrap();
        if !state.pipes.iter().any(|p| p.id == pipe_id) {
            return Err(RepositoryError::NotFound(pipe_id.to_string()));
        }
        Ok(Self::image(pipe_id, size))
    }
}
