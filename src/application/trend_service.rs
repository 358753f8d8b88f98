// Trend service - Projection computed once per history version
use crate::application::clock::Clock;
use crate::domain::noise::Lcg;
use crate::domain::trend::{Period, TrendError, TrendPoint, TrendProjection};
use std::sync::{Arc, Mutex};

struct CachedProjection {
    version: u64,
    now: Period,
    projection: Arc<TrendProjection>,
}

struct TrendState {
    history: Vec<TrendPoint>,
    version: u64,
    cached: Option<CachedProjection>,
}

#[derive(Clone)]
pub struct TrendService {
    seed: u64,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<TrendState>>,
}

impl TrendService {
    pub fn new(history: Vec<TrendPoint>, seed: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            seed,
            clock,
            state: Arc::new(Mutex::new(TrendState {
                history,
                version: 0,
                cached: None,
            })),
        }
    }

    /// Swaps the historical series; the next projection is recomputed.
    pub fn replace_history(&self, history: Vec<TrendPoint>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.version += 1;
        state.history = history;
    }

    /// Returns the projection for the current history and calendar month.
    ///
    /// The jitter generator is reseeded for every computation, so the same
    /// history and month always give the same series.
    pub fn projection(&self) -> Result<Arc<TrendProjection>, TrendError> {
        let now = Period::of_date(self.clock.today());
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(cached) = &state.cached {
            if cached.version == state.version && cached.now == now {
                return Ok(cached.projection.clone());
            }
        }

        let projection = Arc::new(TrendProjection::project(
            &state.history,
            now,
            &mut Lcg::new(self.seed),
        )?);
        tracing::debug!(
            "Projected {} months from {} historical points (slope {:.3})",
            projection.projected().len(),
            projection.history_len,
            projection.slope
        );

        state.cached = Some(CachedProjection {
            version: state.version,
            now,
            projection: projection.clone(),
        });
        Ok(projection)
    }
}
