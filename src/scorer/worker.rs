//! In-process worker backend
//!
//! Runs a synchronous scoring function on tokio's blocking pool so the
//! caller's task is never stalled by the computation.

use super::{BaselineScorer, ScoreResponse, ScoringBackend};
use crate::error::Result;
use crate::request::ExplainRequest;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

type ScoreFn = dyn Fn(&ExplainRequest) -> Result<ScoreResponse> + Send + Sync;

#[derive(Clone)]
pub struct WorkerScorer {
    score_fn: Arc<ScoreFn>,
}

impl WorkerScorer {
    pub fn new<F>(score_fn: F) -> Self
    where
        F: Fn(&ExplainRequest) -> Result<ScoreResponse> + Send + Sync + 'static,
    {
        Self {
            score_fn: Arc::new(score_fn),
        }
    }

    /// Worker running the built-in [`BaselineScorer`].
    pub fn baseline() -> Self {
        let scorer = BaselineScorer::default();
        Self::new(move |request| Ok(scorer.score(request)))
    }
}

#[async_trait]
impl ScoringBackend for WorkerScorer {
    fn name(&self) -> &'static str {
        "worker"
    }

    async fn score(&self, request: &ExplainRequest) -> Result<ScoreResponse> {
        let score_fn = Arc::clone(&self.score_fn);
        let request = request.clone();
        let start = Instant::now();

        let response = tokio::task::spawn_blocking(move || (*score_fn)(&request)).await??;

        info!(
            effects = response.causal_effects.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Worker score computation finished"
        );
        Ok(response)
    }
}
