//! Causal scorer interface
//!
//! The scoring algorithm itself is external. The engine only knows how to
//! send an [`ExplainRequest`] and read back a list of causal effects, either
//! from an in-process worker or from a remote service.

pub mod baseline;
pub mod http;
pub mod worker;

pub use baseline::BaselineScorer;
pub use http::HttpScorer;
pub use worker::WorkerScorer;

use crate::error::{ExplainError, Result};
use crate::request::ExplainRequest;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Where a score computation runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Worker,
    Server,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Worker => f.write_str("worker"),
            ExecutionMode::Server => f.write_str("server"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = ExplainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "worker" => Ok(ExecutionMode::Worker),
            "server" => Ok(ExecutionMode::Server),
            _ => Err(ExplainError::Config(format!("Unknown execution mode: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalEffect {
    pub fid: String,
    /// `null` or non-numeric values on the wire become NaN.
    #[serde(deserialize_with = "lenient_f64")]
    pub responsibility: f64,
}

impl CausalEffect {
    pub fn new(fid: impl Into<String>, responsibility: f64) -> Self {
        Self {
            fid: fid.into(),
            responsibility,
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(f64::NAN))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    #[serde(default)]
    pub causal_effects: Vec<CausalEffect>,
}

/// The asynchronous `explain(request, mode)` contract.
#[async_trait]
pub trait CausalScorer: Send + Sync {
    async fn explain(&self, request: &ExplainRequest, mode: ExecutionMode) -> Result<ScoreResponse>;
}

/// One place a score computation can run.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn score(&self, request: &ExplainRequest) -> Result<ScoreResponse>;
}

/// Dispatches each request to the backend registered for its execution mode.
#[derive(Default, Clone)]
pub struct ScorerRouter {
    worker: Option<Arc<dyn ScoringBackend>>,
    server: Option<Arc<dyn ScoringBackend>>,
}

impl ScorerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the in-process backend.
    pub fn with_worker(mut self, backend: Arc<dyn ScoringBackend>) -> Self {
        self.worker = Some(backend);
        self
    }

    /// Register the remote scoring service backend.
    pub fn with_server(mut self, backend: Arc<dyn ScoringBackend>) -> Self {
        self.server = Some(backend);
        self
    }

    /// Backend for `mode`, if one is registered.
    pub fn backend(&self, mode: ExecutionMode) -> Option<&Arc<dyn ScoringBackend>> {
        match mode {
            ExecutionMode::Worker => self.worker.as_ref(),
            ExecutionMode::Server => self.server.as_ref(),
        }
    }
}

#[async_trait]
impl CausalScorer for ScorerRouter {
    async fn explain(&self, request: &ExplainRequest, mode: ExecutionMode) -> Result<ScoreResponse> {
        let backend = self
            .backend(mode)
            .ok_or_else(|| ExplainError::ScorerUnavailable(mode.to_string()))?;
        debug!(backend = backend.name(), request_id = %request.request_id, "Dispatching score computation");
        backend.score(request).await
    }
}
