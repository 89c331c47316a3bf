//! Remote scoring service backend
//!
//! Posts the request as JSON to `{base_url}/explain` and expects
//! `{"causalEffects": [...]}` back.

use super::{ScoreResponse, ScoringBackend};
use crate::config::ExplainerConfig;
use crate::error::{ExplainError, Result};
use crate::request::ExplainRequest;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct HttpScorer {
    base_url: String,
    client: Client,
}

impl HttpScorer {
    /// # Arguments
    /// * `base_url` - scoring service root (e.g., "http://localhost:2023")
    /// * `timeout` - upper bound for a single explain call
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Client for the configured scoring service.
    pub fn from_config(config: &ExplainerConfig) -> Result<Self> {
        Self::new(&config.scorer_url, config.scorer_timeout)
    }

    /// Full URL of the explain call.
    pub fn endpoint(&self) -> String {
        format!("{}/explain", self.base_url)
    }
}

#[async_trait]
impl ScoringBackend for HttpScorer {
    fn name(&self) -> &'static str {
        "server"
    }

    async fn score(&self, request: &ExplainRequest) -> Result<ScoreResponse> {
        let url = self.endpoint();
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ExplainError::Scorer(format!("Failed to reach scoring service at {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, request_id = %request.request_id, "Scoring service rejected request");
            return Err(ExplainError::Scorer(format!(
                "Scoring service failed with status {}: {}",
                status, text
            )));
        }

        let body: ScoreResponse = response
            .json()
            .await
            .map_err(|e| ExplainError::Scorer(format!("Failed to parse scoring response: {}", e)))?;

        info!(
            effects = body.causal_effects.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Server score computation finished"
        );
        Ok(body)
    }
}
