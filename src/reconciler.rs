//! Score Reconciler
//!
//! Single-flight, last-write-wins wrapper around a [`CausalScorer`]. Every
//! submission reserves the next generation number when its request is
//! prepared; a response is applied to the displayed result only if no newer
//! submission (or reset) happened since. Superseded computations are not aborted, their results are
//! simply dropped on arrival.

use crate::error::ExplainError;
use crate::request::ExplainRequest;
use crate::scorer::{CausalEffect, CausalScorer, ExecutionMode};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Ranked causal effects currently on display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainResult {
    pub causal_effects: Vec<CausalEffect>,
}

impl ExplainResult {
    pub fn is_empty(&self) -> bool {
        self.causal_effects.is_empty()
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Nothing to explain; the displayed result was emptied.
    Skipped,
    /// The response was the latest one and is now displayed.
    Applied,
    /// A newer submission or reset happened first; the response was dropped.
    Superseded,
    /// The scorer failed; the displayed result is unchanged.
    Failed(ExplainError),
}

/// Drop non-finite responsibilities and sort descending. The sort is stable,
/// so equal scores keep their scorer order.
pub fn rank(effects: Vec<CausalEffect>) -> Vec<CausalEffect> {
    let before = effects.len();
    let mut ranked: Vec<CausalEffect> = effects
        .into_iter()
        .filter(|e| e.responsibility.is_finite())
        .collect();
    if ranked.len() != before {
        debug!(dropped = before - ranked.len(), "Dropped non-finite responsibilities");
    }
    ranked.sort_by(|a, b| {
        b.responsibility
            .partial_cmp(&a.responsibility)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

#[derive(Debug, Default)]
struct Slot {
    latest: u64,
    pending: Option<u64>,
    result: ExplainResult,
}

/// A reserved generation. Taken when a request is prepared, so any reset or
/// newer submission that happens before the computation runs makes it stale.
/// Dropping the ticket clears the pending slot if it still holds this
/// generation, however the computation ends.
pub struct Ticket {
    slot: Arc<Mutex<Slot>>,
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.pending == Some(self.generation) {
            slot.pending = None;
        }
    }
}

pub struct ScoreReconciler {
    scorer: Arc<dyn CausalScorer>,
    slot: Arc<Mutex<Slot>>,
}

impl ScoreReconciler {
    pub fn new(scorer: Arc<dyn CausalScorer>) -> Self {
        Self {
            scorer,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the displayed result.
    pub fn result(&self) -> ExplainResult {
        self.lock().result.clone()
    }

    /// Whether the latest submission is still in flight.
    pub fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Number of submissions and resets so far.
    pub fn generation(&self) -> u64 {
        self.lock().latest
    }

    /// Empty the displayed result and invalidate anything in flight,
    /// including tickets not yet run.
    pub fn reset(&self) {
        let mut slot = self.lock();
        slot.latest += 1;
        slot.pending = None;
        slot.result = ExplainResult::default();
    }

    /// Reserve the next generation and mark it pending.
    pub fn begin(&self) -> Ticket {
        let mut slot = self.lock();
        slot.latest += 1;
        slot.pending = Some(slot.latest);
        Ticket {
            slot: Arc::clone(&self.slot),
            generation: slot.latest,
        }
    }

    /// Reserve a generation and run the computation at once. `None` empties
    /// the displayed result without calling the scorer.
    pub async fn submit(&self, request: Option<ExplainRequest>, mode: ExecutionMode) -> SubmitOutcome {
        let Some(request) = request else {
            self.reset();
            debug!("No active comparison, cleared explanation result");
            return SubmitOutcome::Skipped;
        };
        let ticket = self.begin();
        self.run(ticket, request, mode).await
    }

    /// Run a computation reserved by [`begin`](Self::begin). The response is
    /// applied only if the ticket is still the latest generation when it
    /// arrives; a ticket already overtaken never reaches the scorer.
    pub async fn run(&self, ticket: Ticket, request: ExplainRequest, mode: ExecutionMode) -> SubmitOutcome {
        let generation = ticket.generation;
        let latest = self.generation();
        if latest != generation {
            debug!(generation, latest, "Skipping score computation prepared for stale inputs");
            return SubmitOutcome::Superseded;
        }

        info!(generation, %mode, request_id = %request.request_id, "Submitting score computation");

        match self.scorer.explain(&request, mode).await {
            Ok(response) => {
                let mut slot = self.lock();
                if slot.latest != generation {
                    debug!(generation, latest = slot.latest, "Discarding stale score result");
                    return SubmitOutcome::Superseded;
                }
                slot.result = ExplainResult {
                    causal_effects: rank(response.causal_effects),
                };
                info!(generation, effects = slot.result.causal_effects.len(), "Applied score result");
                SubmitOutcome::Applied
            }
            Err(e) => {
                warn!(generation, error = %e, "Score computation failed, keeping previous result");
                SubmitOutcome::Failed(e)
            }
        }
    }
}
