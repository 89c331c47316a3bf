//! Explorer state
//!
//! All inputs of a comparison live in [`ExplorerState`]. Every upstream event
//! is a [`Change`], and [`recompute`] derives the next state from the previous
//! one without side effects. [`ExplorerSession`] adds the one piece of
//! asynchronous machinery, the score reconciler.

use crate::diff_mode::{self, DiffMode, EditingGroup};
use crate::error::Result;
use crate::filter::Filter;
use crate::materialize::materialize;
use crate::membership::{membership, GroupIndices};
use crate::metadata::{CausalModel, Dataset, Row};
use crate::reconciler::{ExplainResult, ScoreReconciler, SubmitOutcome, Ticket};
use crate::request::{self, Aggregation, ExplainRequest};
use crate::scorer::{CausalScorer, ExecutionMode};
use crate::subspace::SubspacePair;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerState {
    pub dataset: Dataset,
    pub causal_model: CausalModel,
    pub main_field: Option<String>,
    pub aggregation: Option<Aggregation>,
    pub diff_mode: DiffMode,
    pub editing_group: EditingGroup,
    pub subspaces: Option<SubspacePair>,
    /// Entry dimension of the detail views.
    pub index_key: Option<String>,
    pub execution_mode: ExecutionMode,
    pub indices: GroupIndices,
    /// Rows handed to detail views: the raw sample while no comparison is
    /// active, the tagged rows once a selection has been applied.
    pub selected: Vec<Row>,
}

impl Default for ExplorerState {
    fn default() -> Self {
        Self {
            dataset: Dataset::default(),
            causal_model: CausalModel::default(),
            main_field: None,
            aggregation: Some(Aggregation::Count),
            diff_mode: DiffMode::default(),
            editing_group: EditingGroup::default(),
            subspaces: None,
            index_key: None,
            execution_mode: ExecutionMode::default(),
            indices: GroupIndices::default(),
            selected: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Dataset(Dataset),
    CausalModel(CausalModel),
    MainField(Option<String>),
    Aggregation(Option<Aggregation>),
    DiffMode(DiffMode),
    EditingGroup(EditingGroup),
    Filter(Option<Filter>),
    IndexKey(Option<String>),
    ExecutionMode(ExecutionMode),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effects {
    /// The displayed explanation no longer matches the inputs.
    pub reset_result: bool,
}

pub fn recompute(mut state: ExplorerState, change: Change) -> (ExplorerState, Effects) {
    let mut effects = Effects::default();
    let mut refresh_indices = false;

    match change {
        Change::Dataset(dataset) => {
            state.index_key = state.index_key.filter(|k| dataset.has_field(k));
            state.dataset = dataset;
            effects.reset_result = true;
            refresh_indices = true;
        }
        Change::CausalModel(model) => {
            if model != state.causal_model {
                state.causal_model = model;
                effects.reset_result = true;
            }
        }
        Change::MainField(field) => {
            if field != state.main_field {
                state.main_field = field;
                effects.reset_result = true;
                refresh_indices = state.subspaces.take().is_some();
            }
        }
        Change::Aggregation(aggregation) => {
            if aggregation != state.aggregation {
                state.aggregation = aggregation;
                effects.reset_result = true;
                refresh_indices = state.subspaces.take().is_some();
            }
        }
        Change::DiffMode(mode) => {
            if mode != state.diff_mode {
                let (subspaces, group) = diff_mode::switch_mode(state.subspaces.as_ref());
                // Same stored pair can mean different groups under another mode.
                effects.reset_result = state.subspaces.is_some();
                state.diff_mode = mode;
                state.subspaces = subspaces;
                state.editing_group = group;
                refresh_indices = true;
            }
        }
        Change::EditingGroup(group) => {
            state.editing_group = group;
        }
        Change::Filter(filter) => {
            let subspaces = diff_mode::resolve(
                state.diff_mode,
                filter.as_ref(),
                state.editing_group,
                state.subspaces.as_ref(),
            );
            if subspaces != state.subspaces {
                state.subspaces = subspaces;
                effects.reset_result = true;
                refresh_indices = true;
            }
        }
        Change::IndexKey(key) => {
            let key = key.filter(|k| state.dataset.has_field(k));
            if key != state.index_key {
                state.index_key = key;
                effects.reset_result = true;
            }
        }
        Change::ExecutionMode(mode) => {
            state.execution_mode = mode;
        }
    }

    if refresh_indices {
        state.indices = membership(&state.dataset.rows, state.subspaces.as_ref(), state.diff_mode);
        if state.subspaces.is_none() {
            state.selected = state.dataset.rows.clone();
        }
        debug!(
            foreground = state.indices.foreground.len(),
            background = state.indices.background.len(),
            "Recomputed group indices"
        );
    }

    (state, effects)
}

impl ExplorerState {
    /// Request for the current comparison. The groups are sent in their
    /// canonical form for the diff mode, so the scorer sees the same rows
    /// that [`membership`] assigns to each group.
    pub fn build_request(&self) -> Result<Option<ExplainRequest>> {
        let groups = self
            .subspaces
            .as_ref()
            .map(|pair| diff_mode::canonical(self.diff_mode, pair));
        request::build(
            self.main_field.as_deref(),
            self.aggregation,
            groups.as_ref(),
            &self.dataset,
            &self.causal_model,
        )
    }
}

/// A score computation ready to run. It owns everything it needs, so it can
/// be spawned. Its generation is reserved when it is prepared, so any input
/// change before or during the run makes it stale.
pub struct Submission {
    reconciler: Arc<ScoreReconciler>,
    prepared: Option<(Ticket, ExplainRequest)>,
    mode: ExecutionMode,
}

impl Submission {
    /// Run the computation. Returns `Superseded` without calling the scorer
    /// when the inputs changed since it was prepared.
    pub async fn run(self) -> SubmitOutcome {
        match self.prepared {
            Some((ticket, request)) => self.reconciler.run(ticket, request, self.mode).await,
            None => SubmitOutcome::Skipped,
        }
    }
}

pub struct ExplorerSession {
    state: ExplorerState,
    reconciler: Arc<ScoreReconciler>,
}

impl ExplorerSession {
    pub fn new(scorer: Arc<dyn CausalScorer>) -> Self {
        Self::with_state(scorer, ExplorerState::default())
    }

    pub fn with_state(scorer: Arc<dyn CausalScorer>, state: ExplorerState) -> Self {
        Self {
            state,
            reconciler: Arc::new(ScoreReconciler::new(scorer)),
        }
    }

    /// Current inputs and derived groups.
    pub fn state(&self) -> &ExplorerState {
        &self.state
    }

    pub fn result(&self) -> ExplainResult {
        self.reconciler.result()
    }

    pub fn reconciler(&self) -> &Arc<ScoreReconciler> {
        &self.reconciler
    }

    /// Fold one upstream change into the state, emptying the displayed result
    /// when the change invalidates it.
    pub fn apply(&mut self, change: Change) -> Effects {
        let state = std::mem::take(&mut self.state);
        let (next, effects) = recompute(state, change);
        self.state = next;
        if effects.reset_result {
            self.reconciler.reset();
        }
        effects
    }

    /// Tag the rows with their group membership and prepare a score
    /// computation for the current comparison.
    ///
    /// Returns `Ok(None)` when no comparison is active. Fails when the request
    /// cannot be built; the session state stays usable.
    pub fn apply_selection(&mut self) -> Result<Option<Submission>> {
        if self.state.subspaces.is_none() {
            self.state.selected = self.state.dataset.rows.clone();
            return Ok(None);
        }

        self.state.selected = materialize(
            &self.state.dataset.rows,
            self.state.subspaces.as_ref(),
            &self.state.indices,
            self.state.diff_mode,
        );

        let prepared = match self.state.build_request()? {
            Some(request) => Some((self.reconciler.begin(), request)),
            None => {
                self.reconciler.reset();
                debug!("No active comparison, cleared explanation result");
                None
            }
        };
        Ok(Some(Submission {
            reconciler: Arc::clone(&self.reconciler),
            prepared,
            mode: self.state.execution_mode,
        }))
    }

    /// [`apply_selection`](Self::apply_selection) followed by running the
    /// computation to completion.
    pub async fn explain(&mut self) -> Result<Option<SubmitOutcome>> {
        match self.apply_selection()? {
            Some(submission) => Ok(Some(submission.run().await)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldMeta, SemanticType};
    use crate::subspace::Subspace;
    use serde_json::json;

    fn dataset() -> Dataset {
        let rows = ["west", "east", "west", "north"]
            .iter()
            .enumerate()
            .map(|(i, region)| {
                let mut row = Row::new();
                row.insert("region".into(), json!(region));
                row.insert("revenue".into(), json!(i * 100));
                row
            })
            .collect();
        Dataset::new(
            vec![
                FieldMeta::new("region", SemanticType::Nominal),
                FieldMeta::new("revenue", SemanticType::Quantitative),
            ],
            rows,
        )
    }

    fn ready() -> ExplorerState {
        let (state, _) = recompute(ExplorerState::default(), Change::Dataset(dataset()));
        let (state, _) = recompute(state, Change::MainField(Some("revenue".into())));
        state
    }

    fn west() -> Filter {
        Filter::set("region", ["west"])
    }

    #[test]
    fn test_filter_builds_subspaces_and_indices() {
        let (state, effects) = recompute(ready(), Change::Filter(Some(west())));
        assert!(effects.reset_result);
        assert_eq!(state.indices.foreground, vec![0, 2]);
        assert_eq!(state.indices.background, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_main_field_and_aggregation_clear_subspaces() {
        let (state, _) = recompute(ready(), Change::Filter(Some(west())));
        let (cleared, effects) = recompute(state.clone(), Change::Aggregation(Some(Aggregation::Sum)));
        assert!(effects.reset_result);
        assert!(cleared.subspaces.is_none());
        assert_eq!(cleared.indices, GroupIndices::default());
        assert_eq!(cleared.selected, cleared.dataset.rows);

        let (cleared, _) = recompute(state.clone(), Change::MainField(None));
        assert!(cleared.subspaces.is_none());

        // Same value is not a change.
        let (same, effects) = recompute(state.clone(), Change::MainField(Some("revenue".into())));
        assert_eq!(effects, Effects::default());
        assert_eq!(same.subspaces, state.subspaces);
    }

    #[test]
    fn test_diff_mode_switch_resets_background_and_group() {
        let (state, _) = recompute(ready(), Change::DiffMode(DiffMode::TwoGroup));
        let (state, _) = recompute(state, Change::Filter(Some(west())));
        let (state, _) = recompute(state, Change::EditingGroup(EditingGroup::Background));
        let (state, _) = recompute(state, Change::Filter(Some(Filter::set("region", ["east"]))));
        assert_eq!(state.indices.background, vec![1]);

        let (state, effects) = recompute(state, Change::DiffMode(DiffMode::Other));
        assert!(effects.reset_result);
        assert_eq!(state.editing_group, EditingGroup::Foreground);
        let pair = state.subspaces.clone().unwrap();
        assert_eq!(pair.background, Subspace::all());
        assert_eq!(pair.foreground.predicates, vec![west()]);
        assert_eq!(state.indices.background, vec![1, 3]);
    }

    #[test]
    fn test_diff_mode_switch_resets_result_when_pair_is_unchanged() {
        let (state, _) = recompute(ready(), Change::Filter(Some(west())));
        let before = state.subspaces.clone();

        let (state, effects) = recompute(state, Change::DiffMode(DiffMode::Other));
        assert!(effects.reset_result);
        assert_eq!(state.subspaces, before);
        assert_eq!(state.indices.background, vec![1, 3]);

        // Without a comparison there is nothing to invalidate.
        let (_, effects) = recompute(ready(), Change::DiffMode(DiffMode::Other));
        assert!(!effects.reset_result);
    }

    #[test]
    fn test_index_key_revalidated_on_dataset_change() {
        let (state, effects) = recompute(ready(), Change::IndexKey(Some("region".into())));
        assert!(effects.reset_result);
        assert_eq!(state.index_key.as_deref(), Some("region"));

        let (state, _) = recompute(state, Change::IndexKey(Some("missing".into())));
        assert_eq!(state.index_key, None);

        let (state, _) = recompute(state, Change::IndexKey(Some("region".into())));
        let mut narrowed = dataset();
        narrowed.fields.retain(|f| f.fid != "region");
        let (state, _) = recompute(state, Change::Dataset(narrowed));
        assert_eq!(state.index_key, None);
    }

    #[test]
    fn test_request_uses_canonical_groups() {
        let (state, _) = recompute(ready(), Change::Filter(Some(west())));
        let (state, _) = recompute(state, Change::DiffMode(DiffMode::Other));
        let request = state.build_request().unwrap().unwrap();
        assert_eq!(request.groups.other, Subspace::reverted(vec![west()]));
        assert_eq!(request.view.dimensions, vec!["region"]);
    }

    #[test]
    fn test_execution_mode_does_not_reset_result() {
        let (_, effects) = recompute(ready(), Change::ExecutionMode(ExecutionMode::Server));
        assert!(!effects.reset_result);
        let (_, effects) = recompute(ready(), Change::EditingGroup(EditingGroup::Background));
        assert!(!effects.reset_result);
    }
}
