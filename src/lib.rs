//! Comparative subspace explanation engine.
//!
//! Given a dataset, a main field and one or two predicate-defined row
//! subspaces, works out which rows belong to each group and asks a causal
//! scorer which fields best explain the difference between them.

pub mod config;
pub mod diff_mode;
pub mod error;
pub mod explorer;
pub mod filter;
pub mod materialize;
pub mod membership;
pub mod metadata;
pub mod reconciler;
pub mod request;
pub mod scorer;
pub mod subspace;

pub use config::ExplainerConfig;
pub use diff_mode::{DiffMode, EditingGroup};
pub use error::{ExplainError, Result};
pub use explorer::{recompute, Change, Effects, ExplorerSession, ExplorerState, Submission};
pub use filter::Filter;
pub use materialize::{materialize, MembershipTag, SELECTION_TAG};
pub use membership::{membership, GroupIndices};
pub use metadata::{CausalModel, Dataset, FieldMeta, Row, SemanticType};
pub use reconciler::{ExplainResult, ScoreReconciler, SubmitOutcome, Ticket};
pub use request::{Aggregation, ExplainRequest};
pub use scorer::{CausalEffect, CausalScorer, ExecutionMode, ScoreResponse, ScorerRouter};
pub use subspace::{Subspace, SubspacePair};
