//! Diff-mode resolution
//!
//! Turns the single filter drawn by the user into the pair of subspaces that
//! gets compared, according to how the background group is derived.

use crate::error::{ExplainError, Result};
use crate::filter::Filter;
use crate::subspace::{Subspace, SubspacePair};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffMode {
    /// Foreground against the full dataset.
    #[default]
    Full,
    /// Foreground against its complement.
    Other,
    /// Two independently edited groups.
    TwoGroup,
}

impl DiffMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffMode::Full => "full",
            DiffMode::Other => "other",
            DiffMode::TwoGroup => "two-group",
        }
    }
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiffMode {
    type Err = ExplainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "full" => Ok(DiffMode::Full),
            "other" => Ok(DiffMode::Other),
            "two-group" | "two_group" => Ok(DiffMode::TwoGroup),
            _ => Err(ExplainError::Config(format!("Unknown diff mode: {}", s))),
        }
    }
}

/// Which group a filter edits in two-group mode. Serialized as 1 or 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EditingGroup {
    #[default]
    Foreground,
    Background,
}

impl EditingGroup {
    pub fn index(&self) -> u8 {
        match self {
            EditingGroup::Foreground => 1,
            EditingGroup::Background => 2,
        }
    }

    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            1 => Some(EditingGroup::Foreground),
            2 => Some(EditingGroup::Background),
            _ => None,
        }
    }
}

/// Derive the subspaces to compare after the user drew (or cleared) a filter.
///
/// `None` means no comparison is active.
pub fn resolve(
    mode: DiffMode,
    filter: Option<&Filter>,
    editing: EditingGroup,
    previous: Option<&SubspacePair>,
) -> Option<SubspacePair> {
    match mode {
        DiffMode::Full => filter.map(|f| {
            SubspacePair::new(Subspace::with_predicates(vec![f.clone()]), Subspace::all())
        }),
        DiffMode::Other => filter.map(|f| {
            SubspacePair::new(
                Subspace::with_predicates(vec![f.clone()]),
                Subspace::reverted(vec![f.clone()]),
            )
        }),
        DiffMode::TwoGroup => {
            let mut next = previous.cloned().unwrap_or_default();
            *next.get_mut(editing) = Subspace::with_predicates(filter.cloned().into_iter().collect());
            Some(next)
        }
    }
}

/// State after the diff mode itself changed: the background is emptied and
/// editing goes back to the foreground.
pub fn switch_mode(previous: Option<&SubspacePair>) -> (Option<SubspacePair>, EditingGroup) {
    let subspaces = previous.map(|p| SubspacePair::new(p.foreground.clone(), Subspace::all()));
    (subspaces, EditingGroup::Foreground)
}

/// The pair as the given mode defines it, whatever is stored for the
/// background. `full` compares against every row and `other` against the
/// reverted foreground, which is exactly what row membership computes
/// locally for those modes.
pub fn canonical(mode: DiffMode, pair: &SubspacePair) -> SubspacePair {
    match mode {
        DiffMode::Full => SubspacePair::new(pair.foreground.clone(), Subspace::all()),
        DiffMode::Other => SubspacePair::new(
            pair.foreground.clone(),
            Subspace::reverted(pair.foreground.predicates.clone()),
        ),
        DiffMode::TwoGroup => pair.clone(),
    }
}
