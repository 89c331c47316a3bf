use crate::diff_mode::EditingGroup;
use crate::filter::Filter;
use crate::metadata::Row;
use serde::{Deserialize, Serialize};

/// A conjunction of predicates, optionally complemented.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subspace {
    pub predicates: Vec<Filter>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub reverted: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Subspace {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Rows matching every predicate.
    pub fn with_predicates(predicates: Vec<Filter>) -> Self {
        Self {
            predicates,
            reverted: false,
        }
    }

    /// Rows failing at least one predicate.
    pub fn reverted(predicates: Vec<Filter>) -> Self {
        Self {
            predicates,
            reverted: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Conjunctive match, ignoring `reverted`. An empty list matches all rows.
    pub fn matches_predicates(&self, row: &Row) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }

    /// Full membership test. A reverted subspace is the exact logical
    /// negation of its predicate match, so it selects the complement of the
    /// unreverted subspace for every predicate kind.
    pub fn contains(&self, row: &Row) -> bool {
        self.matches_predicates(row) != self.reverted
    }

    /// Fields referenced by the predicates, in order, duplicates included.
    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.predicates.iter().map(Filter::fid)
    }
}

/// Foreground (index 0) and background (index 1) subspaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubspacePair {
    pub foreground: Subspace,
    pub background: Subspace,
}

impl SubspacePair {
    pub fn new(foreground: Subspace, background: Subspace) -> Self {
        Self {
            foreground,
            background,
        }
    }

    /// Subspace the given editing group refers to.
    pub fn get(&self, group: EditingGroup) -> &Subspace {
        match group {
            EditingGroup::Foreground => &self.foreground,
            EditingGroup::Background => &self.background,
        }
    }

    pub fn get_mut(&mut self, group: EditingGroup) -> &mut Subspace {
        match group {
            EditingGroup::Foreground => &mut self.foreground,
            EditingGroup::Background => &mut self.background,
        }
    }
}
