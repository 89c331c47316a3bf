//! Row membership
//!
//! Computes which row positions of the current sample fall into the
//! foreground and background groups.

use crate::diff_mode::DiffMode;
use crate::metadata::Row;
use crate::subspace::{Subspace, SubspacePair};

/// Row positions of both groups, in original row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIndices {
    pub foreground: Vec<usize>,
    pub background: Vec<usize>,
}

/// Positions of rows contained in `subspace` (honors `reverted`).
pub fn evaluate(rows: &[Row], subspace: &Subspace) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| subspace.contains(row))
        .map(|(i, _)| i)
        .collect()
}

/// Membership mask of length `len` with `indices` set.
pub fn mask(len: usize, indices: &[usize]) -> Vec<bool> {
    let mut mask = vec![false; len];
    for &i in indices {
        if let Some(slot) = mask.get_mut(i) {
            *slot = true;
        }
    }
    mask
}

pub fn membership(rows: &[Row], subspaces: Option<&SubspacePair>, mode: DiffMode) -> GroupIndices {
    let Some(pair) = subspaces else {
        return GroupIndices::default();
    };

    // The foreground is always matched on its predicates alone.
    let foreground: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| pair.foreground.matches_predicates(row))
        .map(|(i, _)| i)
        .collect();

    let background = match mode {
        DiffMode::TwoGroup => evaluate(rows, &pair.background),
        DiffMode::Full => (0..rows.len()).collect(),
        DiffMode::Other => {
            let in_foreground = mask(rows.len(), &foreground);
            (0..rows.len()).filter(|&i| !in_foreground[i]).collect()
        }
    };

    GroupIndices {
        foreground,
        background,
    }
}
