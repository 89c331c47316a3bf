use crate::diff_mode::DiffMode;
use crate::membership::{mask, GroupIndices};
use crate::metadata::Row;
use crate::subspace::SubspacePair;
use serde_json::Value;

/// Field added to every row by [`materialize`].
pub const SELECTION_TAG: &str = "__subspace_membership__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MembershipTag {
    Neither = 0,
    Foreground = 1,
    Background = 2,
}

impl MembershipTag {
    pub fn of(row: &Row) -> Option<Self> {
        match row.get(SELECTION_TAG)?.as_u64()? {
            0 => Some(MembershipTag::Neither),
            1 => Some(MembershipTag::Foreground),
            2 => Some(MembershipTag::Background),
            _ => None,
        }
    }
}

/// Copy `rows`, tagging each with its group membership.
///
/// Without an active comparison the rows come back untagged. In `full` mode
/// the background is the whole sample rather than a group of its own, so only
/// foreground rows are tagged as members.
pub fn materialize(
    rows: &[Row],
    subspaces: Option<&SubspacePair>,
    indices: &GroupIndices,
    mode: DiffMode,
) -> Vec<Row> {
    if subspaces.is_none() {
        return rows.to_vec();
    }

    let in_a = mask(rows.len(), &indices.foreground);
    let in_b = match mode {
        DiffMode::Full => vec![false; rows.len()],
        DiffMode::Other | DiffMode::TwoGroup => mask(rows.len(), &indices.background),
    };

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let tag = if in_a[i] {
                MembershipTag::Foreground
            } else if in_b[i] {
                MembershipTag::Background
            } else {
                MembershipTag::Neither
            };
            let mut tagged = row.clone();
            tagged.insert(SELECTION_TAG.to_string(), Value::from(tag as u8));
            tagged
        })
        .collect()
}
