//! Explanation request construction
//!
//! Builds the payload handed to the causal scorer. The layout mirrors what the
//! scoring service expects on the wire (camelCase keys).

use crate::error::{ExplainError, Result};
use crate::metadata::{CausalModel, Dataset, FieldMeta, Row};
use crate::subspace::{Subspace, SubspacePair};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Mean,
    Count,
}

impl Aggregation {
    /// Parse a selector value; `none` (or empty) means unaggregated detail.
    pub fn parse_optional(s: &str) -> Result<Option<Self>> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Count => "count",
        };
        f.write_str(s)
    }
}

impl FromStr for Aggregation {
    type Err = ExplainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "mean" => Ok(Aggregation::Mean),
            "count" => Ok(Aggregation::Count),
            _ => Err(ExplainError::Config(format!("Unknown aggregation: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub fid: String,
    /// `None` is unaggregated detail.
    pub op: Option<Aggregation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    pub dimensions: Vec<String>,
    pub measures: Vec<Measure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Groups {
    pub current: Subspace,
    pub other: Subspace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub request_id: Uuid,
    pub data: Vec<Row>,
    pub fields: Vec<FieldMeta>,
    pub causal_model: CausalModel,
    pub groups: Groups,
    pub view: ViewSpec,
}

/// Assemble a scorer request.
///
/// Returns `Ok(None)` when there is nothing to explain (no main field or no
/// active comparison). Fails when the main field or any predicate refers to a
/// field missing from the dataset metadata.
pub fn build(
    main_field: Option<&str>,
    aggregation: Option<Aggregation>,
    subspaces: Option<&SubspacePair>,
    dataset: &Dataset,
    causal_model: &CausalModel,
) -> Result<Option<ExplainRequest>> {
    let (Some(main_field), Some(pair)) = (main_field, subspaces) else {
        return Ok(None);
    };

    let known = dataset.field_ids();
    let referenced = std::iter::once(main_field)
        .chain(pair.foreground.field_ids())
        .chain(pair.background.field_ids());
    for fid in referenced {
        if !known.contains(fid) {
            return Err(ExplainError::UnknownField(fid.to_string()));
        }
    }

    let dimensions: Vec<String> = pair
        .foreground
        .field_ids()
        .chain(std::iter::once(main_field))
        .unique()
        .filter(|fid| *fid != main_field)
        .map(str::to_string)
        .collect();

    let request = ExplainRequest {
        request_id: Uuid::new_v4(),
        data: dataset.rows.clone(),
        fields: dataset.fields.clone(),
        causal_model: causal_model.clone(),
        groups: Groups {
            current: pair.foreground.clone(),
            other: pair.background.clone(),
        },
        view: ViewSpec {
            dimensions,
            measures: vec![Measure {
                fid: main_field.to_string(),
                op: aggregation,
            }],
        },
    };

    debug!(
        request_id = %request.request_id,
        rows = request.data.len(),
        dimensions = ?request.view.dimensions,
        "Built explanation request"
    );

    Ok(Some(request))
}
