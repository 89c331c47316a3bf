//! Predicate model
//!
//! A filter constrains a single field, either to a set of admissible values
//! or to an inclusive numeric range.

use crate::metadata::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Filter {
    /// Row value must equal one of `values`.
    Set { fid: String, values: Vec<Value> },
    /// Row value must be a number within `[min, max]`, both ends inclusive.
    Range { fid: String, range: [f64; 2] },
}

impl Filter {
    pub fn set<I, V>(fid: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::Set {
            fid: fid.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(fid: impl Into<String>, min: f64, max: f64) -> Self {
        Filter::Range {
            fid: fid.into(),
            range: [min, max],
        }
    }

    /// Field the predicate constrains.
    pub fn fid(&self) -> &str {
        match self {
            Filter::Set { fid, .. } | Filter::Range { fid, .. } => fid.as_str(),
        }
    }

    /// A row without the field never matches.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(value) = row.get(self.fid()) else {
            return false;
        };
        match self {
            Filter::Set { values, .. } => values.iter().any(|v| values_equal(v, value)),
            Filter::Range { range, .. } => match value.as_f64() {
                Some(x) => range[0] <= x && x <= range[1],
                None => false,
            },
        }
    }
}

// 1 and 1.0 are the same value to a user picking from a chart.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        let mut row = Row::new();
        row.insert("x".to_string(), value);
        row
    }

    #[test]
    fn test_set_membership() {
        let f = Filter::set("x", ["west", "east"]);
        assert!(f.matches(&row(json!("west"))));
        assert!(!f.matches(&row(json!("north"))));
        assert!(!f.matches(&Row::new()));
    }

    #[test]
    fn test_set_numeric_equality() {
        let f = Filter::set("x", [1]);
        assert!(f.matches(&row(json!(1.0))));
        assert!(!f.matches(&row(json!("1"))));
    }

    #[test]
    fn test_range_is_inclusive() {
        let f = Filter::range("x", 10.0, 20.0);
        assert!(f.matches(&row(json!(10))));
        assert!(f.matches(&row(json!(20.0))));
        assert!(!f.matches(&row(json!(20.5))));
        assert!(!f.matches(&row(json!("15"))));
        assert!(!f.matches(&row(Value::Null)));
    }

    #[test]
    fn test_wire_format() {
        let f: Filter =
            serde_json::from_value(json!({"fid": "price", "type": "range", "range": [1, 2]}))
                .unwrap();
        assert_eq!(f, Filter::range("price", 1.0, 2.0));

        let encoded = serde_json::to_value(Filter::set("region", ["west"])).unwrap();
        assert_eq!(encoded, json!({"type": "set", "fid": "region", "values": ["west"]}));
    }
}
