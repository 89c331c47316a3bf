use crate::error::{ExplainError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A single dataset row: field id to value.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Quantitative,
    Nominal,
    Ordinal,
    Temporal,
}

impl SemanticType {
    pub fn is_quantitative(&self) -> bool {
        matches!(self, SemanticType::Quantitative)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub fid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub semantic_type: SemanticType,
}

impl FieldMeta {
    pub fn new(fid: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            fid: fid.into(),
            name: None,
            semantic_type,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.fid)
    }
}

/// Causal model input. Both lists are opaque to the engine and handed to the
/// scorer untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CausalModel {
    #[serde(default)]
    pub func_deps: Vec<Value>,
    #[serde(default)]
    pub edges: Vec<Value>,
}

impl CausalModel {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// The current dataset sample together with its field metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub fields: Vec<FieldMeta>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(fields: Vec<FieldMeta>, rows: Vec<Row>) -> Self {
        Self { fields, rows }
    }

    /// Load rows from a `.json` (array of objects) or `.csv` file and field
    /// metadata from a JSON array.
    pub fn load(rows_path: &Path, fields_path: &Path) -> Result<Self> {
        let fields: Vec<FieldMeta> = serde_json::from_str(&fs::read_to_string(fields_path)?)?;

        let rows = match rows_path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Self::read_csv(rows_path)?,
            Some("json") => serde_json::from_str(&fs::read_to_string(rows_path)?)?,
            other => {
                return Err(ExplainError::Dataset(format!(
                    "Unsupported dataset format {:?} for {}",
                    other,
                    rows_path.display()
                )))
            }
        };

        Ok(Self { fields, rows })
    }

    fn read_csv(path: &Path) -> Result<Vec<Row>> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Row = headers
                .iter()
                .zip(record.iter())
                .map(|(name, raw)| (name.to_string(), parse_cell(raw)))
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Metadata of `fid`, if the dataset declares it.
    pub fn field(&self, fid: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.fid == fid)
    }

    pub fn has_field(&self, fid: &str) -> bool {
        self.field(fid).is_some()
    }

    pub fn field_ids(&self) -> HashSet<&str> {
        self.fields.iter().map(|f| f.fid.as_str()).collect()
    }
}

fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::from(f),
        _ => Value::String(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_cell_types() {
        assert_eq!(parse_cell("42"), json!(42));
        assert_eq!(parse_cell("2.5"), json!(2.5));
        assert_eq!(parse_cell(""), Value::Null);
        assert_eq!(parse_cell("west"), json!("west"));
        assert_eq!(parse_cell("NaN"), json!("NaN"));
        assert_eq!(parse_cell(" west "), json!("west"));
    }

    #[test]
    fn test_field_meta_wire_format() {
        let meta: FieldMeta =
            serde_json::from_value(json!({"fid": "revenue", "semanticType": "quantitative"}))
                .unwrap();
        assert_eq!(meta.fid, "revenue");
        assert!(meta.semantic_type.is_quantitative());
        assert_eq!(meta.display_name(), "revenue");
    }

    #[test]
    fn test_load_csv_dataset() {
        let dir = std::env::temp_dir().join(format!("subspace_explainer_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let rows_path = dir.join("rows.csv");
        let fields_path = dir.join("fields.json");
        fs::write(&rows_path, "region,revenue\nwest,10\neast,\n").unwrap();
        fs::write(
            &fields_path,
            r#"[{"fid":"region","semanticType":"nominal"},{"fid":"revenue","semanticType":"quantitative"}]"#,
        )
        .unwrap();

        let dataset = Dataset::load(&rows_path, &fields_path).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0]["revenue"], json!(10));
        assert_eq!(dataset.rows[1]["revenue"], Value::Null);
        assert!(dataset.has_field("region"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_rejects_unknown_format() {
        let err = Dataset::load(Path::new("rows.parquet"), Path::new("missing.json"));
        assert!(err.is_err());
    }
}
