#![allow(dead_code)]

use serde_json::json;
use subspace_explainer::{Dataset, FieldMeta, Row, SemanticType};

/// Ten rows; `region = "west"` matches exactly rows 1, 3 and 5.
pub fn sales_dataset() -> Dataset {
    let regions = ["east", "west", "north", "west", "east", "west", "south", "north", "east", "south"];
    let rows: Vec<Row> = regions
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let mut row = Row::new();
            row.insert("region".into(), json!(region));
            row.insert("channel".into(), json!(if *region == "west" { "web" } else { "store" }));
            row.insert("units".into(), json!((i % 3) as f64));
            row.insert("revenue".into(), json!(100.0 + 10.0 * i as f64));
            row
        })
        .collect();

    Dataset::new(
        vec![
            FieldMeta::new("region", SemanticType::Nominal),
            FieldMeta::new("channel", SemanticType::Nominal),
            FieldMeta::new("units", SemanticType::Quantitative),
            FieldMeta::new("revenue", SemanticType::Quantitative),
        ],
        rows,
    )
}
