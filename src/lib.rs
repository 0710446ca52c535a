//! # Denest - nested record normalization
//!
//! Turns a batch of deeply nested records into flat, per-entity tables keyed
//! by identifier, with every nested record replaced by its identifier. Shared
//! sub-records (the same author under many articles) are stored once.
//!
//! ## Modules
//!
//! - **schema**: register the root entity and the nested entity types to hoist
//! - **normalize**: processing order, first-match search, extraction engine, table writer
//!
//! ## Quick Start
//!
//! ```rust
//! use denest::Normalizer;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut normalizer = Normalizer::builder()
//!     .root("articles")?
//!     .nested("users", "author")?
//!     .nested("addresses", "address")?
//!     .order(&["addresses", "users"])
//!     .build();
//!
//! let result = normalizer
//!     .parse_values(vec![
//!         json!({"id": 1, "title": "A", "author": {"id": 7, "name": "Dan", "address": {"id": 2}}}),
//!         json!({"id": 2, "title": "B", "author": {"id": 7, "name": "Dan"}}),
//!     ])?
//!     .expect("non-empty batch");
//!
//! // results = [1, 2]
//! // entities.articles = {1: {id, title, author: 7}, 2: {...}}
//! // entities.users = {7: {id: 7, name: "Dan"}}
//! // entities.addresses = {2: {id: 2}}
//! assert_eq!(result.results.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! Without an explicit order, the order is inferred from the first record:
//! entities whose key sits deeper are extracted first.

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Read;

pub mod error;
pub mod normalize;
pub mod schema;
pub mod types;

// Re-export commonly used types for convenience
pub use error::NormalizeError;
pub use normalize::{Normalizer, NormalizerBuilder, TableWriter};
pub use schema::{EntitySchema, NestedEntitySchema, SchemaConfig, SchemaRegistry};
pub use types::{EntityTable, Identifier, NormalizedResult, Record};

/// Read a batch of records: a JSON array, a single JSON value, or NDJSON
pub fn read_records<R: Read>(mut reader: R) -> Result<Vec<Value>> {
    let mut content = Vec::new();
    reader
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    // simd-json parses in place, so keep the original bytes for the NDJSON fallback
    let mut scratch = content.clone();
    match simd_json::serde::from_slice::<Value>(&mut scratch) {
        Ok(Value::Array(values)) => Ok(values),
        Ok(value) => Ok(vec![value]),
        Err(_) => {
            let content_str = String::from_utf8_lossy(&content);
            let mut values = Vec::new();
            for (line_no, line) in content_str.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(line)
                    .with_context(|| format!("Failed to parse JSON on line {}", line_no + 1))?;
                values.push(value);
            }
            Ok(values)
        }
    }
}

/// Main entry point: read records from `reader` and normalize them
pub fn normalize_json<R: Read>(
    reader: R,
    normalizer: &mut Normalizer,
) -> Result<Option<NormalizedResult>> {
    let values = read_records(reader)?;
    let result = normalizer
        .parse_values(values)
        .context("Failed to normalize records")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn article_normalizer() -> Normalizer {
        SchemaConfig::from_json_str(
            r#"{
                "root": {"name": "articles"},
                "nested": [
                    {"name": "users", "key": "author"},
                    {"name": "addresses", "key": "address"}
                ],
                "order": ["addresses", "users"]
            }"#,
        )
        .unwrap()
        .into_normalizer()
        .unwrap()
    }

    #[test]
    fn test_articles_end_to_end() {
        let input = r#"[
            {"id": 1, "title": "Some Article", "author": {
                "id": 1, "name": "Dan", "address": {"id": 2, "street": "101 somewhere lane", "state": "Kansas"}}},
            {"id": 3, "title": "Some Other Article", "author": {"id": 1, "name": "Ben"}},
            {"id": 2, "title": "Other Article", "author": {
                "id": 2, "name": "Skippy", "address": {"id": 1, "street": "100 somewhere lane", "state": "Kansas"}}},
            {"id": 4, "title": "Some Other Article"}
        ]"#;

        let mut normalizer = article_normalizer();
        let result = normalize_json(input.as_bytes(), &mut normalizer)
            .unwrap()
            .unwrap();

        assert_eq!(
            result.to_json_value().unwrap(),
            json!({
                "results": [1, 3, 2, 4],
                "entities": {
                    "articles": {
                        "1": {"id": 1, "title": "Some Article", "author": 1},
                        "3": {"id": 3, "title": "Some Other Article", "author": 1},
                        "2": {"id": 2, "title": "Other Article", "author": 2},
                        "4": {"id": 4, "title": "Some Other Article"}
                    },
                    "users": {
                        "1": {"id": 1, "name": "Ben"},
                        "2": {"id": 2, "name": "Skippy", "address": 1}
                    },
                    "addresses": {
                        "2": {"id": 2, "street": "101 somewhere lane", "state": "Kansas"},
                        "1": {"id": 1, "street": "100 somewhere lane", "state": "Kansas"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_ndjson_input() {
        let input = "{\"id\": \"a\", \"author\": {\"id\": 1}}\n\n{\"id\": \"b\", \"author\": {\"id\": 1}}\n";

        let mut normalizer = article_normalizer();
        let result = normalize_json(input.as_bytes(), &mut normalizer)
            .unwrap()
            .unwrap();

        assert_eq!(
            result.results,
            vec![Identifier::from("a"), Identifier::from("b")]
        );
        assert_eq!(result.table("users").unwrap().len(), 1);
    }

    #[test]
    fn test_single_object_input() {
        let values = read_records(r#"{"id": 1}"#.as_bytes()).unwrap();
        assert_eq!(values, vec![json!({"id": 1})]);
    }

    #[test]
    fn test_empty_input_yields_none() {
        let mut normalizer = article_normalizer();
        assert!(normalize_json("".as_bytes(), &mut normalizer).unwrap().is_none());
    }

    #[test]
    fn test_record_field_order_is_preserved() {
        let values = read_records(r#"[{"z": 1, "a": {"m": 2, "b": 3}}]"#.as_bytes()).unwrap();
        let record = values[0].as_object().unwrap();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_missing_root_id_surfaces_as_error() {
        let mut normalizer = article_normalizer();
        let err = normalize_json(r#"[{"title": "x"}]"#.as_bytes(), &mut normalizer).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NormalizeError>(),
            Some(NormalizeError::MissingIdentifier { .. })
        ));
    }
}
