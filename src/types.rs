use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A single record: field name to value, in insertion order
pub type Record = Map<String, Value>;

/// One entity table, keyed by identifier, in first-insertion order
pub type EntityTable = IndexMap<Identifier, Record>;

/// The raw scalar an entity is keyed by.
///
/// Integers and strings keep their JSON type, so `1` and `"1"` are distinct
/// keys. Other scalars (booleans, floats, null) are keyed by their JSON text.
///
/// JSON object keys are always strings, so distinct identifiers with the same
/// text (`1` and `"1"`) collide once a table is rendered as a JSON object.
/// See [`NormalizedResult::to_json_value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    UInt(u64),
    Str(String),
    Other(String),
}

impl Identifier {
    /// Build an identifier from a JSON value, if it is a scalar
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Identifier::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Identifier::UInt(u))
                } else {
                    Some(Identifier::Other(n.to_string()))
                }
            }
            Value::String(s) => Some(Identifier::Str(s.clone())),
            Value::Bool(b) => Some(Identifier::Other(b.to_string())),
            Value::Null => Some(Identifier::Other(String::from("null"))),
            Value::Object(_) | Value::Array(_) => None,
        }
    }
}

impl From<i64> for Identifier {
    fn from(id: i64) -> Self {
        Identifier::Int(id)
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Identifier::Str(id.to_string())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(i) => write!(f, "{}", i),
            Identifier::UInt(u) => write!(f, "{}", u),
            Identifier::Str(s) | Identifier::Other(s) => f.write_str(s),
        }
    }
}

/// The output of one normalization pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedResult {
    /// Root identifiers, one per input record, in input order
    pub results: Vec<Identifier>,

    /// Entity name (root first, then nested in registration order) to its table
    pub entities: IndexMap<String, EntityTable>,
}

impl NormalizedResult {
    /// Create a result with an empty table for every given entity name
    pub fn with_tables<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        NormalizedResult {
            results: Vec::new(),
            entities: names
                .into_iter()
                .map(|name| (name.to_string(), EntityTable::new()))
                .collect(),
        }
    }

    /// Get the table for an entity type
    pub fn table(&self, entity: &str) -> Option<&EntityTable> {
        self.entities.get(entity)
    }

    /// Look up one stored record
    pub fn get(&self, entity: &str, id: &Identifier) -> Option<&Record> {
        self.entities.get(entity).and_then(|table| table.get(id))
    }

    /// Total number of stored records across all tables
    pub fn record_count(&self) -> usize {
        self.entities.values().map(|table| table.len()).sum()
    }

    /// Convert to a plain JSON value (`{"results": [...], "entities": {...}}`).
    ///
    /// Table keys become JSON object keys, so when one table holds identifiers
    /// with the same text (`1` and `"1"`) only the later record survives in the
    /// returned value. Serializing with `serde_json::to_string` instead emits
    /// both under a duplicate key. Use [`TableWriter`](crate::TableWriter) or
    /// the tables themselves to keep every record.
    pub fn to_json_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
