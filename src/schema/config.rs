//! Schema configuration documents
//!
//! A normalizer can be described by a small JSON document instead of a
//! sequence of registration calls:
//!
//! ```json
//! {
//!   "root": {"name": "articles"},
//!   "nested": [
//!     {"name": "users", "key": "author"},
//!     {"name": "addresses", "key": "address", "id_field": "id"}
//!   ],
//!   "order": ["addresses", "users"]
//! }
//! ```

use crate::error::{NormalizeError, Result};
use crate::normalize::Normalizer;
use crate::schema::registry::{SchemaRegistry, DEFAULT_ID_FIELD};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

// NAME[:ID]
static ROOT_FLAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[^=:\s]+)(?::(?P<id>[^=:\s]+))?$").expect("valid root flag regex")
});

// NAME=KEY[:ID]
static NESTED_FLAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[^=:\s]+)=(?P<key>[^=:\s]+)(?::(?P<id>[^=:\s]+))?$")
        .expect("valid nested flag regex")
});

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    pub name: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

impl RootConfig {
    /// Parse a `NAME[:ID]` command-line value
    pub fn parse_flag(s: &str) -> Result<Self> {
        let caps = ROOT_FLAG.captures(s.trim()).ok_or_else(|| {
            NormalizeError::config(format!("invalid root entity \"{}\", expected NAME[:ID]", s))
        })?;
        Ok(RootConfig {
            name: caps["name"].to_string(),
            id_field: caps
                .name("id")
                .map_or_else(default_id_field, |m| m.as_str().to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedConfig {
    pub name: String,
    pub key: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

impl NestedConfig {
    /// Parse a `NAME=KEY[:ID]` command-line value
    pub fn parse_flag(s: &str) -> Result<Self> {
        let caps = NESTED_FLAG.captures(s.trim()).ok_or_else(|| {
            NormalizeError::config(format!(
                "invalid nested entity \"{}\", expected NAME=KEY[:ID]",
                s
            ))
        })?;
        Ok(NestedConfig {
            name: caps["name"].to_string(),
            key: caps["key"].to_string(),
            id_field: caps
                .name("id")
                .map_or_else(default_id_field, |m| m.as_str().to_string()),
        })
    }
}

/// Declarative form of a schema registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    pub root: RootConfig,

    #[serde(default)]
    pub nested: Vec<NestedConfig>,

    /// Explicit deepest-first order; inferred from the first record when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<String>>,
}

impl SchemaConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| NormalizeError::config(format!("invalid schema document: {}", e)))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
        Ok(Self::from_json_str(&content)?)
    }

    /// Replay this configuration as registration calls
    pub fn to_registry(&self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        registry.define_root(&self.root.name, &self.root.id_field)?;
        for nested in &self.nested {
            registry.define_nested(&nested.name, &nested.key, &nested.id_field)?;
        }
        if let Some(order) = &self.order {
            registry.set_entity_order(order);
        }
        Ok(registry)
    }

    pub fn into_normalizer(self) -> Result<Normalizer> {
        Ok(Normalizer::new(self.to_registry()?))
    }
}
