//! Entity schema registration

use crate::error::{NormalizeError, Result};
use indexmap::IndexMap;
use tracing::debug;

/// Identifier field used when none is given
pub const DEFAULT_ID_FIELD: &str = "id";

/// A nested entity type, found under `key` somewhere inside a root record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedEntitySchema {
    /// Field name searched for within the root record
    pub key: String,

    /// Identifier field within the matched nested record
    pub id_field: String,
}

/// The root entity type and the nested entity types it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub name: String,
    pub id_field: String,

    /// Nested entity types in registration order
    pub nested: IndexMap<String, NestedEntitySchema>,
}

impl EntitySchema {
    /// All entity names: root first, then nested in registration order
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.nested.keys().map(String::as_str))
    }
}

/// Holds the schema and, optionally, an explicit processing order
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    root: Option<EntitySchema>,
    order: Option<Vec<String>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    /// Register the root entity. Only one root is allowed.
    pub fn define_root(&mut self, name: impl Into<String>, id_field: impl Into<String>) -> Result<()> {
        let name = name.into();
        if let Some(existing) = &self.root {
            return Err(NormalizeError::config(format!(
                "only one root entity is allowed (already defined: {}, attempted: {})",
                existing.name, name
            )));
        }

        let id_field = id_field.into();
        debug!(entity = %name, id_field = %id_field, "defined root entity");
        self.root = Some(EntitySchema {
            name,
            id_field,
            nested: IndexMap::new(),
        });
        Ok(())
    }

    /// Register a nested entity type under the root.
    ///
    /// Redefining an existing name replaces its key and id field but keeps its
    /// registration position.
    pub fn define_nested(
        &mut self,
        name: impl Into<String>,
        key: impl Into<String>,
        id_field: impl Into<String>,
    ) -> Result<()> {
        let name = name.into();
        let Some(root) = self.root.as_mut() else {
            return Err(NormalizeError::config(format!(
                "a root entity must be defined before nested entity {}",
                name
            )));
        };

        let schema = NestedEntitySchema {
            key: key.into(),
            id_field: id_field.into(),
        };
        debug!(entity = %name, key = %schema.key, id_field = %schema.id_field, "defined nested entity");
        root.nested.insert(name, schema);
        Ok(())
    }

    /// Set the processing order explicitly (deepest first).
    ///
    /// May be called at any point during registration; names are checked
    /// against the complete schema when the normalizer first runs. An empty
    /// order leaves the order unset, so it is inferred from the first record.
    /// Nested entities left out of a non-empty order are never extracted.
    pub fn set_entity_order<I, S>(&mut self, order: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let order: Vec<String> = order.into_iter().map(Into::into).collect();
        if order.is_empty() {
            debug!("empty entity order; order will be inferred");
            self.order = None;
        } else {
            debug!(order = ?order, "set explicit entity order");
            self.order = Some(order);
        }
    }

    pub fn root(&self) -> Option<&EntitySchema> {
        self.root.as_ref()
    }

    pub fn entity_order(&self) -> Option<&[String]> {
        self.order.as_deref()
    }

    pub(crate) fn into_parts(self) -> (Option<EntitySchema>, Option<Vec<String>>) {
        (self.root, self.order)
    }
}

/// Check an explicit order against the complete schema: every name must be a
/// registered nested entity, listed once.
pub(crate) fn validate_entity_order(schema: &EntitySchema, order: &[String]) -> Result<()> {
    for (pos, name) in order.iter().enumerate() {
        if !schema.nested.contains_key(name) {
            return Err(NormalizeError::config(format!(
                "entity order names unknown nested entity {}",
                name
            )));
        }
        if order[..pos].contains(name) {
            return Err(NormalizeError::config(format!(
                "entity order lists {} more than once",
                name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_root_once() {
        let mut registry = SchemaRegistry::new();
        registry.define_root("articles", DEFAULT_ID_FIELD).unwrap();

        let err = registry.define_root("comments", DEFAULT_ID_FIELD).unwrap_err();
        assert!(matches!(err, NormalizeError::Configuration(_)));
        assert_eq!(registry.root().unwrap().name, "articles");
    }

    #[test]
    fn test_nested_requires_root() {
        let mut registry = SchemaRegistry::new();
        let err = registry.define_nested("users", "author", "id").unwrap_err();
        assert!(matches!(err, NormalizeError::Configuration(_)));
    }

    #[test]
    fn test_nested_keeps_registration_order() {
        let mut registry = SchemaRegistry::new();
        registry.define_root("articles", "id").unwrap();
        registry.define_nested("users", "author", "id").unwrap();
        registry.define_nested("addresses", "address", "id").unwrap();
        registry.define_nested("users", "writer", "user_id").unwrap();

        let root = registry.root().unwrap();
        let names: Vec<&str> = root.entity_names().collect();
        assert_eq!(names, vec!["articles", "users", "addresses"]);
        assert_eq!(root.nested["users"].key, "writer");
        assert_eq!(root.nested["users"].id_field, "user_id");
    }

    #[test]
    fn test_entity_order_validation() {
        let mut registry = SchemaRegistry::new();
        registry.define_root("articles", "id").unwrap();
        registry.define_nested("users", "author", "id").unwrap();
        registry.define_nested("addresses", "address", "id").unwrap();
        let schema = registry.root().unwrap().clone();

        let unknown = vec!["addresses".to_string(), "comments".to_string()];
        assert!(validate_entity_order(&schema, &unknown).is_err());
        let repeated = vec!["users".to_string(), "users".to_string()];
        assert!(validate_entity_order(&schema, &repeated).is_err());
        let valid = vec!["addresses".to_string(), "users".to_string()];
        assert!(validate_entity_order(&schema, &valid).is_ok());
    }

    #[test]
    fn test_order_may_be_set_before_nested_entities() {
        let mut registry = SchemaRegistry::new();
        registry.define_root("articles", "id").unwrap();
        registry.set_entity_order(["addresses", "users"]);
        registry.define_nested("users", "author", "id").unwrap();
        registry.define_nested("addresses", "address", "id").unwrap();

        assert_eq!(
            registry.entity_order().unwrap(),
            &["addresses".to_string(), "users".to_string()]
        );
        let order = registry.entity_order().unwrap().to_vec();
        assert!(validate_entity_order(registry.root().unwrap(), &order).is_ok());
    }

    #[test]
    fn test_empty_order_leaves_order_unset() {
        let mut registry = SchemaRegistry::new();
        registry.define_root("articles", "id").unwrap();
        registry.set_entity_order(["users"]);
        registry.set_entity_order(Vec::<String>::new());

        assert!(registry.entity_order().is_none());
    }
}
