use crate::error::{NormalizeError, Result};
use crate::normalize::order;
use crate::normalize::search::{self, Lookup};
use crate::schema::registry::validate_entity_order;
use crate::schema::{EntitySchema, NestedEntitySchema, SchemaRegistry, DEFAULT_ID_FIELD};
use crate::types::{Identifier, NormalizedResult, Record};
use serde_json::Value;
use tracing::{info, trace};

/// Hoists nested entities out of root records into per-entity tables.
///
/// The processing order is either set explicitly on the registry or inferred
/// from the first record of the first non-empty [`parse`](Self::parse) call.
/// Once fixed it is reused for every later call on the same normalizer.
#[derive(Debug, Clone)]
pub struct Normalizer {
    schema: Option<EntitySchema>,
    entity_order: Option<Vec<String>>,
}

impl Normalizer {
    pub fn new(registry: SchemaRegistry) -> Self {
        let (schema, entity_order) = registry.into_parts();
        Normalizer {
            schema,
            entity_order,
        }
    }

    pub fn builder() -> NormalizerBuilder {
        NormalizerBuilder::default()
    }

    pub fn schema(&self) -> Option<&EntitySchema> {
        self.schema.as_ref()
    }

    /// The processing order, once set or inferred
    pub fn entity_order(&self) -> Option<&[String]> {
        self.entity_order.as_deref()
    }

    /// Normalize a batch of root records.
    ///
    /// Records are consumed: each one is collapsed in place and then owned by
    /// the returned tables. Returns `Ok(None)` for an empty batch. A root
    /// record without a usable identifier aborts the whole batch.
    pub fn parse(&mut self, records: Vec<Record>) -> Result<Option<NormalizedResult>> {
        if records.is_empty() {
            return Ok(None);
        }

        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| NormalizeError::config("no root entity defined"))?;

        if let Some(explicit) = &self.entity_order {
            validate_entity_order(schema, explicit)?;
        }
        if self.entity_order.is_none() {
            self.entity_order = Some(order::infer_entity_order(schema, &records[0]));
        }
        let entity_order = self.entity_order.clone().unwrap_or_default();

        let mut result = NormalizedResult::with_tables(schema.entity_names());

        for (index, mut record) in records.into_iter().enumerate() {
            let root_id = root_identifier(schema, &record, index)?;

            for name in &entity_order {
                // explicit orders are validated above
                let Some(nested) = schema.nested.get(name) else {
                    continue;
                };
                if let Some((id, extracted)) = extract(&mut record, nested) {
                    result.entities[name.as_str()].insert(id, extracted);
                } else {
                    trace!(record = index, entity = %name, "nested entity not present");
                }
            }

            result.entities[schema.name.as_str()].insert(root_id.clone(), record);
            result.results.push(root_id);
        }

        info!(
            records = result.results.len(),
            stored = result.record_count(),
            "normalized batch"
        );
        Ok(Some(result))
    }

    /// Normalize a batch of JSON values, each of which must be an object
    pub fn parse_values(&mut self, values: Vec<Value>) -> Result<Option<NormalizedResult>> {
        let records = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(record) => Ok(record),
                _ => Err(NormalizeError::NotAnObject { index }),
            })
            .collect::<Result<Vec<_>>>()?;
        self.parse(records)
    }
}

fn root_identifier(schema: &EntitySchema, record: &Record, index: usize) -> Result<Identifier> {
    let value = record
        .get(&schema.id_field)
        .ok_or_else(|| NormalizeError::MissingIdentifier {
            entity: schema.name.clone(),
            field: schema.id_field.clone(),
            index,
        })?;

    Identifier::from_value(value).ok_or_else(|| NormalizeError::InvalidIdentifier {
        entity: schema.name.clone(),
        field: schema.id_field.clone(),
        index,
    })
}

/// Detach the first mapping under `nested.key`, leaving its id in its place
fn extract(record: &mut Record, nested: &NestedEntitySchema) -> Option<(Identifier, Record)> {
    let Lookup::Mapping(found) = search::find(record, &nested.key) else {
        return None;
    };
    let id_value = found.get(&nested.id_field)?.clone();
    let id = Identifier::from_value(&id_value)?;

    match search::replace_first(record, &nested.key, id_value)? {
        Value::Object(extracted) => Some((id, extracted)),
        _ => None,
    }
}

/// Fluent construction of a [`Normalizer`]
#[derive(Debug, Default)]
pub struct NormalizerBuilder {
    registry: SchemaRegistry,
}

impl NormalizerBuilder {
    /// Root entity keyed by `"id"`
    pub fn root(self, name: &str) -> Result<Self> {
        self.root_with_id(name, DEFAULT_ID_FIELD)
    }

    pub fn root_with_id(mut self, name: &str, id_field: &str) -> Result<Self> {
        self.registry.define_root(name, id_field)?;
        Ok(self)
    }

    /// Nested entity found under `key`, keyed by `"id"`
    pub fn nested(self, name: &str, key: &str) -> Result<Self> {
        self.nested_with_id(name, key, DEFAULT_ID_FIELD)
    }

    pub fn nested_with_id(mut self, name: &str, key: &str, id_field: &str) -> Result<Self> {
        self.registry.define_nested(name, key, id_field)?;
        Ok(self)
    }

    /// Explicit deepest-first order; an empty slice leaves it to inference
    pub fn order(mut self, order: &[&str]) -> Self {
        self.registry.set_entity_order(order.iter().copied());
        self
    }

    pub fn build(self) -> Normalizer {
        Normalizer::new(self.registry)
    }
}
