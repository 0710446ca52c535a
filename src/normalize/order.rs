//! Deepest-first processing order for nested entity types

use crate::normalize::search;
use crate::schema::EntitySchema;
use crate::types::Record;
use tracing::{debug, warn};

/// Infer the processing order from a sample record.
///
/// Each nested entity is ranked by the depth at which its key is first found;
/// deeper entities come first and ties keep registration order. Entities whose
/// key does not appear in the sample are left out of the order entirely rather
/// than ranked last, so they are never extracted by a normalizer that inferred
/// its order from this sample. Set an explicit order when the first record may
/// lack some nested keys.
pub fn infer_entity_order(schema: &EntitySchema, sample: &Record) -> Vec<String> {
    let mut ranked: Vec<(usize, &str)> = Vec::with_capacity(schema.nested.len());

    for (name, nested) in &schema.nested {
        match search::key_depth(sample, &nested.key) {
            Some(depth) => ranked.push((depth, name.as_str())),
            None => warn!(
                entity = %name,
                key = %nested.key,
                "nested key not found in first record; entity will not be extracted"
            ),
        }
    }

    // stable: equal depths stay in registration order
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let order: Vec<String> = ranked.into_iter().map(|(_, name)| name.to_string()).collect();
    debug!(order = ?order, "inferred entity order");
    order
}
