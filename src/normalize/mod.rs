//! Record normalization - hoist nested entities into per-entity tables
//!
//! Each root record is walked once per nested entity type, deepest type
//! first. The first nested record found under the entity's key is moved into
//! that entity's table and replaced by its identifier, so a container entity
//! extracted later already holds identifiers instead of its own children.
//!
//! Only objects are searched; entities inside arrays are left untouched.

pub mod engine;
pub mod order;
pub mod search;
pub mod writer;

pub use engine::{Normalizer, NormalizerBuilder};
pub use order::infer_entity_order;
pub use search::Lookup;
pub use writer::TableWriter;
