//! Entity schemas
//!
//! The registry describes the single root entity, the nested entity types
//! hoisted out of it, and an optional explicit processing order.

pub mod config;
pub mod registry;

pub use config::{NestedConfig, RootConfig, SchemaConfig};
pub use registry::{EntitySchema, NestedEntitySchema, SchemaRegistry, DEFAULT_ID_FIELD};
