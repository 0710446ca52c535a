//! First-match field search over nested records
//!
//! Every search walks a record the same way: fields are visited in insertion
//! order, a field named `key` matches immediately, and the first field holding
//! an object is descended into *and its result returned*. A match in a later
//! sibling of that object is never seen. Arrays are not traversed.
//!
//! Lookup, depth measurement and substitution all share this walk, so the
//! location measured or found is always the location that gets replaced.

use crate::types::Record;
use serde_json::Value;

/// Outcome of looking a key up in a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// No field with this name was reached
    Absent,
    /// The field holds an object
    Mapping(&'a Record),
    /// The field holds a scalar or an array
    Leaf(&'a Value),
}

impl<'a> Lookup<'a> {
    pub fn as_mapping(&self) -> Option<&'a Record> {
        match *self {
            Lookup::Mapping(record) => Some(record),
            Lookup::Absent | Lookup::Leaf(_) => None,
        }
    }
}

fn locate<'a>(record: &'a Record, key: &str, depth: usize) -> Option<(usize, &'a Value)> {
    for (name, value) in record.iter() {
        if name == key {
            return Some((depth, value));
        }
        if let Value::Object(child) = value {
            return locate(child, key, depth + 1);
        }
    }
    None
}

/// Find the first field named `key`
pub fn find<'a>(record: &'a Record, key: &str) -> Lookup<'a> {
    match locate(record, key, 1) {
        None => Lookup::Absent,
        Some((_, Value::Object(child))) => Lookup::Mapping(child),
        Some((_, value)) => Lookup::Leaf(value),
    }
}

/// Nesting depth of the first field named `key`; the record itself is depth 1
pub fn key_depth(record: &Record, key: &str) -> Option<usize> {
    locate(record, key, 1).map(|(depth, _)| depth)
}

/// Mutable access to the first field named `key`
pub fn find_mut<'a>(record: &'a mut Record, key: &str) -> Option<&'a mut Value> {
    for (name, value) in record.iter_mut() {
        if name == key {
            return Some(value);
        }
        if let Value::Object(child) = value {
            return find_mut(child, key);
        }
    }
    None
}

/// Replace the first field named `key`, returning the value it held
pub fn replace_first(record: &mut Record, key: &str, value: Value) -> Option<Value> {
    find_mut(record, key).map(|slot| std::mem::replace(slot, value))
}
