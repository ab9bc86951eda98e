//! Merge user settings over defaults.
use serde_json::{Map, Value};

/// Trait for the merge operation.
pub trait Merge {
    /// Apply overrides from `from`
    fn merge(&mut self, from: &Self);
}

/// Object values are merged key by key one level deep, anything
/// else in `from` replaces the existing value.
impl Merge for Map<String, Value> {
    fn merge(&mut self, from: &Self) {
        for (key, value) in from.iter() {
            match (self.get_mut(key), value) {
                (Some(Value::Object(existing)), Value::Object(overrides)) => {
                    for (k, v) in overrides.iter() {
                        existing.insert(k.clone(), v.clone());
                    }
                }
                _ => {
                    self.insert(key.clone(), value.clone());
                }
            }
        }
    }
}
