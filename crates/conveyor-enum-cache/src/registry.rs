use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::Cache;

static REGISTRY: Lazy<Mutex<HashMap<String, Arc<Cache>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the process-wide cache partition for `cache_id`, creating it on
/// first use. Construct once per repository and pass the handle down by
/// reference — this is an explicit singleton with a lifecycle, not ambient
/// global mutable state.
pub fn init(cache_id: &str) -> Arc<Cache> {
    let mut registry = REGISTRY.lock().expect("enum cache registry lock poisoned");
    registry
        .entry(cache_id.to_string())
        .or_insert_with(|| Arc::new(Cache::new()))
        .clone()
}

/// Drops the cache partition for `cache_id`. Intended for test teardown;
/// production callers normally keep a partition alive for the process
/// lifetime.
pub fn teardown(cache_id: &str) {
    REGISTRY
        .lock()
        .expect("enum cache registry lock poisoned")
        .remove(cache_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_per_cache_id() {
        let a = init("test-cache-a");
        let b = init("test-cache-a");
        assert!(Arc::ptr_eq(&a, &b));
        teardown("test-cache-a");
    }

    #[test]
    fn distinct_cache_ids_are_isolated() {
        let a = init("test-cache-b1");
        let b = init("test-cache-b2");
        assert!(!Arc::ptr_eq(&a, &b));
        teardown("test-cache-b1");
        teardown("test-cache-b2");
    }
}
