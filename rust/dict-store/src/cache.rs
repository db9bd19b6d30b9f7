//! Bounded two-way caches for ID↔value and namespace↔ID.
//!
//! Backed by `sieve-cache`'s thread-safe `SyncSieveCache`, which already
//! carries its own internal lock -- matching the wrap-a-`SieveCache`
//! pattern the dictionary's own caching layer is grounded on, minus the
//! extra `Mutex` that pattern needed only because it used the
//! non-thread-safe variant.

use dict_values::{Value, ValueId};
use sieve_cache::SyncSieveCache;

use crate::config::DictionaryConfig;

pub(crate) struct ValueCache {
    id_to_value: SyncSieveCache<ValueId, Value>,
    value_to_id: SyncSieveCache<Value, ValueId>,
    namespace_to_id: SyncSieveCache<String, ValueId>,
    id_to_namespace: SyncSieveCache<ValueId, String>,
}

impl ValueCache {
    pub(crate) fn new(config: &DictionaryConfig) -> Self {
        Self {
            id_to_value: SyncSieveCache::new(config.id_to_value_capacity.max(1))
                .expect("nonzero capacity"),
            value_to_id: SyncSieveCache::new(config.value_to_id_capacity.max(1))
                .expect("nonzero capacity"),
            namespace_to_id: SyncSieveCache::new(config.namespace_to_id_capacity.max(1))
                .expect("nonzero capacity"),
            id_to_namespace: SyncSieveCache::new(config.id_to_namespace_capacity.max(1))
                .expect("nonzero capacity"),
        }
    }

    pub(crate) fn get_value(&self, id: ValueId) -> Option<Value> {
        self.id_to_value.get(&id)
    }

    pub(crate) fn put_value(&self, id: ValueId, value: Value) {
        self.id_to_value.insert(id, value);
    }

    pub(crate) fn get_id(&self, value: &Value) -> Option<ValueId> {
        self.value_to_id.get(value)
    }

    pub(crate) fn put_id(&self, value: Value, id: ValueId) {
        self.value_to_id.insert(value, id);
    }

    pub(crate) fn get_namespace(&self, id: ValueId) -> Option<String> {
        self.id_to_namespace.get(&id)
    }

    pub(crate) fn put_namespace(&self, id: ValueId, namespace: String) {
        self.id_to_namespace.insert(id, namespace);
    }

    pub(crate) fn get_namespace_id(&self, namespace: &str) -> Option<ValueId> {
        self.namespace_to_id.get(namespace)
    }

    pub(crate) fn put_namespace_id(&self, namespace: String, id: ValueId) {
        self.namespace_to_id.insert(namespace, id);
    }

    /// Empty every cache. Called before re-opening the store in `clear()`.
    pub(crate) fn clear(&self) {
        self.id_to_value.clear();
        self.value_to_id.clear();
        self.namespace_to_id.clear();
        self.id_to_namespace.clear();
    }
}
