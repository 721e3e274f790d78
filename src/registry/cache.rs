//! Keyed instance cache with per-key materialization gates.
//!
//! Reads take a shared lock and clone an `Arc`; writes never overwrite an
//! existing entry. Gates are async mutexes handed out per key so concurrent
//! misses on one key materialize once while misses on different keys run in
//! parallel. No lock in this module is held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::key::{ServiceKey, ServiceKind};
use crate::traits::AnyService;

type Gate = Arc<tokio::sync::Mutex<()>>;

/// A claim on one key's gate. Dropping it releases the gate, including when
/// the materializing future is cancelled.
pub(crate) struct GateLease<'a> {
    cache: &'a InstanceCache,
    key: ServiceKey,
    gate: Gate,
}

impl GateLease<'_> {
    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}

impl Drop for GateLease<'_> {
    fn drop(&mut self) {
        self.cache.release_gate(&self.key, &self.gate);
    }
}

#[derive(Default)]
pub(crate) struct InstanceCache {
    entries: RwLock<HashMap<ServiceKey, AnyService>>,
    gates: Mutex<HashMap<ServiceKey, Gate>>,
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<AnyService> {
        self.entries.read().get(key).cloned()
    }

    /// Inserts only if the key is free. Returns false on collision.
    pub(crate) fn try_insert(&self, key: ServiceKey, value: AnyService) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, value);
        true
    }

    /// First writer wins; the returned value is whatever ends up cached.
    pub(crate) fn get_or_insert(&self, key: ServiceKey, value: AnyService) -> AnyService {
        self.entries.write().entry(key).or_insert(value).clone()
    }

    pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub(crate) fn contains_kind(&self, kind: ServiceKind) -> bool {
        self.entries.read().keys().any(|key| key.kind() == kind)
    }

    pub(crate) fn remove(&self, key: &ServiceKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub(crate) fn remove_kind(&self, kind: ServiceKind) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| key.kind() != kind);
        before - entries.len()
    }

    pub(crate) fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn instance_names(&self, kind: ServiceKind) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .keys()
            .filter(|key| key.kind() == kind)
            .map(|key| key.instance().to_string())
            .collect();
        names.sort();
        names
    }

    /// Leases the gate for `key`, creating it on first use.
    pub(crate) fn lease_gate(&self, key: &ServiceKey) -> GateLease<'_> {
        let gate = Arc::clone(self.gates.lock().entry(key.clone()).or_default());
        GateLease {
            cache: self,
            key: key.clone(),
            gate,
        }
    }

    /// Drops the gate once no other lease holds it.
    ///
    /// Clones only happen under the `gates` lock, so a count of two (the map
    /// and `gate`) means nobody else is queued on it.
    fn release_gate(&self, key: &ServiceKey, gate: &Gate) {
        let mut gates = self.gates.lock();
        let idle = gates
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, gate) && Arc::strong_count(gate) == 2);
        if idle {
            gates.remove(key);
        }
    }

    #[cfg(test)]
    pub(crate) fn gate_count(&self) -> usize {
        self.gates.lock().len()
    }
}
