//! Pending batch buffer.
//!
//! Sub-field contributions accumulate here per (realm, key) until the flush
//! for that pair takes them. The realm is the one current when the first
//! contribution arrived, never the one current at flush time.

use crate::core::{FlushTicket, RealmData, RealmId};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PendingBatches {
    batches: HashMap<RealmId, HashMap<String, RealmData>>,
}

impl PendingBatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under (realm, key, sub_key). A later value for the same
    /// sub_key replaces the earlier one.
    ///
    /// Returns `true` when this is the first contribution for (realm, key)
    /// since its last flush, i.e. when a flush needs to be scheduled.
    pub fn enqueue(
        &mut self,
        realm: &RealmId,
        key: &str,
        sub_key: impl Into<String>,
        value: Value,
    ) -> bool {
        let realm_batches = self.batches.entry(realm.clone()).or_default();
        let first = !realm_batches.contains_key(key);
        realm_batches
            .entry(key.to_string())
            .or_default()
            .insert(sub_key.into(), value);
        first
    }

    /// Remove and return the contributions for the ticket's pair.
    ///
    /// `None` when nothing is pending, e.g. the pair was already flushed.
    pub fn take(&mut self, ticket: &FlushTicket) -> Option<RealmData> {
        let realm_batches = self.batches.get_mut(&ticket.realm)?;
        let batch = realm_batches.remove(&ticket.key);
        if realm_batches.is_empty() {
            self.batches.remove(&ticket.realm);
        }
        batch.filter(|b| !b.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self, realm: &RealmId, key: &str) -> bool {
        self.batches
            .get(realm)
            .is_some_and(|realm_batches| realm_batches.contains_key(key))
    }

    #[cfg(test)]
    pub(crate) fn peek(&self, realm: &RealmId, key: &str) -> Option<&RealmData> {
        self.batches.get(realm)?.get(key)
    }

    /// Number of (realm, key) pairs waiting for a flush.
    pub fn pending_pairs(&self) -> usize {
        self.batches.values().map(HashMap::len).sum()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
