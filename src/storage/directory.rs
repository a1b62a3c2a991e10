use crate::core::{RealmData, RealmError, RealmId, Result, merge_shallow};
use log::debug;
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;

/// Capacity-bounded collection of realm data bags.
///
/// Backed by an `LruCache`: reads through [`RealmDirectory::get`] and every
/// write promote the realm to most-recently-used, and inserting a new realm
/// at capacity evicts the least-recently-used one.
#[derive(Debug)]
pub struct RealmDirectory {
    realms: LruCache<RealmId, RealmData>,
    evictions: u64,
}

/// Outcome of a merge into the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The realm did not exist before this write
    pub created: bool,
    /// Realm pushed out to make room for the write
    pub evicted: Option<RealmId>,
}

impl RealmDirectory {
    pub fn new(max_realms: usize) -> Result<Self> {
        let capacity =
            NonZeroUsize::new(max_realms).ok_or(RealmError::CapacityMisconfiguration(max_realms))?;
        Ok(Self {
            realms: LruCache::new(capacity),
            evictions: 0,
        })
    }

    /// Shallow-merge `patch` into the realm's bag, creating the bag if absent.
    pub fn merge(&mut self, realm: &RealmId, patch: RealmData) -> MergeOutcome {
        if let Some(data) = self.realms.get_mut(realm) {
            merge_shallow(data, patch);
            return MergeOutcome {
                created: false,
                evicted: None,
            };
        }

        let evicted = self.realms.push(realm.clone(), patch).map(|(id, _)| id);
        if let Some(id) = &evicted {
            self.evictions += 1;
            debug!("Realm '{}' evicted to make room for '{}'", id, realm);
        }

        MergeOutcome {
            created: true,
            evicted,
        }
    }

    /// Read a realm's bag, promoting it.
    pub fn get(&mut self, realm: &RealmId) -> Option<&RealmData> {
        self.realms.get(realm)
    }

    /// Read a realm's bag without touching the recency order.
    pub fn peek(&self, realm: &RealmId) -> Option<&RealmData> {
        self.realms.peek(realm)
    }

    /// Read one field of a realm, promoting the realm.
    pub fn get_field(&mut self, realm: &RealmId, key: &str) -> Option<&Value> {
        self.realms.get(realm).and_then(|data| data.get(key))
    }

    pub fn contains(&self, realm: &RealmId) -> bool {
        self.realms.contains(realm)
    }

    pub fn remove(&mut self, realm: &RealmId) -> Option<RealmData> {
        self.realms.pop(realm)
    }

    pub fn clear(&mut self) {
        self.realms.clear();
    }

    pub fn len(&self) -> usize {
        self.realms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realms.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.realms.cap().get()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Realm ids from most- to least-recently-used.
    pub fn realm_ids(&self) -> Vec<RealmId> {
        self.realms.iter().map(|(id, _)| id.clone()).collect()
    }
}
