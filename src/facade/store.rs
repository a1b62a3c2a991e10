use super::state::RealmState;
use crate::batch::PendingBatches;
use crate::config::{FlushSource, RESERVED_FIELDS, RealmStoreConfig};
use crate::core::value::type_name;
use crate::core::{FlushTicket, RealmData, RealmError, RealmId, Result, is_truthy, merge_shallow};
use crate::observable::{Computed, Observable};
use crate::scheduler::FrameQueue;
use crate::storage::{MergeOutcome, RealmDirectory};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tokio::sync::watch;
use tracing::{Level, event, info_span};

/// Key-value store partitioned into LRU-bounded realms.
///
/// Realm-scoped operations target the current realm set with
/// [`RealmStore::set_current_realm`]. Batched sub-field updates are held until
/// the next [`RealmStore::flush_frame`] and then applied as one write per
/// (realm, key).
///
/// # Examples
///
/// ```
/// use realmstore::RealmStore;
/// use serde_json::json;
///
/// # fn main() -> realmstore::Result<()> {
/// let mut store = RealmStore::new(10)?;
/// store.set_current_realm("home");
///
/// let prefs = store.compute_for_realm("prefs", json!({}));
/// store.batch_update_for_realm("prefs", "theme", json!("dark"))?;
/// store.batch_update_for_realm("prefs", "font", json!(14))?;
/// store.flush_frame();
///
/// assert_eq!(prefs.get(), json!({"theme": "dark", "font": 14}));
/// # Ok(())
/// # }
/// ```
pub struct RealmStore {
    state: Observable<RealmState>,
    batches: PendingBatches,
    frames: FrameQueue,
    config: RealmStoreConfig,
    directory_writes: u64,
    realms_created: u64,
    flushes_applied: u64,
    flushes_skipped: u64,
}

/// Result of one frame flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    pub frame: u64,
    /// Batches written to the directory
    pub applied: usize,
    /// Tickets that found nothing pending
    pub skipped: usize,
    /// State publications made while flushing
    pub publications: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmStoreStats {
    pub realms: usize,
    pub max_realms: usize,
    pub evictions: u64,
    pub realms_created: u64,
    pub directory_writes: u64,
    pub publications: u64,
    pub pending_batches: usize,
    pub scheduled_flushes: usize,
    pub frames: u64,
    pub flushes_applied: u64,
    pub flushes_skipped: u64,
}

impl fmt::Display for RealmStoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Realm Stats: {}/{} realms, {} evicted, {} writes, {} publications, {} pending batches",
            self.realms,
            self.max_realms,
            self.evictions,
            self.directory_writes,
            self.publications,
            self.pending_batches
        )
    }
}

impl RealmStore {
    /// Create a store keeping at most `max_realms` realms.
    pub fn new(max_realms: usize) -> Result<Self> {
        Self::with_config(RealmStoreConfig::new(max_realms))
    }

    pub fn with_config(config: RealmStoreConfig) -> Result<Self> {
        config.validate()?;
        let realms = RealmDirectory::new(config.max_realms)?;
        let state = RealmState::new(realms, config.initial_state.clone());

        Ok(Self {
            state: Observable::new(state),
            batches: PendingBatches::new(),
            frames: FrameQueue::new(),
            config,
            directory_writes: 0,
            realms_created: 0,
            flushes_applied: 0,
            flushes_skipped: 0,
        })
    }

    pub fn config(&self) -> &RealmStoreConfig {
        &self.config
    }

    /// Read the published state. Drop the guard before mutating the store.
    pub fn get(&self) -> watch::Ref<'_, RealmState> {
        self.state.get()
    }

    /// Receiver notified after every publication.
    pub fn subscribe(&self) -> watch::Receiver<RealmState> {
        self.state.subscribe()
    }

    pub fn current_realm(&self) -> Option<RealmId> {
        self.state.get().current_realm.clone()
    }

    /// Top-level field, including derived fields.
    pub fn get_field(&self, key: &str) -> Option<Value> {
        self.state.get().fields.get(key).cloned()
    }

    /// Merge top-level fields into the state.
    ///
    /// Fails with [`RealmError::ReadOnlyField`] if any key belongs to a derived
    /// field or is one of [`RESERVED_FIELDS`]; nothing is written in that case.
    pub fn set(&mut self, patch: RealmData) -> Result<()> {
        if let Some(key) = patch
            .keys()
            .find(|key| RESERVED_FIELDS.contains(&key.as_str()) || self.state.is_derived(key))
        {
            return Err(RealmError::ReadOnlyField(key.clone()));
        }

        self.state.update(|state| {
            let changed = patch
                .iter()
                .any(|(key, value)| state.fields.get(key) != Some(value));
            merge_shallow(&mut state.fields, patch);
            changed
        });
        Ok(())
    }

    /// Make `realm` the target of realm-scoped operations.
    ///
    /// The realm need not exist yet; it is created by the first write.
    pub fn set_current_realm(&mut self, realm: impl Into<RealmId>) {
        let realm = realm.into();
        self.state.update(move |state| {
            if state.current_realm.as_ref() == Some(&realm) {
                return false;
            }
            debug!("Current realm set to '{}'", realm);
            state.current_realm = Some(realm);
            true
        });
    }

    /// Shallow-merge `patch` into the current realm's data.
    pub fn set_for_realm(&mut self, patch: RealmData) -> Result<()> {
        let realm = self.require_current("set_for_realm")?;
        self.set_for(realm, patch);
        Ok(())
    }

    /// Shallow-merge `patch` into `realm`'s data, regardless of the current realm.
    pub fn set_for(&mut self, realm: impl Into<RealmId>, patch: RealmData) {
        let realm = realm.into();
        let mut outcome = None;
        self.state.update(|state| {
            outcome = Some(state.realms.merge(&realm, patch));
            true
        });
        self.record_write(outcome);
    }

    /// Derived top-level field `key`: the current realm's value at `key`, or
    /// `default` when the realm, the key, or a truthy value is missing.
    ///
    /// Falsy stored values (`null`, `false`, `0`, `""`) read as `default`.
    /// Calling this again for the same key returns the existing field and
    /// ignores the new default.
    pub fn compute_for_realm(&mut self, key: &str, default: Value) -> Computed {
        let field = key.to_string();
        let rx = self.state.compute(key, move |state: &mut RealmState| {
            let RealmState {
                realms,
                current_realm,
                ..
            } = state;
            current_realm
                .as_ref()
                .and_then(|realm| realms.get_field(realm, &field))
                .filter(|value| is_truthy(value))
                .cloned()
                .unwrap_or_else(|| default.clone())
        });
        Computed::new(key, rx)
    }

    /// Read `key` from the current realm's data, promoting the realm.
    pub fn get_for_realm(&mut self, key: &str) -> Option<Value> {
        let mut found = None;
        self.state.update(|state| {
            let RealmState {
                realms,
                current_realm,
                ..
            } = state;
            found = current_realm
                .as_ref()
                .and_then(|realm| realms.get_field(realm, key))
                .cloned();
            false
        });
        found
    }

    /// Whether `realm` is held, without promoting it.
    pub fn contains_realm(&self, realm: &RealmId) -> bool {
        self.state.get().realms.contains(realm)
    }

    pub fn realm_count(&self) -> usize {
        self.state.get().realms.len()
    }

    /// Drop a realm's data. Batches already pending for it still flush and
    /// recreate it.
    pub fn remove_realm(&mut self, realm: &RealmId) -> Option<RealmData> {
        let mut removed = None;
        self.state.update(|state| {
            removed = state.realms.remove(realm);
            removed.is_some()
        });
        removed
    }

    /// Queue `value` for `sub_key` of the current realm's field `key`.
    ///
    /// Contributions for the same (realm, key) are coalesced and written once
    /// at the next frame. The realm is bound now, at enqueue time.
    pub fn batch_update_for_realm(
        &mut self,
        key: &str,
        sub_key: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        let realm = self.require_current("batch_update_for_realm")?;
        if self.batches.enqueue(&realm, key, sub_key, value) {
            debug!("Batch flush scheduled for '{}/{}'", realm, key);
            self.frames.request(FlushTicket::new(realm, key));
        }
        Ok(())
    }

    /// Run one frame: flush every batch scheduled before this call.
    pub fn flush_frame(&mut self) -> FlushReport {
        let tickets = self.frames.take_frame();
        let publications_before = self.state.publications();
        let mut report = FlushReport {
            frame: self.frames.frames(),
            ..FlushReport::default()
        };

        for ticket in &tickets {
            if self.flush_ticket(ticket) {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }
        report.publications = self.state.publications() - publications_before;
        report
    }

    /// Apply the pending batch for (realm, key) now instead of at the next
    /// frame. The frame's own ticket then finds nothing and is skipped.
    pub fn flush_batch(&mut self, realm: impl Into<RealmId>, key: &str) -> bool {
        self.flush_ticket(&FlushTicket::new(realm.into(), key))
    }

    /// Number of (realm, key) pairs with pending contributions.
    pub fn pending_batches(&self) -> usize {
        self.batches.pending_pairs()
    }

    pub fn stats(&self) -> RealmStoreStats {
        let state = self.state.get();
        RealmStoreStats {
            realms: state.realms.len(),
            max_realms: state.realms.capacity(),
            evictions: state.realms.evictions(),
            realms_created: self.realms_created,
            directory_writes: self.directory_writes,
            publications: self.state.publications(),
            pending_batches: self.batches.pending_pairs(),
            scheduled_flushes: self.frames.len(),
            frames: self.frames.frames(),
            flushes_applied: self.flushes_applied,
            flushes_skipped: self.flushes_skipped,
        }
    }

    fn require_current(&self, operation: &'static str) -> Result<RealmId> {
        self.state
            .get()
            .current_realm
            .clone()
            .ok_or(RealmError::unset(operation))
    }

    fn record_write(&mut self, outcome: Option<MergeOutcome>) {
        let Some(outcome) = outcome else {
            return;
        };
        self.directory_writes += 1;
        if outcome.created {
            self.realms_created += 1;
        }
        if let Some(evicted) = outcome.evicted {
            event!(Level::DEBUG, realm = %evicted, "realm evicted");
        }
    }

    fn flush_ticket(&mut self, ticket: &FlushTicket) -> bool {
        let Some(pending) = self.batches.take(ticket) else {
            self.flushes_skipped += 1;
            event!(Level::TRACE, ticket = %ticket, "nothing pending");
            return false;
        };

        let span = info_span!(
            "realm.batch.flush",
            realm = %ticket.realm,
            key = %ticket.key,
            entries = pending.len()
        );
        let _enter = span.enter();

        let source = self.config.flush_source;
        let mut outcome = None;
        self.state.update(|state| {
            let mut bag = batch_base(state, ticket, source);
            merge_shallow(&mut bag, pending);

            let mut patch = Map::new();
            patch.insert(ticket.key.clone(), Value::Object(bag));
            outcome = Some(state.realms.merge(&ticket.realm, patch));
            true
        });
        self.record_write(outcome);
        self.flushes_applied += 1;
        event!(Level::DEBUG, "batch applied");
        true
    }
}

/// Bag a flush applies its pending sub-fields onto.
///
/// Under [`FlushSource::Exposed`] the exposed top-level field comes first; when
/// it is missing or not an object the enqueue realm's stored bag is used, so
/// sub-fields already stored there survive the flush.
fn batch_base(state: &RealmState, ticket: &FlushTicket, source: FlushSource) -> RealmData {
    let exposed = match source {
        FlushSource::Exposed => state.fields.get(&ticket.key),
        FlushSource::EnqueueRealm => None,
    };
    let stored = state
        .realms
        .peek(&ticket.realm)
        .and_then(|data| data.get(&ticket.key));

    for candidate in [exposed, stored].into_iter().flatten() {
        match candidate {
            Value::Object(bag) => return bag.clone(),
            Value::Null => {}
            other => warn!(
                "Batch source for '{}' holds a {}, not an object; skipping it",
                ticket,
                type_name(other)
            ),
        }
    }
    Map::new()
}
