use crate::core::{RealmData, RealmError, Result};
use crate::scheduler::DEFAULT_FRAME_INTERVAL;
use serde_json::Value;
use std::time::Duration;

/// Top-level field names owned by the store itself.
pub const RESERVED_FIELDS: [&str; 2] = ["realms", "currentRealm"];

/// Where a batch flush takes the bag it applies pending sub-fields onto.
///
/// The flush always writes into the realm that was current when the first
/// contribution was enqueued; this only selects the starting bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushSource {
    /// The value the store exposes under the top-level field `key` at flush
    /// time, normally the derived field registered by
    /// [`RealmStore::compute_for_realm`](crate::RealmStore::compute_for_realm).
    /// That value follows the realm current at flush time, so switching realms
    /// between enqueue and flush carries the new realm's bag into the old one.
    /// When the field is missing or not an object, the enqueue realm's stored
    /// bag is used instead. The exposed value is copied, so neither the current
    /// realm's bag nor an object default given to `compute_for_realm` is
    /// modified by the flush.
    #[default]
    Exposed,

    /// The bag stored at `key` in the realm the batch was enqueued for.
    EnqueueRealm,
}

/// Realm store configuration
#[derive(Debug, Clone)]
pub struct RealmStoreConfig {
    /// Maximum number of realms kept before LRU eviction
    pub max_realms: usize,

    /// Base bag selection for batch flushes
    pub flush_source: FlushSource,

    /// Interval used by the background frame driver
    pub frame_interval: Duration,

    /// Top-level fields present from the start
    pub initial_state: RealmData,
}

impl RealmStoreConfig {
    pub fn new(max_realms: usize) -> Self {
        Self {
            max_realms,
            flush_source: FlushSource::default(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            initial_state: RealmData::new(),
        }
    }

    /// Set the flush source policy
    pub fn flush_source(mut self, source: FlushSource) -> Self {
        self.flush_source = source;
        self
    }

    /// Set the frame driver interval
    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Set the initial top-level state
    pub fn initial_state(mut self, state: RealmData) -> Self {
        self.initial_state = state;
        self
    }

    /// Add a single initial top-level field
    pub fn initial_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.initial_state.insert(key.into(), value);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_realms == 0 {
            return Err(RealmError::CapacityMisconfiguration(self.max_realms));
        }

        if self.frame_interval.is_zero() {
            return Err(RealmError::InvalidConfig(
                "frame_interval must be > 0".to_string(),
            ));
        }

        for reserved in RESERVED_FIELDS {
            if self.initial_state.contains_key(reserved) {
                return Err(RealmError::InvalidConfig(format!(
                    "initial_state cannot define reserved field '{}'",
                    reserved
                )));
            }
        }

        Ok(())
    }
}
