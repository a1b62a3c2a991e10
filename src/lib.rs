// ============================================================================
// RealmStore Library
// ============================================================================

//! Key-value store partitioned into realms.
//!
//! Each realm holds its own data bag. The set of realms is bounded by an LRU
//! policy, and writes to a field of a realm can be deferred, coalesced and
//! applied as a single batch at the next frame.

pub mod batch;
pub mod config;
pub mod core;
pub mod facade;
pub mod observable;
pub mod scheduler;
pub mod storage;

// Re-export main types for convenience
pub use config::{FlushSource, RESERVED_FIELDS, RealmStoreConfig};
pub use core::{FlushTicket, RealmData, RealmError, RealmId, Result, patch_from};
pub use facade::{FlushReport, RealmState, RealmStore, RealmStoreStats};
pub use observable::Computed;
pub use scheduler::{DEFAULT_FRAME_INTERVAL, FrameDriver, SharedRealmStore, spawn_frame_driver};
