mod state;
mod store;

pub use state::RealmState;
pub use store::{FlushReport, RealmStore, RealmStoreStats};
