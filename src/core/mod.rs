pub mod error;
pub mod types;
pub mod value;

pub use error::{RealmError, Result};
pub use types::{FlushTicket, RealmData, RealmId, patch_from};
pub use value::{is_truthy, merge_shallow};
