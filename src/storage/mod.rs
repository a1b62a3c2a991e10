pub mod directory;

pub use directory::{MergeOutcome, RealmDirectory};
