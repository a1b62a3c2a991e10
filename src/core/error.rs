use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RealmError {
    #[error("No current realm set for '{operation}'")]
    UnsetRealm { operation: &'static str },

    #[error("Realm capacity must be > 0, got {0}")]
    CapacityMisconfiguration(usize),

    #[error("Field '{0}' is derived and cannot be set")]
    ReadOnlyField(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Frame driver error: {0}")]
    Driver(String),

    #[error("Store dropped")]
    StoreClosed,
}

pub type Result<T> = std::result::Result<T, RealmError>;

impl RealmError {
    pub(crate) fn unset(operation: &'static str) -> Self {
        Self::UnsetRealm { operation }
    }
}
