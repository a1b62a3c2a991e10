use crate::core::{RealmError, Result};
use serde_json::Value;
use tokio::sync::watch;

/// Handle to a derived field.
///
/// Cheap to clone; every clone observes the same field.
#[derive(Debug, Clone)]
pub struct Computed {
    key: String,
    rx: watch::Receiver<Value>,
}

impl Computed {
    pub(crate) fn new(key: impl Into<String>, rx: watch::Receiver<Value>) -> Self {
        Self {
            key: key.into(),
            rx,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value of the field.
    pub fn get(&self) -> Value {
        self.rx.borrow().clone()
    }

    /// Current value, marking it as seen for [`Computed::has_changed`].
    pub fn latest(&mut self) -> Value {
        self.rx.borrow_and_update().clone()
    }

    /// Whether the value changed since this handle last looked at it.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait until the value changes.
    pub async fn changed(&mut self) -> Result<()> {
        self.rx.changed().await.map_err(|_| RealmError::StoreClosed)
    }
}
