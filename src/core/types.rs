use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Per-realm data bag: field key to arbitrary value.
pub type RealmData = Map<String, Value>;

/// Opaque identifier of a realm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RealmId(String);

impl RealmId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RealmId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RealmId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for RealmId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifies one pending batch: the realm current when the first
/// contribution was enqueued, and the field being batched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlushTicket {
    pub realm: RealmId,
    pub key: String,
}

impl FlushTicket {
    pub fn new(realm: RealmId, key: impl Into<String>) -> Self {
        Self {
            realm,
            key: key.into(),
        }
    }
}

impl fmt::Display for FlushTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.realm, self.key)
    }
}

/// Converts a `json!({...})` literal or any other value into a patch.
/// Non-object values yield an empty patch.
pub fn patch_from(value: Value) -> RealmData {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
