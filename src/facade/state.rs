use crate::core::{RealmData, RealmId};
use crate::observable::ObservableState;
use crate::storage::RealmDirectory;
use serde_json::Value;

/// Snapshot published to subscribers after every mutation.
#[derive(Debug)]
pub struct RealmState {
    pub(crate) realms: RealmDirectory,
    pub(crate) current_realm: Option<RealmId>,
    pub(crate) fields: RealmData,
    pub(crate) version: u64,
}

impl RealmState {
    pub(crate) fn new(realms: RealmDirectory, fields: RealmData) -> Self {
        Self {
            realms,
            current_realm: None,
            fields,
            version: 0,
        }
    }

    pub fn realms(&self) -> &RealmDirectory {
        &self.realms
    }

    pub fn current_realm(&self) -> Option<&RealmId> {
        self.current_realm.as_ref()
    }

    /// Data bag of the current realm, without promoting it.
    pub fn current_data(&self) -> Option<&RealmData> {
        self.current_realm
            .as_ref()
            .and_then(|realm| self.realms.peek(realm))
    }

    /// Top-level field, including derived fields.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &RealmData {
        &self.fields
    }

    /// Incremented once per publication.
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl ObservableState for RealmState {
    fn store_derived(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    fn advance_version(&mut self) {
        self.version += 1;
    }
}
