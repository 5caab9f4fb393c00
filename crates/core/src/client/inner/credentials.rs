use std::sync::{Arc, Mutex};

use log::warn;

use crate::callbacks::SecurePersistentStore;

// Secure-store slots holding the analytics session identifiers.
const SID_SLOT: &str = "jp.analytics.sid";
const HSID_SLOT: &str = "jp.analytics.hsid";

/// Names of the analytics cookies carrying the identifiers.
pub const SID_COOKIE: &str = "sid";
pub const HSID_COOKIE: &str = "hsid";

/// The session identifier pair as read from secure storage. Values are
/// opaque to the shells; empty means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    pub sid: Option<String>,
    pub hsid: Option<String>,
}

impl SessionCredentials {
    pub fn is_complete(&self) -> bool {
        self.sid.is_some() && self.hsid.is_some()
    }
}

/// Write-once holder for the session identifiers, backed by the platform's
/// secure store. Writes are serialized so rapid repeated harvests cannot
/// overwrite an identifier that already landed.
pub struct CredentialStore {
    store: Option<Arc<dyn SecurePersistentStore>>,
    write_guard: Mutex<()>,
}

impl CredentialStore {
    pub fn new(store: Option<Arc<dyn SecurePersistentStore>>) -> Self {
        if store.is_none() {
            warn!("No persistent store provided - session credentials will not be persisted");
        }

        Self {
            store,
            write_guard: Mutex::new(()),
        }
    }

    pub fn read(&self) -> SessionCredentials {
        SessionCredentials {
            sid: self.read_slot(SID_SLOT),
            hsid: self.read_slot(HSID_SLOT),
        }
    }

    fn read_slot(&self, slot: &str) -> Option<String> {
        let bytes = self.store.as_ref()?.get(slot.to_owned())?;
        match String::from_utf8(bytes) {
            Ok(value) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                warn!("Discarding undecodable credential in {slot}: {e}");
                None
            }
        }
    }

    /// Persists the sid unless one is already stored. Returns true when the
    /// slot was written.
    pub fn store_sid_once(&self, value: &str) -> bool {
        self.store_once(SID_SLOT, value)
    }

    /// Persists the hsid unless one is already stored.
    pub fn store_hsid_once(&self, value: &str) -> bool {
        self.store_once(HSID_SLOT, value)
    }

    fn store_once(&self, slot: &str, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }

        let Some(store) = &self.store else {
            return false;
        };

        let _guard = self.write_guard.lock().expect("lock poisoned!");
        if self.read_slot(slot).is_some() {
            return false;
        }

        store.set(slot.to_owned(), value.as_bytes().to_vec());
        true
    }
}

#[cfg(test)]
mod test {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;

    #[derive(Default, Debug)]
    struct InMemoryStore(Mutex<HashMap<String, Vec<u8>>>);

    impl SecurePersistentStore for InMemoryStore {
        fn remove_entry(&self, key: String) {
            self.0.lock().unwrap().remove(&key);
        }

        fn get(&self, key: String) -> Option<Vec<u8>> {
            self.0.lock().unwrap().get(&key).cloned()
        }

        fn set(&self, key: String, value: Vec<u8>) {
            self.0.lock().unwrap().insert(key, value);
        }
    }

    #[test]
    fn credentials_survive_a_fresh_store() {
        let backing = Arc::new(InMemoryStore::default());

        let credentials = CredentialStore::new(Some(backing.clone()));
        assert!(credentials.store_sid_once("abc123"));
        assert!(credentials.store_hsid_once("def456"));

        let reopened = CredentialStore::new(Some(backing));
        assert_eq!(
            reopened.read(),
            SessionCredentials {
                sid: Some("abc123".into()),
                hsid: Some("def456".into()),
            }
        );
        assert!(reopened.read().is_complete());
    }

    #[test]
    fn stored_identifiers_are_never_overwritten() {
        let credentials = CredentialStore::new(Some(Arc::new(InMemoryStore::default())));

        assert!(credentials.store_sid_once("first"));
        assert!(!credentials.store_sid_once("second"));
        assert_eq!(credentials.read().sid.as_deref(), Some("first"));
    }

    #[test]
    fn empty_values_are_not_stored() {
        let credentials = CredentialStore::new(Some(Arc::new(InMemoryStore::default())));

        assert!(!credentials.store_sid_once(""));
        assert_eq!(credentials.read().sid, None);
    }

    #[test]
    fn empty_slot_reads_as_absent() {
        let backing = Arc::new(InMemoryStore::default());
        backing.set(SID_SLOT.to_owned(), Vec::new());

        let credentials = CredentialStore::new(Some(backing));
        assert_eq!(credentials.read().sid, None);
        // the empty slot does not count as written
        assert!(credentials.store_sid_once("abc123"));
    }

    #[test]
    fn undecodable_slot_reads_as_absent() {
        let backing = Arc::new(InMemoryStore::default());
        backing.set(SID_SLOT.to_owned(), vec![0xff, 0xfe]);

        let credentials = CredentialStore::new(Some(backing));
        assert_eq!(credentials.read().sid, None);
    }

    #[test]
    fn missing_provider_degrades_quietly() {
        let credentials = CredentialStore::new(None);

        assert!(!credentials.store_sid_once("abc123"));
        assert_eq!(credentials.read(), SessionCredentials::default());
    }
}
