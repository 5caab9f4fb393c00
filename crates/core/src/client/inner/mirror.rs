use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use log::warn;

use crate::callbacks::SecurePersistentStore;

// Secure-store slot holding the mirrored entries as a JSON object.
const MIRROR_SLOT: &str = "jp.localstorage";

/// The page-side localStorage keys the shell is willing to mirror. Order
/// here fixes the order of the pre-load restore script.
pub const MIRROR_ALLOWED_KEYS: [&str; 2] =
    ["jelposkupiloFavoritesId", "jelposkupiloFavoritesNygma"];

/// Native copy of the allow-listed localStorage entries, kept so the page
/// finds its data again after the web view's own storage is wiped.
pub struct LocalStorageMirror {
    store: Option<Arc<dyn SecurePersistentStore>>,
    entries: Mutex<HashMap<String, String>>,
}

impl LocalStorageMirror {
    pub fn new(store: Option<Arc<dyn SecurePersistentStore>>) -> Self {
        let entries = store
            .as_deref()
            .and_then(|store| store.get(MIRROR_SLOT.to_owned()))
            .map(|bytes| decode_entries(&bytes))
            .unwrap_or_default();

        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    pub fn key_allowed(key: &str) -> bool {
        MIRROR_ALLOWED_KEYS.contains(&key)
    }

    /// Applies a change reported by the page. `None` deletes the entry.
    /// Returns false without touching anything when the key is not
    /// allow-listed.
    pub fn apply_change(&self, key: &str, value: Option<String>) -> bool {
        if !Self::key_allowed(key) {
            return false;
        }

        let mut entries = self.entries.lock().expect("lock poisoned!");
        match value {
            Some(value) => {
                entries.insert(key.to_owned(), value);
            }
            None => {
                entries.remove(key);
            }
        }
        self.persist(&entries);

        true
    }

    /// Script that replays the mirrored entries into the page's
    /// localStorage. Meant for injection before any page script runs.
    /// Returns `None` when there is nothing to restore.
    pub fn injection_script(&self) -> Option<String> {
        let entries = self.entries.lock().expect("lock poisoned!");
        if entries.is_empty() {
            return None;
        }

        let lines: Vec<String> = MIRROR_ALLOWED_KEYS
            .iter()
            .filter_map(|key| {
                let value = entries.get(*key)?;
                Some(format!(
                    "try {{ localStorage.setItem('{}', '{}'); }} catch(e) {{}}",
                    escape_key(key),
                    escape_value(value),
                ))
            })
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let Some(store) = &self.store else {
            return;
        };

        match serde_json::to_string(entries) {
            Ok(json) => store.set(MIRROR_SLOT.to_owned(), json.into_bytes()),
            Err(e) => warn!("Failed to serialize the localStorage mirror: {e}"),
        }
    }
}

fn decode_entries(bytes: &[u8]) -> HashMap<String, String> {
    match serde_json::from_slice(bytes) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Discarding undecodable localStorage mirror: {e}");
            HashMap::new()
        }
    }
}

// Keys sit inside single quotes in the restore script.
fn escape_key(key: &str) -> String {
    key.replace('\'', "\\'")
}

// Backslashes first, then the characters that would break the literal.
fn escape_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
