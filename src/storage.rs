use std::collections::HashMap;

/// Injected local key-value persistence, the shape of a browser's local
/// storage: string keys, string values, silent overwrite.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// In-memory store; the default for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v".into());
        assert_eq!(store.get("k"), Some("v".into()));
        store.set("k", "w".into());
        assert_eq!(store.get("k"), Some("w".into()));
        store.remove("k");
        assert_eq!(store.get("k"), None);
    }
}
