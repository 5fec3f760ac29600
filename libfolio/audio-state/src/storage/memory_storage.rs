use std::collections::HashMap;
use std::sync::Mutex;

use super::{Storage, StorageError};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes once keys and values together would exceed `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: Mutex::default(),
            quota: Some(quota),
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(quota) = self.quota {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    quota,
                });
            }
        }
        items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_quota_exceeded() {
        let storage = MemoryStorage::with_quota(10);
        storage.set_item("a", "12345").unwrap();
        assert_matches!(
            storage.set_item("b", "123456"),
            Err(StorageError::QuotaExceeded { quota: 10, .. })
        );
        // overwriting an existing key only counts the new value
        storage.set_item("a", "123456789").unwrap();
        assert_eq!(Some("123456789".to_owned()), storage.get_item("a").unwrap());
    }
}
