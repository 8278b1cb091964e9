//! # Receipt Upload Contract
//!
//! Receipt files are stored by an external upload collaborator; the
//! operations only ever see the stored filename it returns. This module
//! defines that contract and an in-memory implementation for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Contract
// =============================================================================

/// Upload collaborator failure.
#[derive(Debug, Error)]
#[error("Receipt upload failed for '{original_name}': {reason}")]
pub struct UploadError {
    pub original_name: String,
    pub reason: String,
}

/// The receipt-storage collaborator contract.
///
/// `store` returns the stored filename on success; the operations persist
/// that name on the expense row and never touch file contents again.
pub trait ReceiptStore: Send + Sync {
    fn store(&self, original_name: &str, content: &[u8]) -> Result<String, UploadError>;
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// In-memory receipt store for tests and development.
#[derive(Default)]
pub struct MemoryReceiptStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryReceiptStore {
    pub fn new() -> Self {
        MemoryReceiptStore::default()
    }

    /// Number of stored files (test assertions).
    pub fn len(&self) -> usize {
        match self.files.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReceiptStore for MemoryReceiptStore {
    fn store(&self, original_name: &str, content: &[u8]) -> Result<String, UploadError> {
        if content.is_empty() {
            return Err(UploadError {
                original_name: original_name.to_string(),
                reason: "empty file".to_string(),
            });
        }

        // Keep the extension so stored names stay recognizable
        let extension = original_name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{ext}"))
            .unwrap_or_default();
        let stored_name = format!("{}{}", Uuid::new_v4(), extension);

        let mut files = match self.files.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        files.insert(stored_name.clone(), content.to_vec());

        Ok(stored_name)
    }
}

/// A store that always fails; used to exercise upload-failure paths.
#[cfg(test)]
pub struct FailingReceiptStore;

#[cfg(test)]
impl ReceiptStore for FailingReceiptStore {
    fn store(&self, original_name: &str, _content: &[u8]) -> Result<String, UploadError> {
        Err(UploadError {
            original_name: original_name.to_string(),
            reason: "storage offline".to_string(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_keeps_extension() {
        let store = MemoryReceiptStore::new();
        let stored = store.store("receipt.jpg", b"bytes").unwrap();
        assert!(stored.ends_with(".jpg"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_file_rejected() {
        let store = MemoryReceiptStore::new();
        assert!(store.store("receipt.jpg", b"").is_err());
        assert!(store.is_empty());
    }
}
