use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{ExportRecord, PlaybackSnapshot, SCHEMA_VERSION, SlotStore, hash_user_key};

/// In-memory slot store with the same contract as [`super::SqliteStore`].
/// Used by tests and anywhere persistence across runs is not wanted.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Vec<PlaybackSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn load(&self, user_id: &str) -> Result<Vec<PlaybackSnapshot>> {
        let documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        Ok(documents
            .get(&hash_user_key(user_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, user_id: &str, slots: &[PlaybackSnapshot]) -> Result<()> {
        let mut documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        documents.insert(hash_user_key(user_id), slots.to_vec());
        Ok(())
    }

    async fn export_dump(&self, user_id: &str) -> Result<Vec<u8>> {
        let user_key = hash_user_key(user_id);
        let documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        let slots = documents.get(&user_key).ok_or(Error::UserNotFound)?.clone();

        let record = ExportRecord {
            version: SCHEMA_VERSION.to_string(),
            user_key,
            slots,
        };
        let bytes = serde_json::to_vec_pretty(&record)
            .map_err(|e| Error::storage(anyhow!("failed to serialize export: {e}")))?;
        Ok(bytes)
    }

    async fn delete_all(&self, user_id: &str) -> Result<()> {
        let mut documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        match documents.remove(&hash_user_key(user_id)) {
            Some(_) => Ok(()),
            None => Err(Error::UserNotFound),
        }
    }
}
