use std::path::PathBuf;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::Connection;
use tokio::task;
use tracing::debug;

use crate::error::{Error, Result};

use super::{ExportRecord, PlaybackSnapshot, SCHEMA_VERSION, SlotStore, hash_user_key};

/// SQLite-backed slot store. One row per user, the slot list as a single
/// JSON document, so every save is atomic at the user level.
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        Self::try_new(db_path.into()).map_err(Error::storage)
    }

    fn try_new(db_path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let store = Self { db_path };
        store.init_schema()?;

        Ok(store)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("failed to open database: {}", self.db_path.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS slots (
                user_key TEXT PRIMARY KEY,
                version TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("failed to create slots table")?;

        debug!(path = %self.db_path.display(), "initialized SQLite slot store");

        Ok(())
    }
}

#[async_trait]
impl SlotStore for SqliteStore {
    async fn load(&self, user_id: &str) -> Result<Vec<PlaybackSnapshot>> {
        let user_key = hash_user_key(user_id);
        let db_path = self.db_path.clone();

        let data = task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;

            let mut stmt = conn.prepare("SELECT data FROM slots WHERE user_key = ?1")?;
            match stmt.query_row([&user_key], |row| row.get::<_, String>(0)) {
                Ok(data) => Ok(Some(data)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(anyhow::Error::from(e)),
            }
        })
        .await
        .context("spawn_blocking failed")?
        .map_err(Error::storage)?;

        match data {
            Some(data) => {
                let slots = serde_json::from_str(&data)
                    .map_err(|e| Error::storage(anyhow!("corrupt slot document: {e}")))?;
                Ok(slots)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, user_id: &str, slots: &[PlaybackSnapshot]) -> Result<()> {
        let user_key = hash_user_key(user_id);
        let db_path = self.db_path.clone();
        let slots = slots.to_vec();

        task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;

            let count = slots.len();
            let data = serde_json::to_string(&slots)?;

            conn.execute(
                "INSERT OR REPLACE INTO slots (user_key, version, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_key, SCHEMA_VERSION, data, Utc::now().to_rfc3339()],
            )?;

            debug!(user_key = %user_key, slots = count, "saved slot document");

            Ok::<_, anyhow::Error>(())
        })
        .await
        .context("spawn_blocking failed")?
        .map_err(Error::storage)?;

        Ok(())
    }

    async fn export_dump(&self, user_id: &str) -> Result<Vec<u8>> {
        let user_key = hash_user_key(user_id);
        let db_path = self.db_path.clone();

        let row = {
            let user_key = user_key.clone();
            task::spawn_blocking(move || {
                let conn = Connection::open(&db_path)?;

                let mut stmt =
                    conn.prepare("SELECT version, data FROM slots WHERE user_key = ?1")?;
                match stmt.query_row([&user_key], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                }) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(anyhow::Error::from(e)),
                }
            })
            .await
            .context("spawn_blocking failed")?
            .map_err(Error::storage)?
        };

        let (version, data) = row.ok_or(Error::UserNotFound)?;
        let slots: Vec<PlaybackSnapshot> = serde_json::from_str(&data)
            .map_err(|e| Error::storage(anyhow!("corrupt slot document: {e}")))?;

        let record = ExportRecord {
            version,
            user_key,
            slots,
        };
        let bytes = serde_json::to_vec_pretty(&record)
            .map_err(|e| Error::storage(anyhow!("failed to serialize export: {e}")))?;
        Ok(bytes)
    }

    async fn delete_all(&self, user_id: &str) -> Result<()> {
        let user_key = hash_user_key(user_id);
        let db_path = self.db_path.clone();

        let deleted = task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            let rows = conn.execute("DELETE FROM slots WHERE user_key = ?1", [&user_key])?;
            debug!(user_key = %user_key, "deleted slot document");
            Ok::<_, anyhow::Error>(rows)
        })
        .await
        .context("spawn_blocking failed")?
        .map_err(Error::storage)?;

        if deleted == 0 {
            return Err(Error::UserNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ContextType;

    fn snapshot(track: &str) -> PlaybackSnapshot {
        PlaybackSnapshot {
            context_uri: "spotify:album:08tZq3FDsspdU6ycn8Jl2o".to_string(),
            track_uri: format!("spotify:track:{track}"),
            link_to_context: "https://open.spotify.com/album/08tZq3FDsspdU6ycn8Jl2o".to_string(),
            context_type: ContextType::Album,
            playlist_name: String::new(),
            artwork: vec!["https://img/large".to_string(), "https://img/med".to_string()],
            track_name: track.to_string(),
            album_name: "Record".to_string(),
            artists: "A, B".to_string(),
            track_index: 3,
            total_tracks: 11,
            progress_ms: 93_000,
            duration_ms: 210_000,
            shuffle: false,
            captured_at: 1_700_000_000,
        }
    }

    fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("slots.db")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn unknown_user_loads_as_empty() {
        let (_dir, store) = store();
        assert!(store.load("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saves_and_reloads_a_slot_list() {
        let (_dir, store) = store();
        let slots = vec![snapshot("one"), snapshot("two")];

        store.save("someone", &slots).await.unwrap();
        assert_eq!(store.load("someone").await.unwrap(), slots);

        // Overwrite replaces the whole document.
        store.save("someone", &slots[..1]).await.unwrap();
        assert_eq!(store.load("someone").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn export_carries_schema_version_and_hashed_key() {
        let (_dir, store) = store();
        store.save("someone", &[snapshot("one")]).await.unwrap();

        let bytes = store.export_dump("someone").await.unwrap();
        let record: ExportRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record.version, SCHEMA_VERSION);
        assert_eq!(record.user_key, hash_user_key("someone"));
        assert_eq!(record.slots.len(), 1);
        assert!(!record.user_key.contains("someone"));
    }

    #[tokio::test]
    async fn export_and_delete_of_an_unknown_user_say_so() {
        let (_dir, store) = store();
        assert!(matches!(
            store.export_dump("nobody").await,
            Err(Error::UserNotFound)
        ));
        assert!(matches!(
            store.delete_all("nobody").await,
            Err(Error::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_document() {
        let (_dir, store) = store();
        store.save("someone", &[snapshot("one")]).await.unwrap();

        store.delete_all("someone").await.unwrap();
        assert!(store.load("someone").await.unwrap().is_empty());
        assert!(matches!(
            store.delete_all("someone").await,
            Err(Error::UserNotFound)
        ));
    }
}
