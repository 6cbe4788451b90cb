//! Slot persistence.
//!
//! Users never reach storage under their raw id; the key is an uppercase hex
//! SHA-256 of it ([`hash_user_key`]). A user's slots are stored as one JSON
//! document, so a save replaces the whole list atomically.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Schema version written into every stored document.
pub const SCHEMA_VERSION: &str = "2";

/// The kinds of context a position can be resumed in. Anything else is
/// rejected at capture time, so no other kind can ever be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    Album,
    Playlist,
}

impl ContextType {
    /// Map a provider context kind onto a storable type.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "album" => Some(Self::Album),
            "playlist" => Some(Self::Playlist),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Album => write!(f, "album"),
            Self::Playlist => write!(f, "playlist"),
        }
    }
}

/// One saved listening position. Immutable once captured; a slot is only
/// ever replaced wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub context_uri: String,
    pub track_uri: String,

    /// Shareable web link to the context; empty when it could not be derived.
    pub link_to_context: String,

    pub context_type: ContextType,

    /// Display name of the playlist; empty for albums or when the lookup
    /// failed.
    pub playlist_name: String,

    /// Exactly two artwork URLs (padded or duplicated as needed).
    pub artwork: Vec<String>,

    pub track_name: String,
    pub album_name: String,

    /// All artist names joined with ", ".
    pub artists: String,

    /// 1-based position of the track in its context, -1 when unknown.
    pub track_index: i64,

    /// Track count of the context, -1 when unknown.
    pub total_tracks: i64,

    pub progress_ms: u64,
    pub duration_ms: u64,
    pub shuffle: bool,

    /// Capture time, epoch seconds.
    pub captured_at: i64,
}

/// Full stored document for a user, the unit of export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportRecord {
    pub version: String,
    pub user_key: String,
    pub slots: Vec<PlaybackSnapshot>,
}

/// Storage key for a user: uppercase hex SHA-256 of the raw id.
pub fn hash_user_key(user_id: &str) -> String {
    let digest = Sha256::digest(user_id.as_bytes());
    hex::encode_upper(digest)
}

/// Persistence contract for slot lists.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// All slots stored for a user, in slot order. Unknown user reads as an
    /// empty list, never an error.
    async fn load(&self, user_id: &str) -> Result<Vec<PlaybackSnapshot>>;

    /// Replace the user's whole slot list.
    async fn save(&self, user_id: &str, slots: &[PlaybackSnapshot]) -> Result<()>;

    /// The full stored document as JSON bytes, for takeout. Fails with
    /// [`crate::error::Error::UserNotFound`] when nothing is stored.
    async fn export_dump(&self, user_id: &str) -> Result<Vec<u8>>;

    /// Remove everything stored for the user. Fails with
    /// [`crate::error::Error::UserNotFound`] when nothing is stored.
    async fn delete_all(&self, user_id: &str) -> Result<()>;
}
