//! Remote streaming-service client.
//!
//! [`PlayerClient`] is the seam the rest of the crate talks through: the
//! snapshot and restore engines accept any implementation, the HTTP client
//! in [`http`] is the production one, and [`RetryingClient`] wraps either
//! with the bounded-retry policy.

mod http;
mod retry;

pub use http::HttpPlayerClient;
pub use retry::{RetryPolicy, RetryingClient, retried};

use async_trait::async_trait;

use crate::error::Result;

/// Page size used when walking a context's track list.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// The signed-in user, as the provider reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
}

/// What is playing right now.
///
/// `track` is always present; a response without a track (nothing playing,
/// or something that is not a track) surfaces as `None` at the client level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub track: Track,
    pub context: Option<PlaybackContext>,
    pub progress_ms: u64,
    pub shuffle: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album_name: String,
    /// Artwork URLs, largest first.
    pub artwork: Vec<String>,
    pub duration_ms: u64,
}

/// The collection playback was started from, e.g. an album or a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackContext {
    pub uri: String,
    /// Raw context kind as sent by the provider ("album", "playlist", ...).
    pub kind: String,
    /// Shareable web link for the context, when the provider sent one.
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Devices in a private session may come without an id.
    pub id: Option<String>,
    pub name: String,
    pub active: bool,
}

/// One page of a context's track list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<TrackRef>,
    /// Total number of tracks in the context, independent of paging.
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRef {
    pub uri: String,
}

/// Everything needed to resume playback at a known spot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    /// Target device; `None` lets the provider pick the active one.
    pub device_id: Option<String>,
    pub context_uri: String,
    /// Track within the context to start from.
    pub track_uri: String,
    pub position_ms: u64,
}

/// Calls against the streaming provider's player API.
#[async_trait]
pub trait PlayerClient: Send + Sync {
    /// Profile of the user the access token belongs to.
    async fn current_user(&self) -> Result<UserProfile>;

    /// Current playback, or `None` when nothing is playing.
    async fn playback_state(&self) -> Result<Option<PlaybackState>>;

    /// Devices currently known to the provider for this user.
    async fn devices(&self) -> Result<Vec<Device>>;

    /// One page of an album's tracks.
    async fn album_tracks(&self, album_id: &str, offset: u32, limit: u32) -> Result<Page>;

    /// One page of a playlist's tracks.
    async fn playlist_tracks(&self, playlist_id: &str, offset: u32, limit: u32) -> Result<Page>;

    /// Display name of a playlist.
    async fn playlist_name(&self, playlist_id: &str) -> Result<String>;

    /// Start playback as described by `request`.
    async fn play(&self, request: &PlayRequest) -> Result<()>;

    /// Pause playback on the active device.
    async fn pause(&self) -> Result<()>;

    /// Switch shuffle on or off, optionally on a specific device.
    async fn set_shuffle(&self, on: bool, device_id: Option<&str>) -> Result<()>;
}
