#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use playhead::auth::{AccessToken, Authenticator};
use playhead::error::Result;
use playhead::remote::{
    Device, Page, PlayRequest, PlaybackContext, PlaybackState, PlayerClient, Track, TrackRef,
    UserProfile,
};
use playhead::store::{ContextType, PlaybackSnapshot};

/// A mock player client that replays scripted outcomes per method (popped in
/// order) and records every mutating command it receives.
///
/// Unscripted reads fail loudly, except `current_user` (defaults to a fixed
/// user) and the paged track endpoints, which serve pages computed from
/// `context_tracks`.
#[derive(Default)]
pub struct MockPlayerClient {
    pub playback: Mutex<VecDeque<Result<Option<PlaybackState>>>>,
    pub users: Mutex<VecDeque<Result<UserProfile>>>,
    pub device_lists: Mutex<VecDeque<Result<Vec<Device>>>>,
    pub playlist_names: Mutex<VecDeque<Result<String>>>,

    /// Full track list of the context the paged endpoints serve from.
    pub context_tracks: Mutex<Vec<TrackRef>>,
    /// Errors served instead of the next page fetches, one per fetch.
    pub page_errors: Mutex<VecDeque<playhead::Error>>,

    pub play_errors: Mutex<VecDeque<playhead::Error>>,
    pub shuffle_errors: Mutex<VecDeque<playhead::Error>>,
    pub pause_errors: Mutex<VecDeque<playhead::Error>>,

    pub user_calls: AtomicU32,
    pub playback_calls: AtomicU32,
    pub page_fetches: AtomicU32,
    pub pause_calls: AtomicU32,

    pub play_requests: Mutex<Vec<PlayRequest>>,
    pub shuffle_requests: Mutex<Vec<(bool, Option<String>)>>,
}

impl MockPlayerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `playback_state` outcome.
    pub fn queue_playback(&self, outcome: Result<Option<PlaybackState>>) {
        self.playback.lock().unwrap().push_back(outcome);
    }

    /// Script the next `devices` outcome.
    pub fn queue_devices(&self, outcome: Result<Vec<Device>>) {
        self.device_lists.lock().unwrap().push_back(outcome);
    }

    /// Serve the paged track endpoints from this list of URIs.
    pub fn serve_tracks(&self, uris: &[&str]) {
        *self.context_tracks.lock().unwrap() = uris
            .iter()
            .map(|uri| TrackRef {
                uri: uri.to_string(),
            })
            .collect();
    }

    /// Total number of remote calls this mock has seen.
    pub fn total_calls(&self) -> u32 {
        self.user_calls.load(Ordering::SeqCst)
            + self.playback_calls.load(Ordering::SeqCst)
            + self.page_fetches.load(Ordering::SeqCst)
            + self.pause_calls.load(Ordering::SeqCst)
            + self.play_requests.lock().unwrap().len() as u32
            + self.shuffle_requests.lock().unwrap().len() as u32
    }

    fn page_of(&self, offset: u32, limit: u32) -> Result<Page> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.page_errors.lock().unwrap().pop_front() {
            return Err(err);
        }

        let tracks = self.context_tracks.lock().unwrap();
        let total = tracks.len() as u32;
        let start = (offset as usize).min(tracks.len());
        let end = (start + limit as usize).min(tracks.len());
        Ok(Page {
            items: tracks[start..end].to_vec(),
            total,
        })
    }
}

#[async_trait]
impl PlayerClient for MockPlayerClient {
    async fn current_user(&self) -> Result<UserProfile> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.users.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(UserProfile {
                id: "mock-user".to_string(),
                display_name: Some("Mock User".to_string()),
            })
        })
    }

    async fn playback_state(&self) -> Result<Option<PlaybackState>> {
        self.playback_calls.fetch_add(1, Ordering::SeqCst);
        self.playback
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted playback state").into()))
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        self.device_lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted device list").into()))
    }

    async fn album_tracks(&self, _album_id: &str, offset: u32, limit: u32) -> Result<Page> {
        self.page_of(offset, limit)
    }

    async fn playlist_tracks(&self, _playlist_id: &str, offset: u32, limit: u32) -> Result<Page> {
        self.page_of(offset, limit)
    }

    async fn playlist_name(&self, _playlist_id: &str) -> Result<String> {
        self.playlist_names
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted playlist name").into()))
    }

    async fn play(&self, request: &PlayRequest) -> Result<()> {
        self.play_requests.lock().unwrap().push(request.clone());
        match self.play_errors.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn pause(&self) -> Result<()> {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        match self.pause_errors.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn set_shuffle(&self, on: bool, device_id: Option<&str>) -> Result<()> {
        self.shuffle_requests
            .lock()
            .unwrap()
            .push((on, device_id.map(String::from)));
        match self.shuffle_errors.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// A mock authenticator that replays scripted exchange outcomes in order.
/// Unscripted exchanges succeed with a fixed token.
#[derive(Default)]
pub struct MockAuthenticator {
    pub exchanges: Mutex<VecDeque<Result<AccessToken>>>,
    pub exchanged_codes: Mutex<Vec<String>>,
}

impl MockAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_exchange(&self, outcome: Result<AccessToken>) {
        self.exchanges.lock().unwrap().push_back(outcome);
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://accounts.example.com/authorize?state={state}")
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken> {
        self.exchanged_codes.lock().unwrap().push(code.to_string());
        self.exchanges
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(token("granted-token")))
    }
}

pub fn token(value: &str) -> AccessToken {
    AccessToken {
        access_token: value.to_string(),
        token_type: "Bearer".to_string(),
        scope: String::new(),
        expires_in: 3600,
        refresh_token: None,
    }
}

pub fn device(id: &str, name: &str, active: bool) -> Device {
    Device {
        id: Some(id.to_string()),
        name: name.to_string(),
        active,
    }
}

/// A playback state in an album context, ready to be captured.
pub fn album_playback(track_uri: &str, progress_ms: u64) -> PlaybackState {
    PlaybackState {
        track: Track {
            uri: track_uri.to_string(),
            name: "Some Song".to_string(),
            artists: vec!["First Artist".to_string(), "Second Artist".to_string()],
            album_name: "Some Record".to_string(),
            artwork: vec![
                "https://img.example.com/large".to_string(),
                "https://img.example.com/medium".to_string(),
            ],
            duration_ms: 210_000,
        },
        context: Some(PlaybackContext {
            uri: "spotify:album:08tZq3FDsspdU6ycn8Jl2o".to_string(),
            kind: "album".to_string(),
            external_url: Some(
                "https://open.spotify.com/album/08tZq3FDsspdU6ycn8Jl2o".to_string(),
            ),
        }),
        progress_ms,
        shuffle: false,
    }
}

/// A snapshot as it would sit in a slot, for restore-side tests.
pub fn stored_snapshot(track_uri: &str, progress_ms: u64, shuffle: bool) -> PlaybackSnapshot {
    PlaybackSnapshot {
        context_uri: "spotify:album:08tZq3FDsspdU6ycn8Jl2o".to_string(),
        track_uri: track_uri.to_string(),
        link_to_context: "https://open.spotify.com/album/08tZq3FDsspdU6ycn8Jl2o".to_string(),
        context_type: ContextType::Album,
        playlist_name: String::new(),
        artwork: vec![
            "https://img.example.com/large".to_string(),
            "https://img.example.com/medium".to_string(),
        ],
        track_name: "Some Song".to_string(),
        album_name: "Some Record".to_string(),
        artists: "First Artist, Second Artist".to_string(),
        track_index: 3,
        total_tracks: 11,
        progress_ms,
        duration_ms: 210_000,
        shuffle,
        captured_at: 1_700_000_000,
    }
}
