use std::future::Future;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{Duration, sleep};
use tracing::{debug, warn};

use crate::error::Result;

use super::{Device, Page, PlayRequest, PlaybackState, PlayerClient, UserProfile};

/// How often a failed remote call is reissued before its error is returned.
///
/// The delay between attempts is fixed. Remote failures here are dominated by
/// flaky consumer networks and short provider hiccups, where waiting longer
/// does not improve the odds.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub retries: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            delay_ms: 100,
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, delay_ms: u64) -> Self {
        Self { retries, delay_ms }
    }

    fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Run `call` until it succeeds or the policy is exhausted, returning the
/// last error. Every retry is logged at warn level with its ordinal.
pub async fn retried<F, Fut, T>(policy: &RetryPolicy, operation: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=policy.retries {
        match call().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation, attempt, "remote call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                last_error = Some(err);

                if attempt < policy.retries {
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        retries = policy.retries,
                        error = %last_error.as_ref().unwrap(),
                        "remote call failed, retrying"
                    );
                    sleep(policy.delay()).await;
                }
            }
        }
    }

    Err(last_error.unwrap())
}

/// A [`PlayerClient`] decorator that applies one [`RetryPolicy`] to every
/// call, so individual call sites never spell out retry handling.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<C: PlayerClient> PlayerClient for RetryingClient<C> {
    async fn current_user(&self) -> Result<UserProfile> {
        retried(&self.policy, "read user profile", || {
            self.inner.current_user()
        })
        .await
    }

    async fn playback_state(&self) -> Result<Option<PlaybackState>> {
        retried(&self.policy, "read current playback", || {
            self.inner.playback_state()
        })
        .await
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        retried(&self.policy, "list playback devices", || {
            self.inner.devices()
        })
        .await
    }

    async fn album_tracks(&self, album_id: &str, offset: u32, limit: u32) -> Result<Page> {
        retried(&self.policy, "read album tracks", || {
            self.inner.album_tracks(album_id, offset, limit)
        })
        .await
    }

    async fn playlist_tracks(&self, playlist_id: &str, offset: u32, limit: u32) -> Result<Page> {
        retried(&self.policy, "read playlist tracks", || {
            self.inner.playlist_tracks(playlist_id, offset, limit)
        })
        .await
    }

    async fn playlist_name(&self, playlist_id: &str) -> Result<String> {
        retried(&self.policy, "read playlist name", || {
            self.inner.playlist_name(playlist_id)
        })
        .await
    }

    async fn play(&self, request: &PlayRequest) -> Result<()> {
        retried(&self.policy, "start playback", || self.inner.play(request)).await
    }

    async fn pause(&self) -> Result<()> {
        retried(&self.policy, "pause playback", || self.inner.pause()).await
    }

    async fn set_shuffle(&self, on: bool, device_id: Option<&str>) -> Result<()> {
        retried(&self.policy, "set shuffle mode", || {
            self.inner.set_shuffle(on, device_id)
        })
        .await
    }
}
