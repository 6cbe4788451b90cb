use chrono::Utc;
use tracing::warn;

use crate::error::{Error, Result};
use crate::remote::PlayerClient;
use crate::store::{ContextType, PlaybackSnapshot};

use super::{TrackLocator, context_id_from_uri, link_to_context};

/// Builds a [`PlaybackSnapshot`] from whatever is playing right now.
///
/// Capturing is read-only; pausing after a save is the caller's business.
pub struct SnapshotEngine {
    locator: TrackLocator,
}

impl SnapshotEngine {
    pub fn new() -> Self {
        Self {
            locator: TrackLocator::new(),
        }
    }

    pub fn with_locator(locator: TrackLocator) -> Self {
        Self { locator }
    }

    /// Capture the current playback position.
    ///
    /// Fails hard when nothing is playing or the context is not an album or
    /// playlist. Everything ornamental degrades instead: a track position
    /// that cannot be determined is stored as -1, a missing share link or
    /// playlist name as an empty string, each with a warning.
    pub async fn capture(&self, client: &dyn PlayerClient) -> Result<PlaybackSnapshot> {
        let state = client
            .playback_state()
            .await?
            .ok_or(Error::NoCurrentPlayback)?;

        let context = state.context.as_ref().ok_or(Error::ContextNotSuspendable)?;
        let context_type =
            ContextType::from_kind(&context.kind).ok_or(Error::ContextNotSuspendable)?;

        let artists = state.track.artists.join(", ");
        let artwork = padded_artwork(&state.track.artwork);

        let context_id = context_id_from_uri(&context.uri);
        let (track_index, total_tracks) = match self
            .locator
            .locate(client, context_type, context_id, &state.track.uri)
            .await
        {
            Ok(position) => (i64::from(position.index), i64::from(position.total)),
            Err(err) => {
                warn!(error = %err, track = %state.track.uri, context = %context.uri,
                    "could not determine track position in context");
                (-1, -1)
            }
        };

        let link_to_context = match &context.external_url {
            Some(url) => url.clone(),
            // The provider usually sends a link; fall back to deriving one.
            None => link_to_context(&context.uri),
        };

        let playlist_name = if context_type == ContextType::Playlist {
            match client.playlist_name(context_id).await {
                Ok(name) => name,
                Err(err) => {
                    warn!(error = %err, playlist = context_id, "could not read playlist name");
                    String::new()
                }
            }
        } else {
            String::new()
        };

        Ok(PlaybackSnapshot {
            context_uri: context.uri.clone(),
            track_uri: state.track.uri,
            link_to_context,
            context_type,
            playlist_name,
            artwork,
            track_name: state.track.name,
            album_name: state.track.album_name,
            artists,
            track_index,
            total_tracks,
            progress_ms: state.progress_ms,
            duration_ms: state.track.duration_ms,
            shuffle: state.shuffle,
            captured_at: Utc::now().timestamp(),
        })
    }
}

impl Default for SnapshotEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Exactly two artwork URLs, whatever the provider sent.
fn padded_artwork(urls: &[String]) -> Vec<String> {
    match urls {
        [] => {
            warn!("no artwork provided for the current track");
            vec![String::new(), String::new()]
        }
        [only] => {
            warn!("only one artwork URL provided for the current track");
            vec![only.clone(), only.clone()]
        }
        [first, second, ..] => vec![first.clone(), second.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artwork_is_padded_to_two_urls() {
        assert_eq!(padded_artwork(&[]), vec!["".to_string(), "".to_string()]);

        let one = vec!["a".to_string()];
        assert_eq!(padded_artwork(&one), vec!["a".to_string(), "a".to_string()]);

        let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(
            padded_artwork(&three),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
