//! Playback engines: capturing the current listening position and putting a
//! saved one back on a device.

mod locator;
mod restore;
mod snapshot;

pub use locator::{TrackLocator, TrackPosition};
pub use restore::restore;
pub use snapshot::SnapshotEngine;

use tracing::error;

/// Last segment of a colon-separated context URI, which is the provider id.
pub fn context_id_from_uri(uri: &str) -> &str {
    uri.rsplit(':').next().unwrap_or(uri)
}

/// Shareable web link for a context URI like `spotify:album:<id>`.
///
/// Returns an empty string (and logs) when the URI does not consist of
/// exactly three segments.
pub fn link_to_context(context_uri: &str) -> String {
    let splits: Vec<&str> = context_uri.split(':').collect();

    if splits.len() != 3 {
        error!(context_uri, "splitting context URI did not result in 3 parts");
        return String::new();
    }

    format!("https://open.spotify.com/{}/{}", splits[1], splits[2])
}
