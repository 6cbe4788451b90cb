use crate::error::{Error, Result};
use crate::remote::{DEFAULT_PAGE_LIMIT, PlayerClient};
use crate::store::ContextType;

/// Where a track sits in its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackPosition {
    /// 1-based; users do not count from zero.
    pub index: u32,
    /// Track count of the whole context.
    pub total: u32,
}

/// Finds a track's position by walking the context's track list page by
/// page, in list order, starting at the front.
pub struct TrackLocator {
    page_limit: u32,
}

impl TrackLocator {
    pub fn new() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(page_limit: u32) -> Self {
        Self {
            // A zero limit would never advance.
            page_limit: page_limit.max(1),
        }
    }

    /// Locate `track_uri` within the album or playlist `context_id`.
    ///
    /// A track on page n costs n fetches; an absent track costs as many
    /// fetches as the context has pages. Page-fetch failures propagate to
    /// the caller, which is free to treat the position as merely advisory.
    pub async fn locate(
        &self,
        client: &dyn PlayerClient,
        context_type: ContextType,
        context_id: &str,
        track_uri: &str,
    ) -> Result<TrackPosition> {
        let mut offset = 0u32;

        loop {
            let page = match context_type {
                ContextType::Album => {
                    client
                        .album_tracks(context_id, offset, self.page_limit)
                        .await?
                }
                ContextType::Playlist => {
                    client
                        .playlist_tracks(context_id, offset, self.page_limit)
                        .await?
                }
            };

            if let Some(i) = page.items.iter().position(|t| t.uri == track_uri) {
                return Ok(TrackPosition {
                    index: offset + i as u32 + 1,
                    total: page.total,
                });
            }

            offset += self.page_limit;
            if offset >= page.total {
                return Err(Error::TrackNotFound);
            }
        }
    }
}

impl Default for TrackLocator {
    fn default() -> Self {
        Self::new()
    }
}
