//! HTTP implementation of [`PlayerClient`] against the provider's web API.
//!
//! Wire DTOs stay private to this module; everything crossing the trait
//! boundary is a domain type from [`super`].

use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{
    Device, Page, PlayRequest, PlaybackContext, PlaybackState, PlayerClient, Track, TrackRef,
    UserProfile,
};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpPlayerClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl HttpPlayerClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_API_URL, access_token)
    }

    /// Point the client at a different host, mainly for tests.
    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T>(&self, operation: &'static str, url: String) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::api(operation, e))?;

        let response = check_status(operation, response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::api(operation, anyhow!("invalid response body: {e}")))
    }

    async fn put_empty(
        &self,
        operation: &'static str,
        url: String,
        body: Option<impl Serialize>,
    ) -> Result<()> {
        let mut request = self
            .client
            .put(&url)
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT);

        request = match body {
            Some(body) => request.json(&body),
            // A PUT without a body still needs a length, or the provider
            // rejects it with 411.
            None => request.header(reqwest::header::CONTENT_LENGTH, 0),
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::api(operation, e))?;

        check_status(operation, response).await.map(|_| ())
    }
}

/// Turn a non-2xx response into an [`Error::Api`] carrying status and body.
async fn check_status(operation: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::api(
        operation,
        anyhow!("provider returned {status}: {body}"),
    ))
}

#[async_trait]
impl PlayerClient for HttpPlayerClient {
    async fn current_user(&self) -> Result<UserProfile> {
        let dto: UserDto = self
            .get_json("read user profile", self.url("/v1/me"))
            .await?;
        Ok(UserProfile {
            id: dto.id,
            display_name: dto.display_name,
        })
    }

    async fn playback_state(&self) -> Result<Option<PlaybackState>> {
        let operation = "read current playback";
        let response = self
            .client
            .get(self.url("/v1/me/player"))
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::api(operation, e))?;

        // Nothing playing at all.
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let response = check_status(operation, response).await?;
        let dto: PlaybackDto = response
            .json()
            .await
            .map_err(|e| Error::api(operation, anyhow!("invalid response body: {e}")))?;

        // A playback frame without a track (podcast episode, private session)
        // is as good as nothing playing for our purposes.
        let Some(item) = dto.item else {
            return Ok(None);
        };

        Ok(Some(PlaybackState {
            track: Track {
                uri: item.uri,
                name: item.name,
                artists: item.artists.into_iter().map(|a| a.name).collect(),
                album_name: item.album.name,
                artwork: item.album.images.into_iter().map(|i| i.url).collect(),
                duration_ms: item.duration_ms,
            },
            context: dto.context.map(|c| PlaybackContext {
                uri: c.uri,
                kind: c.kind,
                external_url: c.external_urls.and_then(|u| u.spotify),
            }),
            progress_ms: dto.progress_ms.unwrap_or(0),
            shuffle: dto.shuffle_state,
        }))
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        let dto: DeviceListDto = self
            .get_json("list playback devices", self.url("/v1/me/player/devices"))
            .await?;
        Ok(dto
            .devices
            .into_iter()
            .map(|d| Device {
                id: d.id,
                name: d.name,
                active: d.is_active,
            })
            .collect())
    }

    async fn album_tracks(&self, album_id: &str, offset: u32, limit: u32) -> Result<Page> {
        let url = format!(
            "{}?offset={offset}&limit={limit}",
            self.url(&format!("/v1/albums/{album_id}/tracks"))
        );
        let dto: AlbumTracksDto = self.get_json("read album tracks", url).await?;
        Ok(Page {
            items: dto
                .items
                .into_iter()
                .map(|t| TrackRef { uri: t.uri })
                .collect(),
            total: dto.total,
        })
    }

    async fn playlist_tracks(&self, playlist_id: &str, offset: u32, limit: u32) -> Result<Page> {
        let url = format!(
            "{}?offset={offset}&limit={limit}&fields=items(track(uri)),total",
            self.url(&format!("/v1/playlists/{playlist_id}/tracks"))
        );
        let dto: PlaylistTracksDto = self.get_json("read playlist tracks", url).await?;
        Ok(Page {
            items: dto
                .items
                .into_iter()
                // Removed or local tracks come back without a `track` object.
                // They still occupy a position, so keep the slot.
                .map(|i| TrackRef {
                    uri: i.track.map(|t| t.uri).unwrap_or_default(),
                })
                .collect(),
            total: dto.total,
        })
    }

    async fn playlist_name(&self, playlist_id: &str) -> Result<String> {
        let url = format!(
            "{}?fields=name",
            self.url(&format!("/v1/playlists/{playlist_id}"))
        );
        let dto: PlaylistNameDto = self.get_json("read playlist name", url).await?;
        Ok(dto.name)
    }

    async fn play(&self, request: &PlayRequest) -> Result<()> {
        let mut url = self.url("/v1/me/player/play");
        if let Some(device_id) = &request.device_id {
            url = format!("{url}?device_id={device_id}");
        }
        let body = PlayBodyDto {
            context_uri: &request.context_uri,
            offset: OffsetDto {
                uri: &request.track_uri,
            },
            position_ms: request.position_ms,
        };
        self.put_empty("start playback", url, Some(body)).await
    }

    async fn pause(&self) -> Result<()> {
        self.put_empty(
            "pause playback",
            self.url("/v1/me/player/pause"),
            None::<()>,
        )
        .await
    }

    async fn set_shuffle(&self, on: bool, device_id: Option<&str>) -> Result<()> {
        let mut url = format!("{}?state={on}", self.url("/v1/me/player/shuffle"));
        if let Some(device_id) = device_id {
            url = format!("{url}&device_id={device_id}");
        }
        self.put_empty("set shuffle mode", url, None::<()>).await
    }
}

#[derive(Deserialize)]
struct UserDto {
    id: String,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct PlaybackDto {
    progress_ms: Option<u64>,
    #[serde(default)]
    shuffle_state: bool,
    context: Option<ContextDto>,
    item: Option<TrackDto>,
}

#[derive(Deserialize)]
struct ContextDto {
    uri: String,
    #[serde(rename = "type")]
    kind: String,
    external_urls: Option<ExternalUrlsDto>,
}

#[derive(Deserialize)]
struct ExternalUrlsDto {
    spotify: Option<String>,
}

#[derive(Deserialize)]
struct TrackDto {
    uri: String,
    name: String,
    duration_ms: u64,
    artists: Vec<ArtistDto>,
    album: AlbumDto,
}

#[derive(Deserialize)]
struct ArtistDto {
    name: String,
}

#[derive(Deserialize)]
struct AlbumDto {
    name: String,
    #[serde(default)]
    images: Vec<ImageDto>,
}

#[derive(Deserialize)]
struct ImageDto {
    url: String,
}

#[derive(Deserialize)]
struct DeviceListDto {
    devices: Vec<DeviceDto>,
}

#[derive(Deserialize)]
struct DeviceDto {
    id: Option<String>,
    name: String,
    is_active: bool,
}

#[derive(Deserialize)]
struct AlbumTracksDto {
    items: Vec<TrackRefDto>,
    total: u32,
}

#[derive(Deserialize)]
struct TrackRefDto {
    uri: String,
}

#[derive(Deserialize)]
struct PlaylistTracksDto {
    items: Vec<PlaylistItemDto>,
    total: u32,
}

#[derive(Deserialize)]
struct PlaylistItemDto {
    track: Option<TrackRefDto>,
}

#[derive(Deserialize)]
struct PlaylistNameDto {
    name: String,
}

#[derive(Serialize)]
struct PlayBodyDto<'a> {
    context_uri: &'a str,
    offset: OffsetDto<'a>,
    position_ms: u64,
}

#[derive(Serialize)]
struct OffsetDto<'a> {
    uri: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_dto_tolerates_sparse_payloads() {
        let raw = r#"{
            "progress_ms": 12500,
            "shuffle_state": true,
            "context": {
                "uri": "spotify:album:08tZq3FDsspdU6ycn8Jl2o",
                "type": "album",
                "external_urls": {"spotify": "https://open.spotify.com/album/08tZq3FDsspdU6ycn8Jl2o"}
            },
            "item": {
                "uri": "spotify:track:abc",
                "name": "Song",
                "duration_ms": 210000,
                "artists": [{"name": "A"}, {"name": "B"}],
                "album": {"name": "Record", "images": [{"url": "https://img/1"}]}
            }
        }"#;
        let dto: PlaybackDto = serde_json::from_str(raw).unwrap();
        let item = dto.item.unwrap();
        assert_eq!(item.artists.len(), 2);
        let context = dto.context.unwrap();
        assert_eq!(context.kind, "album");
        assert!(context.external_urls.unwrap().spotify.is_some());

        // No context, no item: still parses.
        let dto: PlaybackDto = serde_json::from_str(r#"{"progress_ms": null}"#).unwrap();
        assert!(dto.item.is_none());
        assert!(!dto.shuffle_state);
    }

    #[test]
    fn playlist_items_keep_their_position_without_a_track() {
        let raw = r#"{"items": [{"track": {"uri": "spotify:track:x"}}, {"track": null}], "total": 2}"#;
        let dto: PlaylistTracksDto = serde_json::from_str(raw).unwrap();
        assert_eq!(dto.items.len(), 2);
        assert!(dto.items[1].track.is_none());
    }
}
