use tracing::debug;

use crate::error::{Error, Result};
use crate::remote::{PlayRequest, PlayerClient};
use crate::store::PlaybackSnapshot;

/// How far playback is rewound on restore, so the listener regains context.
const JUMP_BACK_MS: u64 = 10_000;

/// Put a saved position back on a device.
///
/// Shuffle is re-applied first (it changes what "next track" means), then a
/// single play command does the rest. The snapshot itself is never touched;
/// restoring twice rewinds from the same stored position.
pub async fn restore(
    client: &dyn PlayerClient,
    snapshot: &PlaybackSnapshot,
    device_id: Option<&str>,
) -> Result<()> {
    client.set_shuffle(snapshot.shuffle, None).await?;

    let position_ms = snapshot.progress_ms.saturating_sub(JUMP_BACK_MS);

    let device_id = match device_id {
        Some(id) => Some(id.to_string()),
        None => resolve_device(client).await?,
    };

    client
        .play(&PlayRequest {
            device_id,
            context_uri: snapshot.context_uri.clone(),
            track_uri: snapshot.track_uri.clone(),
            position_ms,
        })
        .await
}

/// The device playback should land on when none was named: the active one
/// if any, else the first listed. No devices at all is an error.
async fn resolve_device(client: &dyn PlayerClient) -> Result<Option<String>> {
    let devices = client.devices().await?;

    if devices.is_empty() {
        return Err(Error::NoDeviceAvailable);
    }

    let chosen = devices.iter().find(|d| d.active).unwrap_or(&devices[0]);
    debug!(device = %chosen.name, active = chosen.active, "resolved playback device");
    Ok(chosen.id.clone())
}
