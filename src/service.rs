//! Handler-facing operations, one method per user action. An HTTP edge or
//! the CLI maps these 1:1 onto routes or subcommands.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::player::{self, SnapshotEngine};
use crate::remote::{Device, PlayerClient};
use crate::store::{PlaybackSnapshot, SlotStore};

pub struct PlayheadService {
    store: Arc<dyn SlotStore>,
    snapshots: SnapshotEngine,
}

impl PlayheadService {
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self {
            store,
            snapshots: SnapshotEngine::new(),
        }
    }

    pub fn with_snapshot_engine(store: Arc<dyn SlotStore>, snapshots: SnapshotEngine) -> Self {
        Self { store, snapshots }
    }

    /// Capture the current position into `slot`, or append a new slot when
    /// none is given. Returns the slot index written.
    ///
    /// After the slot is persisted, playback is paused as a courtesy; a
    /// failure there is logged and swallowed, the save already happened.
    pub async fn save_slot(
        &self,
        client: &dyn PlayerClient,
        user_id: &str,
        slot: Option<usize>,
    ) -> Result<usize> {
        let snapshot = self.snapshots.capture(client).await?;

        let mut slots = self.store.load(user_id).await?;
        let written = match slot {
            Some(slot) => {
                if slot >= slots.len() {
                    return Err(Error::SlotOutOfRange {
                        slot,
                        len: slots.len(),
                    });
                }
                slots[slot] = snapshot;
                slot
            }
            None => {
                slots.push(snapshot);
                slots.len() - 1
            }
        };

        self.store.save(user_id, &slots).await?;
        info!(slot = written, "saved playback position");

        if let Err(err) = client.pause().await {
            debug!(error = %err, "could not pause playback after saving");
        }

        Ok(written)
    }

    /// All slots of a user, in slot order, each carrying its share link.
    pub async fn list_slots(&self, user_id: &str) -> Result<Vec<PlaybackSnapshot>> {
        self.store.load(user_id).await
    }

    /// Remove one slot; the ones behind it move down, order preserved.
    pub async fn delete_slot(&self, user_id: &str, slot: usize) -> Result<()> {
        let mut slots = self.store.load(user_id).await?;

        if slot >= slots.len() {
            return Err(Error::SlotOutOfRange {
                slot,
                len: slots.len(),
            });
        }
        slots.remove(slot);

        self.store.save(user_id, &slots).await?;
        info!(slot, "deleted slot");
        Ok(())
    }

    /// Resume playback from a slot, optionally on a named device. Returns
    /// the snapshot that was restored.
    ///
    /// The slot is bounds-checked before the player is touched at all, so an
    /// invalid slot costs no remote calls. Stored slots are never mutated;
    /// restoring twice rewinds from the same position.
    pub async fn restore_slot(
        &self,
        client: &dyn PlayerClient,
        user_id: &str,
        slot: usize,
        device_id: Option<&str>,
    ) -> Result<PlaybackSnapshot> {
        let slots = self.store.load(user_id).await?;
        let snapshot = slots.get(slot).ok_or(Error::SlotOutOfRange {
            slot,
            len: slots.len(),
        })?;

        if let Err(err) = client.pause().await {
            debug!(error = %err, "could not pause playback before restoring");
        }

        player::restore(client, snapshot, device_id).await?;
        info!(slot, track = %snapshot.track_name, "restored playback position");
        Ok(snapshot.clone())
    }

    /// The user's devices, condensed to id, name and active flag.
    pub async fn active_devices(&self, client: &dyn PlayerClient) -> Result<Vec<Device>> {
        client.devices().await
    }

    /// Everything stored for the user, as a JSON document for takeout.
    pub async fn export_user_data(&self, user_id: &str) -> Result<Vec<u8>> {
        self.store.export_dump(user_id).await
    }

    /// Remove everything stored for the user.
    pub async fn delete_user_data(&self, user_id: &str) -> Result<()> {
        self.store.delete_all(user_id).await
    }
}
