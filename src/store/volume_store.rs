use super::slot::{VolumeSlot, SLOT_SIZE};
use crate::error::MeterResult;
use crate::meter::Volume;

/// Persistent cumulative volume on top of a [`VolumeSlot`].
///
/// Only the aggregator holds one, which keeps writes single-threaded.
pub struct VolumeStore<S: VolumeSlot> {
    slot: S,
}

impl<S: VolumeSlot> VolumeStore<S> {
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    /// Read the persisted volume, falling back to `initial` when the slot is
    /// empty, unreadable, short, NaN, infinite, negative or out of range.
    pub fn load(&mut self, initial: Volume) -> Volume {
        let bytes = match self.slot.read() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("Store: No persisted volume, using initial {} m3", initial);
                return initial;
            }
            Err(e) => {
                log::warn!("❌ Store: {}, using initial {} m3", e, initial);
                return initial;
            }
        };

        match decode(&bytes) {
            Some(volume) => {
                log::info!("✅ Store: Loaded volume {} m3", volume);
                volume
            }
            None => {
                log::warn!(
                    "❌ Store: Persisted volume invalid ({:02x?}), using initial {} m3",
                    bytes.as_slice(),
                    initial
                );
                initial
            }
        }
    }

    pub fn save(&mut self, volume: Volume) -> MeterResult<()> {
        self.slot.write(&encode(volume))?;
        log::debug!("Store: Saved volume {} m3", volume);
        Ok(())
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn slot_mut(&mut self) -> &mut S {
        &mut self.slot
    }
}

pub fn encode(volume: Volume) -> [u8; SLOT_SIZE] {
    volume.cubic_meters().to_le_bytes()
}

pub fn decode(bytes: &[u8]) -> Option<Volume> {
    let raw: [u8; SLOT_SIZE] = bytes.try_into().ok()?;
    Volume::from_cubic_meters(f64::from_le_bytes(raw))
}
