use super::slot::{SlotBytes, VolumeSlot, SLOT_SIZE};
use crate::error::{MeterError, MeterResult};
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

pub const NVS_NAMESPACE: &str = "meter";
pub const NVS_VOLUME_KEY: &str = "meter_water";

/// Volume slot in the default NVS partition.
///
/// NVS commits a blob entry atomically, so a reset mid-write leaves either
/// the old or the new value.
pub struct NvsSlot {
    nvs: EspNvs<NvsDefault>,
}

impl NvsSlot {
    pub fn new(partition: EspDefaultNvsPartition) -> anyhow::Result<Self> {
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true)?;
        log::info!("✅ Store: NVS namespace '{}' opened", NVS_NAMESPACE);
        Ok(Self { nvs })
    }
}

impl VolumeSlot for NvsSlot {
    fn read(&mut self) -> MeterResult<Option<SlotBytes>> {
        let mut buf = [0u8; SLOT_SIZE];
        let blob = self.nvs.get_blob(NVS_VOLUME_KEY, &mut buf).map_err(|e| {
            log::warn!("Store: NVS read error: {:?}", e);
            MeterError::StoreRead
        })?;

        Ok(blob.map(|bytes| {
            let mut data = SlotBytes::new();
            let _ = data.extend_from_slice(bytes);
            data
        }))
    }

    fn write(&mut self, bytes: &[u8; SLOT_SIZE]) -> MeterResult<()> {
        self.nvs.set_blob(NVS_VOLUME_KEY, bytes).map_err(|e| {
            log::warn!("Store: NVS write error: {:?}", e);
            MeterError::StoreWrite
        })
    }
}
