use crate::error::{MeterError, MeterResult};

/// One persisted `f64`: the cumulative volume in cubic meters, little-endian.
pub const SLOT_SIZE: usize = 8;

pub type SlotBytes = heapless::Vec<u8, SLOT_SIZE>;

/// The durable medium behind the volume store: one fixed slot.
///
/// `read` returns `Ok(None)` when nothing has been written yet. A write must
/// replace the whole slot.
pub trait VolumeSlot {
    fn read(&mut self) -> MeterResult<Option<SlotBytes>>;
    fn write(&mut self, bytes: &[u8; SLOT_SIZE]) -> MeterResult<()>;
}

/// RAM-backed slot for host builds and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    data: Option<SlotBytes>,
    writes: u32,
    fail_writes: bool,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the slot with raw content (truncated to the slot size).
    pub fn with_bytes(bytes: &[u8]) -> Self {
        let mut data = SlotBytes::new();
        let len = bytes.len().min(SLOT_SIZE);
        let _ = data.extend_from_slice(&bytes[..len]);
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn with_f64(value: f64) -> Self {
        Self::with_bytes(&value.to_le_bytes())
    }

    /// Make subsequent writes fail, as a worn or full flash would.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn stored_f64(&self) -> Option<f64> {
        let bytes: [u8; SLOT_SIZE] = self.data.as_deref()?.try_into().ok()?;
        Some(f64::from_le_bytes(bytes))
    }

    /// Count of successful writes.
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl VolumeSlot for MemorySlot {
    fn read(&mut self) -> MeterResult<Option<SlotBytes>> {
        Ok(self.data.clone())
    }

    fn write(&mut self, bytes: &[u8; SLOT_SIZE]) -> MeterResult<()> {
        if self.fail_writes {
            return Err(MeterError::StoreWrite);
        }
        let mut data = SlotBytes::new();
        data.extend_from_slice(bytes)
            .map_err(|_| MeterError::StoreWrite)?;
        self.data = Some(data);
        self.writes += 1;
        Ok(())
    }
}
