#[cfg(target_os = "espidf")]
pub mod nvs;
pub mod slot;
pub mod volume_store;

#[cfg(target_os = "espidf")]
pub use nvs::NvsSlot;
pub use slot::{MemorySlot, SlotBytes, VolumeSlot, SLOT_SIZE};
pub use volume_store::VolumeStore;
