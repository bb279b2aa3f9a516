use crate::meter::Volume;
use serde::Serialize;
use serde_json::value::RawValue;

/// Snapshot published once per metering cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryRecord {
    pub flow_rate_lpm: u32,
    pub volume: Volume,
    pub uptime_secs: u64,
}

/// Wire shape of the state topic. `meter_water` is emitted as a raw number
/// so it always carries three decimals (`10.100`, not `10.1`).
#[derive(Serialize)]
struct StatePayload {
    measure_water: u32,
    meter_water: Box<RawValue>,
    uptime: u64,
}

impl TelemetryRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        let payload = StatePayload {
            measure_water: self.flow_rate_lpm,
            meter_water: RawValue::from_string(self.volume.to_string())?,
            uptime: self.uptime_secs,
        };
        serde_json::to_string(&payload)
    }
}
