use core::fmt;

/// Cumulative volume with fixed 3-decimal precision in cubic meters.
///
/// Stored as whole liters (1 L = 0.001 m³), so every value is exactly a
/// 3-decimal quantity and arithmetic on it never drifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Volume(u64);

impl Volume {
    pub const ZERO: Volume = Volume(0);

    /// One billion m³. Every liter count up to here survives the
    /// `liters / 1000` → `(m3 * 1000).round()` trip through an `f64`.
    pub const MAX: Volume = Volume(1_000_000_000_000);

    pub const fn from_liters(liters: u64) -> Self {
        if liters > Self::MAX.0 {
            Self::MAX
        } else {
            Volume(liters)
        }
    }

    /// Convert cubic meters to a volume, rounding to 3 decimals.
    ///
    /// Rounding is half away from zero (`f64::round` on the liter value).
    /// Returns `None` for NaN, infinities, negatives and values above
    /// [`Volume::MAX`]. `-0.0` is accepted as zero.
    pub fn from_cubic_meters(m3: f64) -> Option<Self> {
        if !m3.is_finite() || m3 < 0.0 {
            return None;
        }
        let liters = (m3 * 1000.0).round();
        if liters > Self::MAX.0 as f64 {
            return None;
        }
        Some(Volume(liters as u64))
    }

    pub const fn liters(self) -> u64 {
        self.0
    }

    pub fn cubic_meters(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    pub fn saturating_add_liters(self, liters: u64) -> Self {
        Self::from_liters(self.0.saturating_add(liters))
    }
}

/// Always exactly three decimals, e.g. `10.100`.
impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}
