use crate::meter::Volume;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    NotUtf8,
    NotANumber,
    Negative,
    OutOfRange,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CommandError::NotUtf8 => write!(f, "Payload is not UTF-8"),
            CommandError::NotANumber => write!(f, "Payload is not a decimal number"),
            CommandError::Negative => write!(f, "Volume must not be negative"),
            CommandError::OutOfRange => write!(f, "Volume out of range"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Parse a `<base>/set` payload such as `"482.117"` into a volume.
///
/// Surrounding whitespace is ignored. Anything else that is not a finite,
/// non-negative decimal is rejected, so garbage never resets the meter.
pub fn parse_volume_command(payload: &[u8]) -> Result<Volume, CommandError> {
    let text = std::str::from_utf8(payload).map_err(|_| CommandError::NotUtf8)?;
    let value: f64 = text.trim().parse().map_err(|_| CommandError::NotANumber)?;

    if value.is_nan() {
        return Err(CommandError::NotANumber);
    }
    if value < 0.0 {
        return Err(CommandError::Negative);
    }
    Volume::from_cubic_meters(value).ok_or(CommandError::OutOfRange)
}
