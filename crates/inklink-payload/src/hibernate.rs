use std::time::SystemTime;

use crate::error::{PayloadError, Result};

/// Magic marker that opens a hibernation command.
///
/// On the wire it is little-endian: `B3 9F AE 1F`.
pub const HIBERNATION_MAGIC: u32 = 0x1FAE_9FB3;

/// Encoded size: magic (4) + seconds (4).
pub const HIBERNATION_COMMAND_SIZE: usize = 8;

/// Instruction for the display to sleep before polling again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HibernationCommand {
    /// Whole seconds until the display wakes up.
    pub seconds_until_wakeup: u32,
}

impl HibernationCommand {
    /// Sleep for a fixed number of seconds.
    pub fn new(seconds_until_wakeup: u32) -> Self {
        Self {
            seconds_until_wakeup,
        }
    }

    /// Sleep from `now` until `until`.
    ///
    /// Fractional seconds are truncated. A wake-up time in the past yields
    /// zero, and durations beyond `u32::MAX` seconds saturate.
    pub fn until(until: SystemTime, now: SystemTime) -> Self {
        let seconds = match until.duration_since(now) {
            Ok(remaining) => u32::try_from(remaining.as_secs()).unwrap_or(u32::MAX),
            Err(_) => 0,
        };
        Self::new(seconds)
    }

    /// Encode as `magic LE ‖ seconds LE`.
    pub fn to_bytes(&self) -> [u8; HIBERNATION_COMMAND_SIZE] {
        let mut out = [0u8; HIBERNATION_COMMAND_SIZE];
        out[..4].copy_from_slice(&HIBERNATION_MAGIC.to_le_bytes());
        out[4..].copy_from_slice(&self.seconds_until_wakeup.to_le_bytes());
        out
    }

    /// Parse an encoded command.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HIBERNATION_COMMAND_SIZE {
            return Err(PayloadError::Truncated {
                expected: HIBERNATION_COMMAND_SIZE,
                actual: bytes.len(),
            });
        }
        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != HIBERNATION_MAGIC {
            return Err(PayloadError::InvalidMagic(magic));
        }
        let seconds = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(Self::new(seconds))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn encodes_magic_then_seconds() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let cmd = HibernationCommand::until(now + Duration::from_secs(3661), now);
        let bytes = cmd.to_bytes();

        assert_eq!(&bytes[..4], &[0xB3, 0x9F, 0xAE, 0x1F]);
        assert_eq!(u32::from_le_bytes(bytes[4..].try_into().unwrap()), 3661);
    }

    #[test]
    fn truncates_fractional_seconds() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let until = now + Duration::from_millis(59_999);
        assert_eq!(HibernationCommand::until(until, now).seconds_until_wakeup, 59);
    }

    #[test]
    fn past_wakeup_is_zero() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let until = now - Duration::from_secs(30);
        assert_eq!(HibernationCommand::until(until, now).seconds_until_wakeup, 0);
    }

    #[test]
    fn huge_durations_saturate() {
        let now = SystemTime::UNIX_EPOCH;
        let until = now + Duration::from_secs(u64::from(u32::MAX) + 10);
        assert_eq!(
            HibernationCommand::until(until, now).seconds_until_wakeup,
            u32::MAX
        );
    }

    #[test]
    fn parses_encoded_command() {
        let cmd = HibernationCommand::new(86_400);
        assert_eq!(HibernationCommand::from_bytes(&cmd.to_bytes()).unwrap(), cmd);
    }

    #[test]
    fn rejects_bad_magic_and_short_input() {
        let mut bytes = HibernationCommand::new(5).to_bytes();
        bytes[0] = 0x1F;
        assert!(matches!(
            HibernationCommand::from_bytes(&bytes),
            Err(PayloadError::InvalidMagic(_))
        ));
        assert!(matches!(
            HibernationCommand::from_bytes(&bytes[..6]),
            Err(PayloadError::Truncated {
                expected: 8,
                actual: 6
            })
        ));
    }
}
