//! RFC 868 time protocol.
//!
//! The server sends four bytes, big-endian seconds since 1900-01-01, and
//! closes.  Nothing is sent by the client.

use crate::error::SyncError;

pub const TIME_HOST: &str = "time.nist.gov";
pub const TIME_PORT: u16 = 37;

/// How long to wait for the four bytes.
pub const RESPONSE_TIMEOUT_MS: u32 = 5_000;

/// Seconds between 1900-01-01 and 1970-01-01.
pub const EPOCH_1900_OFFSET: u32 = 2_208_988_800;

/// 2017-01-01T00:00:00Z.  Anything earlier is rejected.
pub const MIN_PLAUSIBLE: u32 = 1_483_228_800;
/// 2030-01-01T00:00:00Z.  Anything later is rejected.
pub const MAX_PLAUSIBLE: u32 = 1_893_456_000;

/// Decode a response into a Unix epoch, range-checked.
pub fn decode(bytes: [u8; 4]) -> Result<u32, SyncError> {
    let unix = u32::from_be_bytes(bytes).wrapping_sub(EPOCH_1900_OFFSET);
    if (MIN_PLAUSIBLE..=MAX_PLAUSIBLE).contains(&unix) {
        Ok(unix)
    } else {
        Err(SyncError::OutOfRange)
    }
}
