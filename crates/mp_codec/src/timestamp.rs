use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A point in time as carried by the timestamp extension (type `-1`).
///
/// Seconds are relative to the Unix epoch and may be negative. Nanoseconds
/// always count forward from `seconds` and stay below one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    seconds: i64,
    nanoseconds: u32,
}

impl Timestamp {
    /// Reserved extension type code of timestamps.
    pub const EXTENSION_TYPE: i8 = -1;

    pub const UNIX_EPOCH: Self = Self {
        seconds: 0,
        nanoseconds: 0,
    };

    /// Returns `None` if `nanoseconds` is one second or more.
    #[inline]
    pub const fn new(seconds: i64, nanoseconds: u32) -> Option<Self> {
        if nanoseconds < NANOS_PER_SEC {
            Some(Self {
                seconds,
                nanoseconds,
            })
        } else {
            None
        }
    }

    #[inline]
    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    #[inline]
    pub const fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    /// Length of the smallest payload that represents this timestamp.
    ///
    /// - 4 bytes: no nanoseconds and seconds fit in `u32`.
    /// - 8 bytes: seconds fit in 34 unsigned bits.
    /// - 12 bytes: anything else.
    pub const fn payload_len(&self) -> u32 {
        if self.seconds >> 34 == 0 {
            if self.nanoseconds == 0 && self.seconds <= u32::MAX as i64 {
                4
            } else {
                8
            }
        } else {
            12
        }
    }

    /// Writes the compact payload into `dst`, returning the bytes written.
    ///
    /// `dst` must hold at least [`payload_len`](Self::payload_len) bytes.
    pub(crate) fn encode_payload(&self, dst: &mut [u8]) -> usize {
        match self.payload_len() {
            4 => {
                dst[..4].copy_from_slice(&(self.seconds as u32).to_be_bytes());
                4
            }
            8 => {
                let packed = (u64::from(self.nanoseconds) << 34) | self.seconds as u64;
                dst[..8].copy_from_slice(&packed.to_be_bytes());
                8
            }
            _ => {
                dst[..4].copy_from_slice(&self.nanoseconds.to_be_bytes());
                dst[4..12].copy_from_slice(&self.seconds.to_be_bytes());
                12
            }
        }
    }

    /// Decodes a 4, 8 or 12 byte payload.
    pub(crate) fn decode_payload(payload: &[u8]) -> Option<Self> {
        match *payload {
            [a, b, c, d] => Some(Self {
                seconds: i64::from(u32::from_be_bytes([a, b, c, d])),
                nanoseconds: 0,
            }),
            [a, b, c, d, e, f, g, h] => {
                let packed = u64::from_be_bytes([a, b, c, d, e, f, g, h]);
                Self::new((packed & 0x3_ffff_ffff) as i64, (packed >> 34) as u32)
            }
            [a, b, c, d, ref rest @ ..] if rest.len() == 8 => {
                let mut secs = [0u8; 8];
                secs.copy_from_slice(rest);
                Self::new(i64::from_be_bytes(secs), u32::from_be_bytes([a, b, c, d]))
            }
            _ => None,
        }
    }

    /// Converts back into a `SystemTime`, or `None` if it is out of range
    /// for the platform clock.
    pub fn to_system_time(&self) -> Option<SystemTime> {
        if self.seconds >= 0 {
            let since = Duration::new(self.seconds as u64, self.nanoseconds);
            UNIX_EPOCH.checked_add(since)
        } else {
            let back = Duration::from_secs(self.seconds.unsigned_abs());
            UNIX_EPOCH
                .checked_sub(back)?
                .checked_add(Duration::from_nanos(u64::from(self.nanoseconds)))
        }
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self {
                seconds: after.as_secs() as i64,
                nanoseconds: after.subsec_nanos(),
            },
            Err(err) => {
                let before = err.duration();
                let mut seconds = -(before.as_secs() as i64);
                let mut nanoseconds = before.subsec_nanos();
                if nanoseconds > 0 {
                    seconds -= 1;
                    nanoseconds = NANOS_PER_SEC - nanoseconds;
                }
                Self {
                    seconds,
                    nanoseconds,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_forms() {
        assert_eq!(Timestamp::new(1, 0).unwrap().payload_len(), 4);
        assert_eq!(Timestamp::new(u32::MAX as i64, 0).unwrap().payload_len(), 4);
        assert_eq!(Timestamp::new(1, 1).unwrap().payload_len(), 8);
        assert_eq!(Timestamp::new(u32::MAX as i64 + 1, 0).unwrap().payload_len(), 8);
        assert_eq!(Timestamp::new(1 << 34, 0).unwrap().payload_len(), 12);
        assert_eq!(Timestamp::new(-1, 0).unwrap().payload_len(), 12);
    }

    #[test]
    fn ts64_bit_layout() {
        let ts = Timestamp::new(5, 3).unwrap();
        let mut buf = [0u8; 12];
        assert_eq!(ts.encode_payload(&mut buf), 8);
        let packed = u64::from_be_bytes(buf[..8].try_into().unwrap());
        assert_eq!(packed, (3u64 << 34) | 5);
        assert_eq!(Timestamp::decode_payload(&buf[..8]), Some(ts));
    }

    #[test]
    fn ts96_layout() {
        let ts = Timestamp::new(-2, 500).unwrap();
        let mut buf = [0u8; 12];
        assert_eq!(ts.encode_payload(&mut buf), 12);
        assert_eq!(&buf[..4], &500u32.to_be_bytes());
        assert_eq!(&buf[4..], &(-2i64).to_be_bytes());
        assert_eq!(Timestamp::decode_payload(&buf), Some(ts));
    }

    #[test]
    fn rejects_bad_payloads() {
        assert_eq!(Timestamp::decode_payload(&[0; 5]), None);
        // nanoseconds field of 2^30 - 1 exceeds one second
        let packed = (0x3fff_ffffu64 << 34).to_be_bytes();
        assert_eq!(Timestamp::decode_payload(&packed), None);
    }

    #[test]
    fn system_time_before_epoch() {
        let time = UNIX_EPOCH - Duration::from_millis(1500);
        let ts = Timestamp::from(time);
        assert_eq!(ts.seconds(), -2);
        assert_eq!(ts.nanoseconds(), 500_000_000);
        assert_eq!(ts.to_system_time(), Some(time));
    }

    #[test]
    fn system_time_after_epoch() {
        let time = UNIX_EPOCH + Duration::new(1_700_000_000, 42);
        let ts = Timestamp::from(time);
        assert_eq!(ts, Timestamp::new(1_700_000_000, 42).unwrap());
        assert_eq!(ts.to_system_time(), Some(time));
    }
}
