//! Time keeping module for PineTime

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use embassy_time::Instant;

/// Wall-clock time (UTC) anchored to a system instant
#[derive(Clone, Copy)]
pub struct TimeReference {
    /// Clock time
    time: NaiveDateTime,
    /// Related system time
    instant: Instant,
}

impl TimeReference {
    /// Create new time reference from NaiveDateTime
    pub fn from_datetime(time: NaiveDateTime) -> Self {
        Self {
            time,
            instant: Instant::now(),
        }
    }

    /// Create new time reference from seconds since the Unix epoch
    pub fn from_timestamp(secs: i64) -> Self {
        let time = DateTime::from_timestamp(secs, 0)
            .map(|t| t.naive_utc())
            .unwrap_or(NaiveDateTime::UNIX_EPOCH);
        Self::from_datetime(time)
    }

    /// Create new time reference from a Current Time Service value.
    ///
    /// Returns `None` for a date or time that does not exist.
    pub fn from_cts_bytes(bytes: &[u8; 10]) -> Option<Self> {
        let year = u16::from_le_bytes([bytes[0], bytes[1]]) as i32;
        let month = bytes[2] as u32;
        let day = bytes[3] as u32;
        let hour = bytes[4] as u32;
        let min = bytes[5] as u32;
        let sec = bytes[6] as u32;
        // bytes[7] is the day of week, bytes[9] the adjust reason
        let milli = bytes[8] as u32 * 1000 / 256; // fractions_256

        let time = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_milli_opt(hour, min, sec, milli)?;
        Some(Self::from_datetime(time))
    }
}

pub struct TimeManager {
    reference: TimeReference,
}

impl TimeManager {
    /// Start counting from a known UTC timestamp
    pub fn init(epoch_secs: i64) -> Self {
        Self {
            reference: TimeReference::from_timestamp(epoch_secs),
        }
    }

    /// Current UTC time
    pub fn utc_now(&self) -> NaiveDateTime {
        let elapsed = Instant::now().duration_since(self.reference.instant);
        self.reference.time + Duration::microseconds(elapsed.as_micros() as i64)
    }

    /// Current local time for a fixed offset to UTC
    pub fn local_now(&self, offset_secs: i32) -> NaiveDateTime {
        self.utc_now() + Duration::seconds(offset_secs as i64)
    }

    /// Update time reference
    pub fn set_time(&mut self, reference: TimeReference) {
        self.reference = reference;
    }
}
