//! Packet timestamp parsing
//!
//! Timestamps appear as `YYYY-MM-DD hh:mm:ss` with an optional fractional
//! second, and are interpreted at a fixed +8h offset from the parsed wall
//! time. Two resolutions exist because the modes need different ones: range
//! filtering compares whole seconds, dedup and reorder compare microseconds.

use chrono::NaiveDateTime;

/// Fixed offset applied to every parsed timestamp (UTC+8).
pub const TIMEZONE_OFFSET_SECS: i64 = 28_800;

/// A packet timestamp converted to unix time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketTime {
    secs: i64,
    micros: u32,
}

impl PacketTime {
    /// Parse `YYYY-MM-DD hh:mm:ss[.fraction]`.
    ///
    /// Returns `None` when the string does not match; callers treat that as
    /// a soft per-record condition, not a fatal error.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .ok()?;
        let utc = naive.and_utc();
        Some(Self {
            secs: utc.timestamp() + TIMEZONE_OFFSET_SECS,
            micros: utc.timestamp_subsec_micros(),
        })
    }

    /// Whole-second unix time, fraction discarded.
    pub fn unix_seconds(&self) -> i64 {
        self.secs
    }

    /// Microsecond unix time.
    pub fn unix_micros(&self) -> i64 {
        self.secs * 1_000_000 + i64::from(self.micros)
    }
}

#[cfg(test)]
#[path = "timestamp_test.rs"]
mod tests;
