//! Presentation clock reconstruction from 33-bit clock-reference samples.
//!
//! Every sample is unwrapped to the value congruent to it modulo 2^33 that
//! lies closest to the clock so far, then the clock only ever moves forward.
//! This survives any number of wraps as long as consecutive samples are less
//! than 2^32 ticks (about 13 hours) apart.

use log::{debug, info};

/// Clock ticks per second (PCR base and PTS both run at 90 kHz).
pub const TICKS_PER_SECOND: u64 = 90_000;

/// Period of the 33-bit timestamp fields.
pub const CLOCK_WRAP: u64 = 1 << 33;

const HALF_WRAP: u64 = CLOCK_WRAP / 2;

/// Wrap-safe, non-decreasing presentation clock.
#[derive(Debug, Default)]
pub struct ClockTracker {
    reference_pid: Option<u16>,
    epoch: Option<u64>,
    current: u64,
    samples: u64,
}

impl ClockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the clock-reference PID. The first choice sticks; later calls
    /// with a different PID are refused and return false.
    pub fn set_reference_pid(&mut self, pid: u16) -> bool {
        match self.reference_pid {
            None => {
                info!("[Clock] reference PID 0x{:04X}", pid);
                self.reference_pid = Some(pid);
                true
            }
            Some(current) if current == pid => true,
            Some(current) => {
                debug!(
                    "[Clock] keeping reference PID 0x{:04X}, ignoring 0x{:04X}",
                    current, pid
                );
                false
            }
        }
    }

    pub fn reference_pid(&self) -> Option<u16> {
        self.reference_pid
    }

    /// Fold in a raw sample taken in stream order and return the adjusted clock.
    pub fn observe(&mut self, raw: u64) -> u64 {
        let raw = raw % CLOCK_WRAP;
        self.samples += 1;
        match self.epoch {
            None => {
                debug!("[Clock] epoch {}", raw);
                self.epoch = Some(raw);
                self.current = raw;
            }
            Some(_) => {
                let unwrapped = unwrap_near(raw, self.current);
                if unwrapped / CLOCK_WRAP > self.current / CLOCK_WRAP {
                    debug!("[Clock] wrap detected at sample {}", self.samples);
                }
                self.current = self.current.max(unwrapped);
            }
        }
        self.current
    }

    /// First sample seen, the zero point of every relative timestamp.
    pub fn epoch(&self) -> Option<u64> {
        self.epoch
    }

    /// Adjusted clock value, `None` before the first sample.
    pub fn now(&self) -> Option<u64> {
        self.epoch.map(|_| self.current)
    }

    /// Ticks elapsed since the epoch.
    pub fn elapsed(&self) -> u64 {
        self.epoch
            .map(|epoch| self.current - epoch)
            .unwrap_or(0)
    }

    /// Convert a raw 33-bit PTS into ticks relative to the epoch.
    ///
    /// Returns `None` when no clock sample has been seen yet. A PTS slightly
    /// before the epoch is clamped to zero.
    pub fn relative_pts(&self, raw_pts: u64) -> Option<u64> {
        let epoch = self.epoch?;
        let unwrapped = unwrap_near(raw_pts % CLOCK_WRAP, self.current);
        Some(unwrapped.saturating_sub(epoch))
    }
}

/// The value congruent to `raw` modulo 2^33 that lies closest to `reference`.
fn unwrap_near(raw: u64, reference: u64) -> u64 {
    let candidate = reference - reference % CLOCK_WRAP + raw;
    if candidate + HALF_WRAP < reference {
        candidate + CLOCK_WRAP
    } else if candidate > reference + HALF_WRAP && candidate >= CLOCK_WRAP {
        candidate - CLOCK_WRAP
    } else {
        candidate
    }
}
