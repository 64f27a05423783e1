//! Frame-exact `HH:MM:SS:FF` timecode codec at a fixed frame rate.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Fixed playback frame rate used for all timecode math.
pub const FRAME_RATE: u64 = 25;
/// Duration of one frame in milliseconds.
pub const FRAME_MS: u64 = 1000 / FRAME_RATE;

/// Rejection raised when timecode text cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimecodeError {
    /// Input was not four colon-separated two-digit groups.
    #[error("timecode must have the shape HH:MM:SS:FF")]
    BadShape,
}

/// A frame-exact instant, displayed as `HH:MM:SS:FF`.
///
/// Only the textual shape is validated; group values are taken as-is, so
/// `00:00:99:99` parses and converts by the same arithmetic as any other value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timecode {
    /// Hour group.
    pub hours: u8,
    /// Minute group.
    pub minutes: u8,
    /// Second group.
    pub seconds: u8,
    /// Frame group, counted at [`FRAME_RATE`] per second.
    pub frames: u8,
}

impl Timecode {
    /// The zero timecode `00:00:00:00`.
    pub const ZERO: Timecode = Timecode {
        hours: 0,
        minutes: 0,
        seconds: 0,
        frames: 0,
    };

    /// Converts a millisecond position to the nearest-not-after frame boundary.
    ///
    /// The sub-frame remainder (at most [`FRAME_MS`] - 1 ms) is dropped, so one
    /// round trip through [`Timecode::millis`] stabilizes. Hours saturate at 99
    /// to stay within the two-digit display field.
    pub fn from_millis(ms: u64) -> Self {
        let frames = (ms % 1000) / FRAME_MS;
        let total_secs = ms / 1000;
        let hours = (total_secs / 3600).min(99);
        Self {
            hours: hours as u8,
            minutes: ((total_secs / 60) % 60) as u8,
            seconds: (total_secs % 60) as u8,
            frames: frames as u8,
        }
    }

    /// Millisecond position of this timecode.
    pub fn millis(self) -> u64 {
        let secs = u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds);
        secs * 1000 + u64::from(self.frames) * FRAME_MS
    }
}

impl FromStr for Timecode {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut groups = [0u8; 4];
        let mut parts = s.split(':');
        for slot in &mut groups {
            let part = parts.next().ok_or(TimecodeError::BadShape)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TimecodeError::BadShape);
            }
            *slot = part.parse().map_err(|_| TimecodeError::BadShape)?;
        }
        if parts.next().is_some() {
            return Err(TimecodeError::BadShape);
        }
        Ok(Self {
            hours: groups[0],
            minutes: groups[1],
            seconds: groups[2],
            frames: groups[3],
        })
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

/// Parses `HH:MM:SS:FF` text into a millisecond position.
pub fn decode(text: &str) -> Result<u64, TimecodeError> {
    Ok(text.parse::<Timecode>()?.millis())
}

/// Encodes a millisecond position as a timecode.
pub fn encode(ms: u64) -> Timecode {
    Timecode::from_millis(ms)
}
