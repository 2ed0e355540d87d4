//! Capture buffer event and record structures.
//!
//! This module defines the data structures for representing capture buffer
//! events extracted from log lines, along with timestamp conversion and
//! output rendering for emitted records.

use serde::Serialize;

/// A timestamp captured as an integer seconds / nanoseconds pair.
///
/// The nanoseconds component is a fixed-point fractional second in range
/// [0, 1e9), as produced by `clock_gettime` on the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    /// Whole seconds component
    pub secs: u64,
    /// Fractional component in nanoseconds
    pub nanos: u64,
}

impl Timestamp {
    /// Convert to floating-point seconds.
    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.secs as f64 + self.nanos as f64 * 1e-9
    }
}

/// One event matched from a single log line, before offset normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferEvent {
    /// A read from the capture buffer.
    Read {
        /// True when the read was rejected (`[R!]` marker)
        flagged: bool,
        /// Running read counter from the buffer
        count: u64,
        /// Read position in frames
        pos: u64,
        /// Wall-clock time of the read
        time: Timestamp,
    },
    /// A write into the capture buffer.
    Write {
        /// True when the write detected concurrent-writer corruption
        /// (`[W!]` marker)
        flagged: bool,
        /// Running write counter from the buffer
        count: u64,
        /// Write position in frames
        pos: u64,
        /// Wall-clock time of the write
        time: Timestamp,
        /// Capture timestamp of the audio data itself
        datatime: Timestamp,
    },
}

impl BufferEvent {
    /// True when the source line carried the `!` marker.
    ///
    /// Flagged events are diagnostic noise (rejected reads, corrupted
    /// writes) and are excluded from output.
    pub fn is_flagged(&self) -> bool {
        match self {
            Self::Read { flagged, .. } | Self::Write { flagged, .. } => *flagged,
        }
    }
}

/// An emitted record with timestamps normalized against the offset.
///
/// Records are transient: constructed from one matched line, rendered
/// immediately, then discarded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "tag")]
pub enum CaptureRecord {
    /// A buffer read record.
    #[serde(rename = "R")]
    Read {
        /// Running read counter
        count: u64,
        /// Read position in frames
        pos: u64,
        /// Read time in seconds, relative to the offset
        time: f64,
    },
    /// A buffer write record.
    #[serde(rename = "W")]
    Write {
        /// Running write counter
        count: u64,
        /// Write position in frames
        pos: u64,
        /// Write time in seconds, relative to the offset
        time: f64,
        /// Capture time of the data in seconds, relative to the offset
        datatime: f64,
    },
}

impl CaptureRecord {
    /// Build an output record from a matched event, subtracting
    /// `offset_time` from every timestamp independently.
    pub fn from_event(event: &BufferEvent, offset_time: f64) -> Self {
        match *event {
            BufferEvent::Read {
                count, pos, time, ..
            } => Self::Read {
                count,
                pos,
                time: time.as_secs_f64() - offset_time,
            },
            BufferEvent::Write {
                count,
                pos,
                time,
                datatime,
                ..
            } => Self::Write {
                count,
                pos,
                time: time.as_secs_f64() - offset_time,
                datatime: datatime.as_secs_f64() - offset_time,
            },
        }
    }

    /// Render as a tab-separated line: tag, count, pos, then time fields.
    pub fn to_tsv(&self) -> String {
        match self {
            Self::Read { count, pos, time } => {
                format!("R\t{}\t{}\t{}", count, pos, format_seconds(*time))
            }
            Self::Write {
                count,
                pos,
                time,
                datatime,
            } => format!(
                "W\t{}\t{}\t{}\t{}",
                count,
                pos,
                format_seconds(*time),
                format_seconds(*datatime)
            ),
        }
    }
}

/// Format a seconds value, always keeping a decimal point.
///
/// Whole values render as `3.0` rather than `3` so they stay recognizable
/// as times; fractional values use the shortest round-trip form.
pub fn format_seconds(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
