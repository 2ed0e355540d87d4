//! Regex parser for capture buffer log lines.
//!
//! This module matches the logcat output emitted by the visualizer capture
//! buffers (`V/VisualizerCapturedAudioDataBuffer( 1234): [R] ...`) and
//! converts matching lines into `BufferEvent` values. The leading `.` in the
//! patterns covers the logcat priority character, the optional `HQ` prefix
//! covers the high-quality visualizer buffer, and the parenthesized group is
//! the space-padded PID logcat prints after the tag.

use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use super::record::{BufferEvent, Timestamp};

/// Record kind selector: buffer reads or buffer writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Extract `[R]` read records
    Read,
    /// Extract `[W]` write records
    Write,
}

/// Error returned when a mode string is neither "R" nor "W".
#[derive(Debug, Error)]
#[error("invalid mode '{0}': expected 'R' or 'W'")]
pub struct InvalidMode(String);

impl FromStr for Mode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R" => Ok(Mode::Read),
            "W" => Ok(Mode::Write),
            other => Err(InvalidMode(other.to_string())),
        }
    }
}

impl Mode {
    /// The tag letter this mode extracts.
    pub fn tag(&self) -> &'static str {
        match self {
            Mode::Read => "R",
            Mode::Write => "W",
        }
    }
}

// ============================================================================
// Line grammars
// ============================================================================

/// Read lines: `[R]` (or the rejected-read marker `[R!]`) with counter,
/// position and read time.
const READ_LINE_PATTERN: &str = r"^./H?Q?VisualizerCapturedAudioDataBuffer\([ 0-9]+\): \[(R!?)\] count = ([0-9]+), pos = ([0-9]+), time = \(([0-9]+), ([0-9]+)\)";

/// Write lines: `[W]` (or the corrupted-write marker `[W!]`) with counter,
/// position, write time and the capture time of the data.
const WRITE_LINE_PATTERN: &str = r"^./H?Q?VisualizerCapturedAudioDataBuffer\([ 0-9]+\): \[(W!?)\] count = ([0-9]+), pos = ([0-9]+), time = \(([0-9]+), ([0-9]+)\), datatime = \(([0-9]+), ([0-9]+)\)";

/// Compiled line matcher for one record kind.
pub struct LineParser {
    mode: Mode,
    pattern: Regex,
}

impl LineParser {
    /// Compile the matcher for the given mode.
    pub fn new(mode: Mode) -> Self {
        let pattern = match mode {
            Mode::Read => Regex::new(READ_LINE_PATTERN).unwrap(),
            Mode::Write => Regex::new(WRITE_LINE_PATTERN).unwrap(),
        };
        Self { mode, pattern }
    }

    /// Match one log line, returning the event it carries.
    ///
    /// Returns `None` for lines that do not match the grammar; such lines
    /// are other log output, not errors. Numeric groups that do not fit the
    /// field types also yield `None` (the grammar constrains them to digits,
    /// so this only triggers on out-of-range values).
    pub fn parse_line(&self, line: &str) -> Option<BufferEvent> {
        let caps = self.pattern.captures(line)?;

        let flagged = caps[1].ends_with('!');
        let count = caps[2].parse().ok()?;
        let pos = caps[3].parse().ok()?;
        let time = Timestamp {
            secs: caps[4].parse().ok()?,
            nanos: caps[5].parse().ok()?,
        };

        match self.mode {
            Mode::Read => Some(BufferEvent::Read {
                flagged,
                count,
                pos,
                time,
            }),
            Mode::Write => Some(BufferEvent::Write {
                flagged,
                count,
                pos,
                time,
                datatime: Timestamp {
                    secs: caps[6].parse().ok()?,
                    nanos: caps[7].parse().ok()?,
                },
            }),
        }
    }
}
