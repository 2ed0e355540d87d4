//! Single-pass line filter over a log stream.
//!
//! This module drives the read-match-emit loop: consume lines from a reader,
//! match each against the selected record grammar, normalize timestamps
//! against the configured offset, and write one output line per record until
//! the input ends or the record limit is reached.

use std::io::{BufRead, Write};

use thiserror::Error;

use super::parser::{LineParser, Mode};
use super::record::CaptureRecord;

/// Errors that can occur while running the filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Reading input or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a record as JSON failed
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output rendering for emitted records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Tab-separated fields, one record per line
    #[default]
    Tsv,
    /// One JSON object per line
    Json,
}

/// Filter configuration, constructed once at startup and passed in.
#[derive(Clone, Copy, Debug)]
pub struct FilterOptions {
    /// Which record kind to extract
    pub mode: Mode,
    /// Reference timestamp subtracted from every emitted time value
    pub offset_time: f64,
    /// Maximum number of records to emit; zero or negative means unlimited
    pub max_count: i64,
    /// Output rendering
    pub format: OutputFormat,
}

impl FilterOptions {
    /// Create options with the default TSV output format.
    pub fn new(mode: Mode, offset_time: f64, max_count: i64) -> Self {
        Self {
            mode,
            offset_time,
            max_count,
            format: OutputFormat::default(),
        }
    }

    /// True when the emitted-record limit applies.
    pub fn is_bounded(&self) -> bool {
        self.max_count > 0
    }
}

/// Counters describing one filter run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterSummary {
    /// Total lines consumed from the input
    pub lines_read: u64,
    /// Records matched and emitted
    pub emitted: u64,
    /// Grammar-matching lines skipped for carrying the `!` marker
    pub flagged: u64,
}

/// Run the filter over `input`, writing one line per matched record to
/// `output`.
///
/// Consumes lines until the input is exhausted, or stops as soon as the
/// emitted-record count reaches `max_count` when the limit is positive;
/// later lines are never read. Flagged lines and non-matching lines produce
/// no output and never advance the stop condition.
///
/// # Returns
/// The per-run counters. Output already written is not affected by a
/// trailing I/O error.
pub fn run_filter<R: BufRead, W: Write>(
    options: &FilterOptions,
    mut input: R,
    mut output: W,
) -> Result<FilterSummary, FilterError> {
    let parser = LineParser::new(options.mode);
    let mut summary = FilterSummary::default();
    let mut line = String::new();

    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        summary.lines_read += 1;

        let Some(event) = parser.parse_line(&line) else {
            continue;
        };
        if event.is_flagged() {
            summary.flagged += 1;
            continue;
        }

        let record = CaptureRecord::from_event(&event, options.offset_time);
        match options.format {
            OutputFormat::Tsv => writeln!(output, "{}", record.to_tsv())?,
            OutputFormat::Json => writeln!(output, "{}", serde_json::to_string(&record)?)?,
        }
        summary.emitted += 1;

        if options.is_bounded() && summary.emitted >= options.max_count as u64 {
            break;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_string(options: &FilterOptions, input: &str) -> (String, FilterSummary) {
        let mut output = Vec::new();
        let summary = run_filter(options, input.as_bytes(), &mut output).unwrap();
        (String::from_utf8(output).unwrap(), summary)
    }

    #[test]
    fn test_read_mode_emits_offset_adjusted_record() {
        let options = FilterOptions::new(Mode::Read, 1.0, 0);
        let input =
            "./VisualizerCapturedAudioDataBuffer(3): [R] count = 5, pos = 100, time = (10, 500000000)\n";

        let (output, summary) = run_to_string(&options, input);
        assert_eq!(output, "R\t5\t100\t9.5\n");
        assert_eq!(summary.emitted, 1);
        assert_eq!(summary.lines_read, 1);
    }

    #[test]
    fn test_write_mode_emits_both_times() {
        let options = FilterOptions::new(Mode::Write, 0.0, 0);
        let input =
            "./HQVisualizerCapturedAudioDataBuffer(1): [W] count = 2, pos = 50, time = (3, 0), datatime = (3, 250000000)\n";

        let (output, _) = run_to_string(&options, input);
        assert_eq!(output, "W\t2\t50\t3.0\t3.25\n");
    }

    #[test]
    fn test_non_matching_lines_are_skipped() {
        let options = FilterOptions::new(Mode::Read, 0.0, 0);
        let input = "\
unrelated noise
./VisualizerCapturedAudioDataBuffer(3): [R] count = 1, pos = 0, time = (1, 0)
I/AudioFlinger( 123): something else
./VisualizerCapturedAudioDataBuffer(3): [R] count = 2, pos = 8, time = (2, 0)
";

        let (output, summary) = run_to_string(&options, input);
        assert_eq!(output, "R\t1\t0\t1.0\nR\t2\t8\t2.0\n");
        assert_eq!(summary.lines_read, 4);
        assert_eq!(summary.emitted, 2);
        assert_eq!(summary.flagged, 0);
    }

    #[test]
    fn test_flagged_lines_never_emit_and_never_count() {
        // Two flagged lines surround a plain one; with a limit of 1 the
        // flagged lines must not trigger the stop condition early.
        let options = FilterOptions::new(Mode::Read, 0.0, 1);
        let input = "\
./VisualizerCapturedAudioDataBuffer(3): [R!] count = 1, pos = 0, time = (1, 0)
./VisualizerCapturedAudioDataBuffer(3): [R!] count = 2, pos = 0, time = (2, 0)
./VisualizerCapturedAudioDataBuffer(3): [R] count = 3, pos = 4, time = (3, 0)
";

        let (output, summary) = run_to_string(&options, input);
        assert_eq!(output, "R\t3\t4\t3.0\n");
        assert_eq!(summary.flagged, 2);
        assert_eq!(summary.emitted, 1);
    }

    #[test]
    fn test_limit_stops_before_reading_further_lines() {
        let options = FilterOptions::new(Mode::Write, 0.0, 1);
        let input = "\
./VisualizerCapturedAudioDataBuffer(1): [W] count = 1, pos = 0, time = (1, 0), datatime = (1, 0)
./VisualizerCapturedAudioDataBuffer(1): [W] count = 2, pos = 0, time = (2, 0), datatime = (2, 0)
./VisualizerCapturedAudioDataBuffer(1): [W] count = 3, pos = 0, time = (3, 0), datatime = (3, 0)
";

        let (output, summary) = run_to_string(&options, input);
        assert_eq!(output, "W\t1\t0\t1.0\t1.0\n");
        assert_eq!(summary.emitted, 1);
        // The run stopped at the limit; the remaining lines were not read.
        assert_eq!(summary.lines_read, 1);
    }

    #[test]
    fn test_limit_larger_than_input_emits_everything() {
        let options = FilterOptions::new(Mode::Read, 0.0, 10);
        let input = "\
./VisualizerCapturedAudioDataBuffer(3): [R] count = 1, pos = 0, time = (1, 0)
./VisualizerCapturedAudioDataBuffer(3): [R] count = 2, pos = 0, time = (2, 0)
";

        let (_, summary) = run_to_string(&options, input);
        assert_eq!(summary.emitted, 2);
    }

    #[test]
    fn test_zero_and_negative_limits_are_unbounded() {
        let input = "\
./VisualizerCapturedAudioDataBuffer(3): [R] count = 1, pos = 0, time = (1, 0)
./VisualizerCapturedAudioDataBuffer(3): [R] count = 2, pos = 0, time = (2, 0)
./VisualizerCapturedAudioDataBuffer(3): [R] count = 3, pos = 0, time = (3, 0)
";

        for max_count in [0, -1, -100] {
            let options = FilterOptions::new(Mode::Read, 0.0, max_count);
            assert!(!options.is_bounded());

            let (_, summary) = run_to_string(&options, input);
            assert_eq!(summary.emitted, 3);
            assert_eq!(summary.lines_read, 3);
        }
    }

    #[test]
    fn test_records_keep_input_order() {
        let options = FilterOptions::new(Mode::Read, 0.0, 0);
        let input = "\
./VisualizerCapturedAudioDataBuffer(3): [R] count = 9, pos = 0, time = (9, 0)
./VisualizerCapturedAudioDataBuffer(3): [R] count = 4, pos = 0, time = (4, 0)
./VisualizerCapturedAudioDataBuffer(3): [R] count = 7, pos = 0, time = (7, 0)
";

        let (output, _) = run_to_string(&options, input);
        assert_eq!(output, "R\t9\t0\t9.0\nR\t4\t0\t4.0\nR\t7\t0\t7.0\n");
    }

    #[test]
    fn test_empty_input() {
        let options = FilterOptions::new(Mode::Read, 0.0, 0);
        let (output, summary) = run_to_string(&options, "");
        assert!(output.is_empty());
        assert_eq!(summary, FilterSummary::default());
    }

    #[test]
    fn test_json_output_format() {
        let mut options = FilterOptions::new(Mode::Write, 1.0, 0);
        options.format = OutputFormat::Json;
        let input =
            "./VisualizerCapturedAudioDataBuffer(1): [W] count = 2, pos = 50, time = (3, 0), datatime = (3, 250000000)\n";

        let (output, _) = run_to_string(&options, input);
        assert_eq!(
            output,
            "{\"tag\":\"W\",\"count\":2,\"pos\":50,\"time\":2.0,\"datatime\":2.25}\n"
        );
    }
}
