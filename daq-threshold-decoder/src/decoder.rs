//! Main decoder API
//!
//! This module provides the primary interface for the decoder library. The
//! [`Decoder`] runs the whole pipeline over one source file: segmentation,
//! per-event reconstruction and timestamp formatting.

use crate::config::DecoderConfig;
use crate::event::EventReconstructor;
use crate::formatter::format_event;
use crate::segmenter::{segment_events, EventBlock};
use crate::types::{DecoderError, Result, ThresholdRecord};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;

/// Number of leading file-name characters used as the source identifier
const SOURCE_ID_LEN: usize = 4;

/// Statistics collected while decoding one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeSummary {
    pub source_id: String,
    pub lines_read: usize,
    pub lines_discarded: usize,
    pub event_blocks: usize,
    pub events_reconstructed: usize,
    pub events_failed: usize,
    pub records: usize,
    pub gps_invalid_events: usize,
    pub gps_invalid_lines: usize,
    pub status_warning_lines: usize,
}

/// Output of decoding one source
#[derive(Debug, Default)]
pub struct DecodeOutput {
    /// Records in event order, then channel order, then pair order
    pub records: Vec<ThresholdRecord>,
    /// Events that could not be reconstructed, in event order
    pub failures: Vec<DecoderError>,
    pub summary: DecodeSummary,
}

/// Per-event result before merging into the summary
struct EventOutput {
    records: Vec<ThresholdRecord>,
    gps_valid: bool,
    gps_invalid_lines: usize,
    status_warning_lines: usize,
}

/// The main decoder struct - entry point for all decoding operations
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a new decoder instance
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Settings this decoder was built with
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a source file, labelling records with its [`source_id`]
    ///
    /// # Example
    /// ```no_run
    /// use daq_threshold_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::default();
    /// let output = decoder.decode_file(Path::new("6148.2016.0518.1")).unwrap();
    /// for record in &output.records {
    ///     println!("{}", record);
    /// }
    /// ```
    pub fn decode_file(&self, path: &Path) -> Result<DecodeOutput> {
        log::info!("Decoding DAQ file: {:?}", path);

        let bytes = std::fs::read(path)?;
        let content = String::from_utf8(bytes).unwrap_or_else(|e| {
            log::warn!("DAQ file is not UTF-8, falling back to Latin-1: {:?}", path);
            e.into_bytes().iter().map(|&b| b as char).collect()
        });

        let lines: Vec<&str> = content.lines().collect();
        Ok(self.decode_lines(&lines, &source_id(path)))
    }

    /// Decode the lines of one source
    ///
    /// A block that fails to decode is reported in
    /// [`DecodeOutput::failures`] and does not affect other blocks.
    pub fn decode_lines<S>(&self, lines: &[S], id: &str) -> DecodeOutput
    where
        S: AsRef<str> + Sync,
    {
        let segmentation = segment_events(lines);
        let reconstructor = EventReconstructor::new(self.config.nominal_frequency_hz);

        let process = |block: &EventBlock<'_>| -> Result<EventOutput> {
            let event = reconstructor.reconstruct_block(block)?;
            let records = format_event(&event, id).map_err(|e| DecoderError::Event {
                index: block.index,
                source: Box::new(e),
            })?;
            log::debug!(
                "Event {} (line {}): {} lines, {:.0} Hz, {} records",
                block.index,
                block.first_line,
                event.lines.len(),
                event.clock_frequency_hz,
                records.len()
            );
            Ok(EventOutput {
                records,
                gps_valid: event.gps_valid(),
                gps_invalid_lines: event.lines.iter().filter(|l| !l.gps_valid).count(),
                status_warning_lines: event.lines.iter().filter(|l| !l.status.ok()).count(),
            })
        };

        // collect() keeps event order regardless of completion order
        let results: Vec<Result<EventOutput>> = if self.config.parallel {
            segmentation.blocks.par_iter().map(process).collect()
        } else {
            segmentation.blocks.iter().map(process).collect()
        };

        let mut output = DecodeOutput {
            summary: DecodeSummary {
                source_id: id.to_string(),
                lines_read: lines.len(),
                lines_discarded: segmentation.discarded,
                event_blocks: segmentation.blocks.len(),
                ..DecodeSummary::default()
            },
            ..DecodeOutput::default()
        };

        for result in results {
            match result {
                Ok(event) => {
                    output.summary.events_reconstructed += 1;
                    if !event.gps_valid {
                        output.summary.gps_invalid_events += 1;
                    }
                    output.summary.gps_invalid_lines += event.gps_invalid_lines;
                    output.summary.status_warning_lines += event.status_warning_lines;
                    output.records.extend(event.records);
                }
                Err(e) => {
                    log::warn!("Skipping event: {}", e);
                    output.summary.events_failed += 1;
                    output.failures.push(e);
                }
            }
        }
        output.summary.records = output.records.len();

        log::info!(
            "Decoded {} events ({} failed) into {} records for {}",
            output.summary.events_reconstructed,
            output.summary.events_failed,
            output.summary.records,
            id
        );

        output
    }
}

/// Identifier used to label records: the first characters of the file name
pub fn source_id(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.chars().take(SOURCE_ID_LEN).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: [&str; 4] = [
        "687C4047 80 00 2B 00 00 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053",
        "687C4047 00 00 00 00 3A 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053",
        "687C4048 00 00 00 28 00 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053",
        "687C4048 00 00 00 00 00 36 00 00 67037CB8 000322.027 180516 V 03 4 +0053",
    ];

    #[test]
    fn test_source_id() {
        assert_eq!(source_id(Path::new("data/6148.2016.0518.1")), "6148");
        assert_eq!(source_id(Path::new("ab")), "ab");
        assert_eq!(source_id(Path::new("/")), "");
    }

    #[test]
    fn test_decode_lines_summary() {
        let decoder = Decoder::default();
        let output = decoder.decode_lines(&EXAMPLE, "6148");

        assert_eq!(output.records.len(), 2);
        assert!(output.failures.is_empty());
        assert_eq!(output.summary.event_blocks, 1);
        assert_eq!(output.summary.events_reconstructed, 1);
        assert_eq!(output.summary.gps_invalid_events, 1);
        assert_eq!(output.summary.gps_invalid_lines, 1);
        assert_eq!(output.summary.status_warning_lines, 1);
        assert_eq!(output.summary.records, 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut lines = Vec::new();
        for _ in 0..50 {
            lines.extend_from_slice(&EXAMPLE);
        }

        let sequential_decoder = Decoder::new(DecoderConfig::new().with_parallel(false));
        assert!(!sequential_decoder.config().parallel);

        let parallel = Decoder::new(DecoderConfig::new().with_parallel(true))
            .decode_lines(&lines, "6148");
        let sequential = sequential_decoder.decode_lines(&lines, "6148");

        assert_eq!(parallel.records.len(), 100);
        assert_eq!(parallel.records, sequential.records);
        assert_eq!(parallel.summary, sequential.summary);
    }
}
