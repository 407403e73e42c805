//! DAQ Threshold Decoder Library
//!
//! A stateless, reusable library for decoding the raw log records of a
//! GPS-synchronized four-channel DAQ into threshold-crossing timestamps.
//!
//! # Architecture
//!
//! Decoding is a single batch pass over one source file:
//! - Records are grouped into event blocks by the "new event" marker
//! - Each block is decoded, its oscillator frequency estimated from the PPS
//!   references, and all edge times normalized to nanoseconds since event start
//! - Unmatched edges are trimmed and every rise/fall pair is emitted as a
//!   Julian-day timestamp record
//!
//! Events are independent of each other; a malformed event is reported and
//! skipped without affecting the rest of the file.
//!
//! The library does NOT:
//! - Sort or persist records
//! - Split output by channel
//!
//! Those concerns live in the application layer (daq-threshold-cli).
//!
//! # Example Usage
//!
//! ```
//! use daq_threshold_decoder::{Decoder, DecoderConfig};
//!
//! let lines = [
//!     "687C4047 80 00 2B 00 00 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053",
//!     "687C4048 00 00 00 28 00 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053",
//! ];
//!
//! let decoder = Decoder::new(DecoderConfig::new().with_parallel(false));
//! let output = decoder.decode_lines(&lines, "6148");
//!
//! for record in &output.records {
//!     println!("{}", record);
//! }
//! assert_eq!(output.records.len(), 1);
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod event;
pub mod formatter;
pub mod julian;
pub mod record;
pub mod segmenter;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use decoder::{source_id, DecodeOutput, DecodeSummary, Decoder};
pub use event::EventReconstructor;
pub use formatter::format_event;
pub use segmenter::{segment_events, EventBlock};
pub use types::{
    ChannelEdges, DecodedLine, DecoderError, EdgeMeasurement, Event, Result, StatusFlags,
    ThresholdRecord, NUM_CHANNELS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
