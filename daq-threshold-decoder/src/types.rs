//! Core types for the DAQ threshold decoder library
//!
//! This module defines the entities produced while decoding a DAQ log: the
//! bit-level measurements found in each record, the decoded record itself, the
//! reconstructed event, and the output records emitted per paired edge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Number of analog channels recorded by the DAQ
pub const NUM_CHANNELS: usize = 4;

/// Number of edge words per record (rise/fall for each channel)
pub const NUM_EDGE_SLOTS: usize = 2 * NUM_CHANNELS;

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Malformed token {token:?}: {reason}")]
    MalformedToken { token: String, reason: String },

    #[error("Malformed line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Event block contains no lines")]
    EmptyEvent,

    #[error("Invalid UTC date: {0}")]
    InvalidDate(String),

    #[error("Event {index} could not be reconstructed: {source}")]
    Event {
        index: usize,
        #[source]
        source: Box<DecoderError>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DecoderError {
    pub(crate) fn malformed_line(line: usize, reason: impl Into<String>) -> Self {
        DecoderError::MalformedLine {
            line,
            reason: reason.into(),
        }
    }
}

/// One edge word (rise or fall time register) of a record
///
/// Bit layout of the 8-bit word:
/// - bit 7: a new event begins on this line (only ever set on Rising Edge 1)
/// - bit 6: unused, always 0
/// - bit 5: edge is valid and should be recorded
/// - bits 0-4: edge time in counts since the clock tick (units of 1.25 ns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EdgeMeasurement {
    pub event_start: bool,
    pub valid: bool,
    pub count_units: u8,
}

impl EdgeMeasurement {
    /// Duration of one sub-count in nanoseconds
    pub const NS_PER_COUNT: f64 = 1.25;

    /// Edge time relative to the clock tick of its line, in nanoseconds
    pub fn offset_ns(&self) -> f64 {
        Self::NS_PER_COUNT * f64::from(self.count_units)
    }
}

/// DAQ status nibble; every bit set is a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusFlags {
    /// bit 0: 1PPS interrupt pending
    pub pps_interrupt_pending: bool,
    /// bit 1: trigger interrupt pending
    pub trigger_interrupt_pending: bool,
    /// bit 2: GPS data possibly corrupted
    pub gps_data_corrupted: bool,
    /// bit 3: PPS rate not within 25 clock ticks
    pub pps_rate_out_of_range: bool,
}

impl StatusFlags {
    /// True when no warning bit is set
    pub fn ok(&self) -> bool {
        !(self.pps_interrupt_pending
            || self.trigger_interrupt_pending
            || self.gps_data_corrupted
            || self.pps_rate_out_of_range)
    }
}

/// Edge slot of a record, in column order R1,F1,R2,F2,R3,F3,R4,F4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSlot(usize);

impl EdgeSlot {
    pub fn all() -> impl Iterator<Item = EdgeSlot> {
        (0..NUM_EDGE_SLOTS).map(EdgeSlot)
    }

    /// Zero-based channel index (0..4)
    pub fn channel(&self) -> usize {
        self.0 / 2
    }

    pub fn is_rise(&self) -> bool {
        self.0 % 2 == 0
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// A single decoded record line
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLine {
    /// Local DAQ counter value
    pub clock_count: u32,
    /// Edge words in column order R1,F1,R2,F2,R3,F3,R4,F4
    pub edges: [EdgeMeasurement; NUM_EDGE_SLOTS],
    /// Counter value at the last DAQ clock / GPS re-sync
    pub pps_reference: u32,
    /// UTC time from GPS (hhmmss.ddd)
    pub utc_time: String,
    /// UTC date from GPS (ddmmyy)
    pub utc_date: String,
    /// GPS fix was well received ('A') or not ('V')
    pub gps_valid: bool,
    /// Number of GPS satellites in view
    pub satellite_count: u32,
    pub status: StatusFlags,
    /// Delay between PPS and GPS update in milliseconds
    pub pps_delay_millis: i32,
}

impl DecodedLine {
    pub fn edge(&self, slot: EdgeSlot) -> &EdgeMeasurement {
        &self.edges[slot.index()]
    }

    /// True if this line begins a new event
    pub fn starts_event(&self) -> bool {
        self.edges[0].event_start
    }
}

/// Paired edge times of one channel, in nanoseconds since event start
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelEdges {
    pub rise_times_ns: Vec<f64>,
    pub fall_times_ns: Vec<f64>,
}

impl ChannelEdges {
    pub fn push(&mut self, rise: bool, time_ns: f64) {
        if rise {
            self.rise_times_ns.push(time_ns);
        } else {
            self.fall_times_ns.push(time_ns);
        }
    }

    /// Drop trailing entries of the longer sequence until both have the
    /// same length
    ///
    /// Returns the number of orphan edges discarded.
    pub fn trim_orphans(&mut self) -> usize {
        let paired = self.rise_times_ns.len().min(self.fall_times_ns.len());
        let dropped = self.rise_times_ns.len() + self.fall_times_ns.len() - 2 * paired;
        self.rise_times_ns.truncate(paired);
        self.fall_times_ns.truncate(paired);
        dropped
    }

    /// Iterate over (rise, fall) pairs
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.rise_times_ns
            .iter()
            .copied()
            .zip(self.fall_times_ns.iter().copied())
    }

    /// Number of complete (rise, fall) pairs
    pub fn len(&self) -> usize {
        self.rise_times_ns.len().min(self.fall_times_ns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A reconstructed trigger cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Seconds since UTC midnight, rounded to the whole second
    pub absolute_start_seconds: f64,
    /// UTC date (ddmmyy) of the first line
    pub utc_date: String,
    /// Estimated oscillator frequency for this event
    pub clock_frequency_hz: f64,
    /// Edge times per channel (index 0 is channel 1)
    pub channels: [ChannelEdges; NUM_CHANNELS],
    /// Decoded lines, in file order
    pub lines: Vec<DecodedLine>,
}

impl Event {
    /// Edges of a 1-based channel number
    pub fn channel(&self, channel: u8) -> Option<&ChannelEdges> {
        let index = usize::from(channel).checked_sub(1)?;
        self.channels.get(index)
    }

    /// True when every line of the event had a valid GPS fix
    pub fn gps_valid(&self) -> bool {
        self.lines.iter().all(|l| l.gps_valid)
    }
}

/// One output record: a paired rise/fall edge on a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRecord {
    /// Source identifier (first 4 characters of the source file name)
    pub id: String,
    /// 1-based channel number
    pub channel: u8,
    /// Integer Julian day
    pub julian_day: i64,
    /// Rising edge as fraction of the Julian day
    pub rise_fraction: f64,
    /// Falling edge as fraction of the Julian day
    pub fall_fraction: f64,
    /// Fall minus rise in nanoseconds (negative if edges were mismatched)
    pub time_over_threshold_ns: f64,
}

impl ThresholdRecord {
    /// Sort key matching the aggregate file ordering (fields 2 and 3 as text)
    pub fn sort_key(&self) -> (i64, String) {
        (self.julian_day, format!("{:.16}", self.rise_fraction))
    }
}

impl fmt::Display for ThresholdRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}  {}  {:.16}  {:.16}  {:.2}",
            self.id,
            self.channel,
            self.julian_day,
            self.rise_fraction,
            self.fall_fraction,
            self.time_over_threshold_ns
        )
    }
}
