//! Event reconstruction
//!
//! Rebuilds the edge times of one trigger cycle from its raw lines. The DAQ
//! counter runs from a nominally 25 MHz oscillator that is re-synced to GPS on
//! every PPS tick; the true rate over the event is estimated from the PPS
//! references of the first and last line, and every line's counter position is
//! converted to nanoseconds at that rate.

use crate::record::decode_line;
use crate::record::line::utc_time_seconds;
use crate::segmenter::EventBlock;
use crate::types::{
    ChannelEdges, DecodedLine, DecoderError, EdgeSlot, Event, Result, NUM_CHANNELS,
};

/// Nominal DAQ oscillator frequency
pub const NOMINAL_FREQUENCY_HZ: f64 = 25_000_000.0;

/// Rollover correction applied to a negative PPS difference
const PPS_ROLLOVER: i64 = 0xFFFF_FFFF;

/// Builds [`Event`]s from event blocks
#[derive(Debug, Clone, Copy)]
pub struct EventReconstructor {
    nominal_frequency_hz: f64,
}

impl Default for EventReconstructor {
    fn default() -> Self {
        Self::new(NOMINAL_FREQUENCY_HZ)
    }
}

impl EventReconstructor {
    /// Create a reconstructor that falls back to `nominal_frequency_hz` when
    /// no PPS tick is seen within an event
    pub fn new(nominal_frequency_hz: f64) -> Self {
        Self {
            nominal_frequency_hz,
        }
    }

    /// Reconstruct a segmented block; errors carry the block index
    pub fn reconstruct_block(&self, block: &EventBlock<'_>) -> Result<Event> {
        self.reconstruct(&block.lines).map_err(|e| DecoderError::Event {
            index: block.index,
            source: Box::new(e),
        })
    }

    /// Reconstruct an event from its raw lines
    pub fn reconstruct<S: AsRef<str>>(&self, raw_lines: &[S]) -> Result<Event> {
        let lines = raw_lines
            .iter()
            .enumerate()
            .map(|(i, raw)| decode_line(raw.as_ref(), i + 1))
            .collect::<Result<Vec<DecodedLine>>>()?;

        let (first, last) = match (lines.first(), lines.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(DecoderError::EmptyEvent),
        };

        let absolute_start_seconds = absolute_start_seconds(first)?;
        let clock_frequency_hz =
            estimate_frequency(first.pps_reference, last.pps_reference, self.nominal_frequency_hz);

        let mut channels: [ChannelEdges; NUM_CHANNELS] = Default::default();
        for line in &lines {
            let t_clock_ns = clock_offset_ns(line, clock_frequency_hz);
            for slot in EdgeSlot::all() {
                let edge = line.edge(slot);
                if edge.valid {
                    channels[slot.channel()].push(slot.is_rise(), edge.offset_ns() + t_clock_ns);
                }
            }
        }

        for (i, edges) in channels.iter_mut().enumerate() {
            let dropped = edges.trim_orphans();
            if dropped > 0 {
                log::trace!("Discarded {} orphan edge(s) on channel {}", dropped, i + 1);
            }
        }

        Ok(Event {
            absolute_start_seconds,
            utc_date: first.utc_date.clone(),
            clock_frequency_hz,
            channels,
            lines,
        })
    }
}

/// Seconds since UTC midnight of the event start, to the nearest second
pub fn absolute_start_seconds(first: &DecodedLine) -> Result<f64> {
    let seconds = utc_time_seconds(&first.utc_time).ok_or_else(|| {
        DecoderError::malformed_line(1, format!("invalid UTC time {:?}", first.utc_time))
    })?;
    let delay = f64::from(first.pps_delay_millis) / 1000.0;
    Ok((seconds + delay).round_ties_even())
}

/// Counter ticks between the first and last PPS reference of an event
///
/// A negative difference is a 32-bit counter rollover; a zero difference means
/// no PPS tick occurred and `nominal_hz` is used instead.
pub fn estimate_frequency(first_pps: u32, last_pps: u32, nominal_hz: f64) -> f64 {
    let mut ticks = i64::from(last_pps) - i64::from(first_pps);
    if ticks < 0 {
        ticks += PPS_ROLLOVER;
    }
    if ticks == 0 {
        nominal_hz
    } else {
        ticks as f64
    }
}

/// Nanoseconds between the last PPS re-sync and the line's clock tick
///
/// The counter distance is taken modulo 2^32 so a counter wrap after the
/// re-sync still yields a positive offset.
fn clock_offset_ns(line: &DecodedLine, frequency_hz: f64) -> f64 {
    let ticks = line.clock_count.wrapping_sub(line.pps_reference);
    1e9 * f64::from(ticks) / frequency_hz
}
