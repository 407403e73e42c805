//! Line decoding
//!
//! A record line has 16 whitespace-separated columns:
//!
//! ```text
//! clock R1 F1 R2 F2 R3 F3 R4 F4 pps     utc_time   date   fix sats status delay
//! 687C4047 80 00 2B 00 00 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053
//! ```

use super::bitfield::{decode_edge_word, decode_status_word, parse_hex_word};
use crate::types::{DecodedLine, DecoderError, EdgeMeasurement, Result, NUM_EDGE_SLOTS};

/// Number of columns in a record line
pub const NUM_FIELDS: usize = 16;

const FIELD_CLOCK: usize = 0;
const FIELD_FIRST_EDGE: usize = 1;
const FIELD_PPS: usize = 9;
const FIELD_UTC_TIME: usize = 10;
const FIELD_UTC_DATE: usize = 11;
const FIELD_GPS_VALID: usize = 12;
const FIELD_SATELLITES: usize = 13;
const FIELD_STATUS: usize = 14;
const FIELD_PPS_DELAY: usize = 15;

/// Decode one raw record line
///
/// `line` is the 1-based position of the line within its event block and is
/// only used for error reporting.
pub fn decode_line(raw: &str, line: usize) -> Result<DecodedLine> {
    let fields: Vec<&str> = raw.split_whitespace().collect();
    if fields.len() != NUM_FIELDS {
        return Err(DecoderError::malformed_line(
            line,
            format!("expected {} fields, found {}", NUM_FIELDS, fields.len()),
        ));
    }

    let token_error = |e: DecoderError| DecoderError::malformed_line(line, e.to_string());

    let clock_count = parse_hex_word(fields[FIELD_CLOCK], u32::BITS).map_err(token_error)?;
    let pps_reference = parse_hex_word(fields[FIELD_PPS], u32::BITS).map_err(token_error)?;

    let mut edges = [EdgeMeasurement::default(); NUM_EDGE_SLOTS];
    for (i, edge) in edges.iter_mut().enumerate() {
        *edge = decode_edge_word(fields[FIELD_FIRST_EDGE + i]).map_err(token_error)?;
    }

    let utc_time = fields[FIELD_UTC_TIME];
    if utc_time_seconds(utc_time).is_none() {
        return Err(DecoderError::malformed_line(
            line,
            format!("invalid UTC time {:?}", utc_time),
        ));
    }

    let utc_date = fields[FIELD_UTC_DATE];
    if utc_date.len() != 6 || !utc_date.chars().all(|c| c.is_ascii_digit()) {
        return Err(DecoderError::malformed_line(
            line,
            format!("invalid UTC date {:?}", utc_date),
        ));
    }

    let gps_valid = match fields[FIELD_GPS_VALID] {
        "A" => true,
        "V" => false,
        other => {
            return Err(DecoderError::malformed_line(
                line,
                format!("GPS fix flag must be A or V, found {:?}", other),
            ))
        }
    };

    let satellite_count = fields[FIELD_SATELLITES].parse::<u32>().map_err(|e| {
        DecoderError::malformed_line(
            line,
            format!("invalid satellite count {:?}: {}", fields[FIELD_SATELLITES], e),
        )
    })?;

    let status = decode_status_word(fields[FIELD_STATUS]).map_err(token_error)?;

    let pps_delay_millis = fields[FIELD_PPS_DELAY].parse::<i32>().map_err(|e| {
        DecoderError::malformed_line(
            line,
            format!("invalid PPS delay {:?}: {}", fields[FIELD_PPS_DELAY], e),
        )
    })?;

    Ok(DecodedLine {
        clock_count,
        edges,
        pps_reference,
        utc_time: utc_time.to_string(),
        utc_date: utc_date.to_string(),
        gps_valid,
        satellite_count,
        status,
        pps_delay_millis,
    })
}

/// Convert a `hhmmss.ddd` time to seconds since midnight
pub fn utc_time_seconds(utc_time: &str) -> Option<f64> {
    let hours = utc_time.get(0..2)?;
    let minutes = utc_time.get(2..4)?;
    let seconds = utc_time.get(4..)?;

    if !hours.chars().chain(minutes.chars()).all(|c| c.is_ascii_digit())
        || !seconds.starts_with(|c: char| c.is_ascii_digit())
    {
        return None;
    }

    let hours: f64 = hours.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
