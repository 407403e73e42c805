//! Bit-field decoding of single hex words
//!
//! Edge words are 8 bits wide, the status word is a 4-bit nibble. Fields are
//! extracted with masks and shifts directly from the parsed integer.

use crate::types::{DecoderError, EdgeMeasurement, Result, StatusFlags};

/// Width of an edge (rise/fall) word in bits
pub const EDGE_WORD_BITS: u32 = 8;

/// Width of the DAQ status word in bits
pub const STATUS_WORD_BITS: u32 = 4;

const EVENT_START_BIT: u32 = 7;
const EDGE_VALID_BIT: u32 = 5;
const EDGE_COUNT_MASK: u32 = 0x1F;

/// Parse `token` as hexadecimal and check that it fits in `width` bits
pub fn parse_hex_word(token: &str, width: u32) -> Result<u32> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DecoderError::MalformedToken {
            token: token.to_string(),
            reason: "not a hexadecimal value".to_string(),
        });
    }

    let value = u32::from_str_radix(token, 16).map_err(|e| DecoderError::MalformedToken {
        token: token.to_string(),
        reason: e.to_string(),
    })?;

    if width < u32::BITS && value >> width != 0 {
        return Err(DecoderError::MalformedToken {
            token: token.to_string(),
            reason: format!("value 0x{:X} exceeds {} bits", value, width),
        });
    }

    Ok(value)
}

#[inline]
fn bit(value: u32, b: u32) -> bool {
    (value >> b) & 0x01 != 0
}

/// Decode an 8-bit edge word
pub fn decode_edge_word(token: &str) -> Result<EdgeMeasurement> {
    let value = parse_hex_word(token, EDGE_WORD_BITS)?;
    // width check above guarantees the value fits in a byte
    Ok(EdgeMeasurement::from_byte(value as u8))
}

/// Decode the 4-bit DAQ status word
pub fn decode_status_word(token: &str) -> Result<StatusFlags> {
    let value = parse_hex_word(token, STATUS_WORD_BITS)?;
    Ok(StatusFlags::from_bits(value as u8))
}

/// Check the event-start marker of a raw line without decoding it
///
/// Only the first edge word (second column) is inspected. A line whose marker
/// cannot be read is reported as not starting an event.
pub fn peek_event_start(raw_line: &str) -> bool {
    raw_line
        .split_whitespace()
        .nth(1)
        .and_then(|token| decode_edge_word(token).ok())
        .map(|edge| edge.event_start)
        .unwrap_or(false)
}

impl EdgeMeasurement {
    /// Split a raw edge byte into its fields; bit 6 is ignored
    pub fn from_byte(byte: u8) -> Self {
        let value = u32::from(byte);
        Self {
            event_start: bit(value, EVENT_START_BIT),
            valid: bit(value, EDGE_VALID_BIT),
            count_units: (value & EDGE_COUNT_MASK) as u8,
        }
    }

    /// Re-assemble the raw edge byte (bit 6 is always 0)
    pub fn to_byte(&self) -> u8 {
        let mut byte = (self.count_units as u32 & EDGE_COUNT_MASK) as u8;
        if self.valid {
            byte |= 1 << EDGE_VALID_BIT;
        }
        if self.event_start {
            byte |= 1 << EVENT_START_BIT;
        }
        byte
    }
}

impl StatusFlags {
    pub fn from_bits(bits: u8) -> Self {
        let value = u32::from(bits);
        Self {
            pps_interrupt_pending: bit(value, 0),
            trigger_interrupt_pending: bit(value, 1),
            gps_data_corrupted: bit(value, 2),
            pps_rate_out_of_range: bit(value, 3),
        }
    }

    pub fn to_bits(&self) -> u8 {
        [
            self.pps_interrupt_pending,
            self.trigger_interrupt_pending,
            self.gps_data_corrupted,
            self.pps_rate_out_of_range,
        ]
        .iter()
        .enumerate()
        .fold(0u8, |acc, (i, set)| if *set { acc | (1 << i) } else { acc })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_event_start_word() {
        let edge = decode_edge_word("80").unwrap();
        assert!(edge.event_start);
        assert!(!edge.valid);
        assert_eq!(edge.count_units, 0);
    }

    #[test]
    fn test_decode_valid_edge_word() {
        // 0x2B = 0b0010_1011: valid, 11 counts
        let edge = decode_edge_word("2B").unwrap();
        assert!(!edge.event_start);
        assert!(edge.valid);
        assert_eq!(edge.count_units, 11);
        assert_eq!(edge.offset_ns(), 13.75);
    }

    #[test]
    fn test_lowercase_hex_accepted() {
        assert_eq!(decode_edge_word("3a").unwrap().count_units, 26);
    }

    #[test]
    fn test_edge_byte_round_trip() {
        // every byte the DAQ can produce (bit 6 unused)
        for byte in (0u8..=255).filter(|b| b & 0x40 == 0) {
            let token = format!("{:02X}", byte);
            let edge = decode_edge_word(&token).unwrap();
            assert_eq!(edge.to_byte(), byte, "token {}", token);
        }
    }

    #[test]
    fn test_edge_word_too_wide() {
        let err = decode_edge_word("1FF").unwrap_err();
        assert!(matches!(err, DecoderError::MalformedToken { .. }));
    }

    #[test]
    fn test_non_hex_token_rejected() {
        assert!(decode_edge_word("G0").is_err());
        assert!(decode_edge_word("").is_err());
        assert!(decode_edge_word("+1").is_err());
        assert!(decode_status_word("-1").is_err());
    }

    #[test]
    fn test_decode_status_word() {
        let ok = decode_status_word("0").unwrap();
        assert!(ok.ok());

        let flags = decode_status_word("A").unwrap();
        assert!(!flags.pps_interrupt_pending);
        assert!(flags.trigger_interrupt_pending);
        assert!(!flags.gps_data_corrupted);
        assert!(flags.pps_rate_out_of_range);
        assert!(!flags.ok());
        assert_eq!(flags.to_bits(), 0xA);
    }

    #[test]
    fn test_status_word_too_wide() {
        assert!(decode_status_word("10").is_err());
    }

    #[test]
    fn test_peek_event_start() {
        let start = "687C4047 80 00 2B 00 00 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053";
        let cont = "687C4047 00 00 00 00 3A 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053";
        assert!(peek_event_start(start));
        assert!(!peek_event_start(cont));
        assert!(!peek_event_start(""));
        assert!(!peek_event_start("687C4047 ZZ"));
    }
}
