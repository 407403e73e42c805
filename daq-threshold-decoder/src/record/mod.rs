//! Record decoding
//!
//! Turns the fixed-column text records written by the DAQ into typed
//! [`DecodedLine`](crate::types::DecodedLine) values. The bit-field layer
//! handles the individual hex words; the line layer splits and validates the
//! 16 columns.

pub mod bitfield;
pub mod line;

pub use bitfield::{decode_edge_word, decode_status_word, peek_event_start};
pub use line::decode_line;
