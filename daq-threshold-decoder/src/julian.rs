//! Gregorian to Julian date conversion

use crate::types::{DecoderError, Result};
use chrono::{Datelike, NaiveDate};

/// Julian date of 0000-12-31T00:00 in the proleptic Gregorian calendar
/// (chrono counts 0001-01-01 as day 1)
const JD_CE_OFFSET: f64 = 1_721_424.5;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Parse a GPS `ddmmyy` date; two-digit years are taken as 20YY
pub fn parse_utc_date(utc_date: &str) -> Result<NaiveDate> {
    let invalid = || DecoderError::InvalidDate(utc_date.to_string());

    let field = |range: std::ops::Range<usize>| -> Result<u32> {
        utc_date
            .get(range)
            .filter(|s| s.chars().all(|c| c.is_ascii_digit()))
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)
    };

    if utc_date.len() != 6 {
        return Err(invalid());
    }

    let day = field(0..2)?;
    let month = field(2..4)?;
    let year = 2000 + field(4..6)? as i32;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Julian date at 00:00 UTC of `date` (always ends in .5)
pub fn julian_date_at_midnight(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce()) + JD_CE_OFFSET
}

/// Split a Julian date into its integer day and fraction of day
pub fn split_julian(jd: f64) -> (i64, f64) {
    let day = jd.floor();
    (day as i64, jd - day)
}
