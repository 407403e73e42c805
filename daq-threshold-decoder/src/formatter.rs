//! Timestamp formatting
//!
//! Turns the relative edge times of an [`Event`] into absolute Julian-day
//! timestamps, one [`ThresholdRecord`] per rise/fall pair.

use crate::julian::{julian_date_at_midnight, parse_utc_date, split_julian, SECONDS_PER_DAY};
use crate::types::{Event, Result, ThresholdRecord};

const NS_PER_SECOND: f64 = 1e9;

/// Produce the output records of one event
///
/// Records are ordered by channel (1..4), then by pair order within the
/// channel.
pub fn format_event(event: &Event, id: &str) -> Result<Vec<ThresholdRecord>> {
    let date = parse_utc_date(&event.utc_date)?;
    let start_jd =
        julian_date_at_midnight(date) + event.absolute_start_seconds / SECONDS_PER_DAY;
    let (start_day, start_fraction) = split_julian(start_jd);

    let mut records = Vec::new();
    for (channel, edges) in (1u8..).zip(event.channels.iter()) {
        for (rise_ns, fall_ns) in edges.pairs() {
            let mut julian_day = start_day;
            let mut rise_fraction = rise_ns / NS_PER_SECOND / SECONDS_PER_DAY + start_fraction;
            let mut fall_fraction = fall_ns / NS_PER_SECOND / SECONDS_PER_DAY + start_fraction;

            // at most one day boundary can be crossed per pair
            if rise_fraction >= 1.0 || fall_fraction >= 1.0 {
                julian_day += 1;
            }
            if rise_fraction >= 1.0 {
                rise_fraction -= 1.0;
            }
            if fall_fraction >= 1.0 {
                fall_fraction -= 1.0;
            }

            records.push(ThresholdRecord {
                id: id.to_string(),
                channel,
                julian_day,
                rise_fraction,
                fall_fraction,
                time_over_threshold_ns: fall_ns - rise_ns,
            });
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChannelEdges;

    fn event(start_seconds: f64, channels: [ChannelEdges; 4]) -> Event {
        Event {
            absolute_start_seconds: start_seconds,
            utc_date: "180516".to_string(),
            clock_frequency_hz: 25_000_000.0,
            channels,
            lines: Vec::new(),
        }
    }

    fn pair(rise: f64, fall: f64) -> ChannelEdges {
        ChannelEdges {
            rise_times_ns: vec![rise],
            fall_times_ns: vec![fall],
        }
    }

    fn channel_one(edges: ChannelEdges) -> [ChannelEdges; 4] {
        [
            edges,
            ChannelEdges::default(),
            ChannelEdges::default(),
            ChannelEdges::default(),
        ]
    }

    #[test]
    fn test_records_per_pair_in_channel_order() {
        let ev = event(
            202.0,
            [
                ChannelEdges {
                    rise_times_ns: vec![100.0, 500.0],
                    fall_times_ns: vec![150.0, 560.0],
                },
                ChannelEdges::default(),
                pair(10.0, 30.0),
                ChannelEdges::default(),
            ],
        );
        let records = format_event(&ev, "6148").unwrap();

        let channels: Vec<u8> = records.iter().map(|r| r.channel).collect();
        assert_eq!(channels, vec![1, 1, 3]);
        assert_eq!(records[0].time_over_threshold_ns, 50.0);
        assert_eq!(records[1].time_over_threshold_ns, 60.0);
        assert!(records.iter().all(|r| r.julian_day == 2_457_526 && r.id == "6148"));

        let expected = 0.5 + 202.0 / 86_400.0 + 100.0 / 1e9 / 86_400.0;
        assert!((records[0].rise_fraction - expected).abs() < 1e-9);
    }

    #[test]
    fn test_day_rollover_increments_once() {
        // start one second before the Julian day boundary (12:00 UTC)
        let ev = event(43_199.0, channel_one(pair(2e9, 3e9)));
        let records = format_event(&ev, "6148").unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.julian_day, 2_457_527);
        assert!((0.0..1.0).contains(&record.rise_fraction));
        assert!((0.0..1.0).contains(&record.fall_fraction));
        assert!((record.rise_fraction - 1.0 / 86_400.0).abs() < 1e-9);
        assert!((record.fall_fraction - 2.0 / 86_400.0).abs() < 1e-9);
    }

    #[test]
    fn test_rollover_on_fall_only() {
        let ev = event(43_199.0, channel_one(pair(0.5e9, 1.5e9)));
        let record = &format_event(&ev, "6148").unwrap()[0];

        assert_eq!(record.julian_day, 2_457_527);
        // the rise stays on the previous day's fraction
        assert!(record.rise_fraction > 0.99);
        assert!(record.fall_fraction < 0.01);
    }

    #[test]
    fn test_rollover_independent_between_pairs() {
        let edges = ChannelEdges {
            rise_times_ns: vec![2e9, 3e9],
            fall_times_ns: vec![2.5e9, 3.5e9],
        };
        let ev = event(43_199.0, channel_one(edges));
        let records = format_event(&ev, "6148").unwrap();
        assert!(records.iter().all(|r| r.julian_day == 2_457_527));
    }

    #[test]
    fn test_negative_time_over_threshold_preserved() {
        let ev = event(0.0, channel_one(pair(500.0, 200.0)));
        let records = format_event(&ev, "6148").unwrap();
        assert_eq!(records[0].time_over_threshold_ns, -300.0);
    }

    #[test]
    fn test_invalid_event_date() {
        let mut ev = event(0.0, Default::default());
        ev.utc_date = "320516".to_string();
        assert!(format_event(&ev, "6148").is_err());
    }
}
