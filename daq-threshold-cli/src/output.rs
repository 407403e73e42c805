//! Threshold file writing
//!
//! The aggregate `<source>.thresh` file holds every record of a source sorted
//! by Julian day and rising edge. Per-channel files are derived from it by
//! filtering on the channel digit of each line.

use anyhow::{Context, Result};
use daq_threshold_decoder::ThresholdRecord;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Header line of every threshold file
pub const HEADER: &str =
    "#ID.CHANNEL, Julian Day, RISING EDGE(sec), FALLING EDGE(sec), TIME OVER THRESHOLD (nanosec)";

const EXTENSION: &str = "thresh";

/// Position of the channel digit in a record line (`IIII.C`)
const CHANNEL_COLUMN: usize = 5;

/// Stable sort by Julian day, then rising edge as rendered
pub fn sort_records(records: &mut [ThresholdRecord]) {
    records.sort_by_cached_key(|r| r.sort_key());
}

/// Sort `records` and write them to `<dir>/<source_name>.thresh`
pub fn write_threshold_file(
    dir: &Path,
    source_name: &str,
    records: &mut [ThresholdRecord],
) -> Result<PathBuf> {
    sort_records(records);

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    let path = dir.join(format!("{}.{}", source_name, EXTENSION));

    let file = File::create(&path)
        .with_context(|| format!("Failed to create threshold file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", HEADER)?;
    for record in records.iter() {
        writeln!(writer, "{}", record)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write threshold file: {:?}", path))?;

    log::info!("Wrote {} records to {:?}", records.len(), path);
    Ok(path)
}

/// Name of the per-channel file: the source name with its last character
/// replaced by the channel number
pub fn channel_file_name(source_name: &str, channel: u8) -> String {
    let mut stem: Vec<char> = source_name.chars().collect();
    stem.pop();
    format!("{}{}.{}", stem.into_iter().collect::<String>(), channel, EXTENSION)
}

/// Split an aggregate threshold file into one file per requested channel
///
/// Data lines are sorted as text before being distributed; comment lines are
/// dropped and every output file starts with [`HEADER`].
pub fn split_channels(
    aggregate: &Path,
    dir: &Path,
    source_name: &str,
    channels: &[u8],
) -> Result<Vec<PathBuf>> {
    let content = fs::read_to_string(aggregate)
        .with_context(|| format!("Failed to read threshold file: {:?}", aggregate))?;

    let mut lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty())
        .collect();
    lines.sort();

    let mut written = Vec::with_capacity(channels.len());
    for &channel in channels {
        let path = dir.join(channel_file_name(source_name, channel));
        if path == aggregate {
            log::warn!("Channel {} file replaces the aggregate file {:?}", channel, path);
        }
        let file = File::create(&path)
            .with_context(|| format!("Failed to create channel file: {:?}", path))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", HEADER)?;

        let digit = char::from(b'0' + channel);
        let mut count = 0;
        for line in lines.iter().filter(|l| l.chars().nth(CHANNEL_COLUMN) == Some(digit)) {
            writeln!(writer, "{}", line)?;
            count += 1;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write channel file: {:?}", path))?;

        log::debug!("Wrote {} channel {} records to {:?}", count, channel, path);
        written.push(path);
    }

    Ok(written)
}
