//! DAQ Threshold CLI Application
//!
//! This is the command-line interface for the DAQ threshold decoder.
//! It uses the daq-threshold-decoder library and adds:
//! - Reading one or more DAQ source files
//! - Writing the sorted aggregate `.thresh` file per source
//! - Splitting the aggregate file into per-channel files
//! - TOML configuration and a JSON decode summary

use anyhow::{Context, Result};
use clap::Parser;
use daq_threshold_decoder::{DecodeSummary, Decoder};
use std::path::{Path, PathBuf};

mod config;
mod output;

use config::AppConfig;

/// DAQ Threshold - Decode DAQ logs into threshold-crossing timestamps
#[derive(Parser, Debug)]
#[command(name = "daq-threshold")]
#[command(about = "Decode DAQ threshold logs into Julian-day edge timestamps", long_about = None)]
#[command(version)]
struct Args {
    /// DAQ source file(s) to decode
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for the .thresh output files
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Channels to write per-channel files for (e.g. 1,2,4)
    #[arg(long, value_delimiter = ',', value_name = "CHANNELS")]
    channels: Option<Vec<u8>>,

    /// Only write the aggregate file
    #[arg(long)]
    no_split: bool,

    /// Reconstruct events on a single thread
    #[arg(long)]
    sequential: bool,

    /// Print the decode summary of each file as JSON
    #[arg(long)]
    summary: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("DAQ Threshold CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", daq_threshold_decoder::VERSION);

    let config = resolve_config(&args)?;
    if config.input.files.is_empty() {
        println!("DAQ Threshold - No input specified");
        println!("\nQuick Start:");
        println!("  daq-threshold 6148.2016.0518.1 --output-dir data/thresh");
        println!("  daq-threshold --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let decoder = Decoder::new(config.decoder.clone());
    log::debug!("Decoder settings: {:?}", decoder.config());
    for path in &config.input.files {
        let summary = process_file(&decoder, path, &config)?;
        if args.summary {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else if !args.quiet {
            println!(
                "{:?}: {} events, {} failed, {} records",
                path, summary.events_reconstructed, summary.events_failed, summary.records
            );
        }
    }

    Ok(())
}

/// Merge the config file (if any) with command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if !args.files.is_empty() {
        config.input.files = args.files.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(channels) = &args.channels {
        config.output.channels = channels.clone();
    }
    if args.no_split {
        config.output.split = false;
    }
    if args.sequential {
        config.decoder.parallel = false;
    }

    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Decode one source file and write its threshold files
fn process_file(decoder: &Decoder, path: &Path, config: &AppConfig) -> Result<DecodeSummary> {
    let source_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid source file name: {:?}", path))?;

    let mut decoded = decoder
        .decode_file(path)
        .with_context(|| format!("Failed to decode DAQ file: {:?}", path))?;

    for failure in &decoded.failures {
        log::debug!("{:?}: {}", path, failure);
    }

    let aggregate =
        output::write_threshold_file(&config.output.dir, source_name, &mut decoded.records)?;

    if config.output.split {
        output::split_channels(
            &aggregate,
            &config.output.dir,
            source_name,
            &config.output.channels,
        )?;
    }

    Ok(decoded.summary)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "daq-threshold",
            "6148.2016.0518.1",
            "--output-dir",
            "out",
            "--channels",
            "1,3",
            "--no-split",
            "--sequential",
        ]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.input.files, vec![PathBuf::from("6148.2016.0518.1")]);
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.output.channels, vec![1, 3]);
        assert!(!config.output.split);
        assert!(!config.decoder.parallel);
    }

    #[test]
    fn test_invalid_channel_argument() {
        let args = Args::parse_from(["daq-threshold", "f", "--channels", "0"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_process_file_writes_outputs() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("6148.2016.0518.0");
        let mut file = std::fs::File::create(&source).unwrap();
        writeln!(
            file,
            "687C4047 80 00 2B 00 00 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053\n\
             687C4048 00 00 00 28 00 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053"
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.output.dir = dir.path().join("thresh");

        let summary = process_file(&Decoder::default(), &source, &config).unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(summary.source_id, "6148");

        let read = |name: &str| std::fs::read_to_string(config.output.dir.join(name)).unwrap();

        let aggregate = read("6148.2016.0518.0.thresh");
        assert_eq!(aggregate.lines().count(), 2);
        assert!(aggregate.lines().nth(1).unwrap().starts_with("6148.2  2457526  "));

        assert_eq!(read("6148.2016.0518.2.thresh").lines().count(), 2);
        assert_eq!(read("6148.2016.0518.1.thresh").lines().count(), 1);
    }
}
