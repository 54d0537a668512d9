//! Bus Log Converter CLI Application
//!
//! This is the command-line interface for the bus log converter.
//! It uses the bus-log-decoder library and adds:
//! - Argument parsing and help text
//! - Optional TOML configuration
//! - Batch conversion of every `.bus.log` file in a folder
//! - Exit code policy (2 aborts the run, 0 otherwise)

use anyhow::{Context, Result};
use bus_log_decoder::{collect_inputs, convert_file, csv_path_for};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;

const ABOUT: &str = "Convert Bus Monitor Log files to CSV files easily importable to Excel";

const LONG_ABOUT: &str = "\
Convert Bus Monitor Log files to CSV files easily importable to Excel.

Only parameters are exported, and reads and writes appear as different
entries at different times.

Pass a log file path to create the corresponding CSV file in the same
folder. Alternatively, pass a folder, and every file with a '.bus.log'
extension in it will be converted.";

/// Bus Log Converter - Convert bus monitor logs to CSV
#[derive(Parser, Debug)]
#[command(name = "bus-log-cli")]
#[command(about = ABOUT, long_about = LONG_ABOUT)]
#[command(version)]
struct Args {
    /// Path to a .bus.log file, or to a folder of them
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Folder for the CSV files (default: next to each log file)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    // Parse command line arguments (usage errors exit with code 2)
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::debug!("Bus Log Converter CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", bus_log_decoder::VERSION);

    ExitCode::from(execute(&args))
}

/// Run the conversion and map the outcome to a process exit status
///
/// 2 when the run was aborted, 0 otherwise (including files that were
/// skipped or could not be written).
fn execute(args: &Args) -> u8 {
    match run(args) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    }
}

/// Convert every input named by the arguments
///
/// Returns an error only for failures that abort the whole run: an unusable
/// configuration or path, or a malformed log line. Other failures are
/// reported and the batch moves on.
fn run(args: &Args) -> Result<()> {
    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| app_config.output.output_dir.clone());

    let inputs = collect_inputs(&args.path)?;
    if inputs.is_empty() {
        log::warn!("No .bus.log file found in {:?}", args.path);
    }

    let mut converted = 0;
    for input in &inputs {
        let output = csv_path_for(input, output_dir.as_deref());

        match convert_file(input, &output, app_config.converter.clone()) {
            Ok(summary) => {
                converted += 1;
                if !args.quiet {
                    println!(
                        "Created {} ({} rows, {} streams)",
                        output.display(),
                        summary.rows,
                        summary.streams
                    );
                }
                if summary.context_mismatches > 0 {
                    log::warn!(
                        "{:?}: {} CLOSE line(s) did not match the open port",
                        input,
                        summary.context_mismatches
                    );
                }
            }
            Err(e) if e.is_fatal() => {
                return Err(e).with_context(|| format!("Aborting conversion of {:?}", input));
            }
            Err(e) => {
                eprintln!("{}", e);
            }
        }
    }

    log::info!("Converted {} of {} file(s)", converted, inputs.len());
    Ok(())
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
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
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
    use clap::CommandFactory;
    use std::fs;
    use std::path::Path;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    const GOOD_LOG: &str = "1.0,OPEN,1.2,\n1.0,READ_PARAM,100,55\n2.0,CLOSE,1.2,\n";

    fn args_for(path: &Path) -> Args {
        Args::try_parse_from([Path::new("bus-log-cli"), path]).unwrap()
    }

    #[test]
    fn test_fatal_parse_error_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.bus.log"), "1.0,OPEN,1.2,\n1.0,READ_PARAM,,1\n").unwrap();
        fs::write(dir.path().join("b.bus.log"), GOOD_LOG).unwrap();

        assert_eq!(execute(&args_for(dir.path())), 2);
        assert!(!dir.path().join("a.bus.csv").exists());
        assert!(!dir.path().join("b.bus.csv").exists());
    }

    #[test]
    fn test_unwritable_output_lets_batch_continue() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.bus.log"), GOOD_LOG).unwrap();
        fs::write(dir.path().join("b.bus.log"), GOOD_LOG).unwrap();
        // A directory in the way of a.bus.csv makes its write fail
        fs::create_dir(dir.path().join("a.bus.csv")).unwrap();

        assert_eq!(execute(&args_for(dir.path())), 0);
        assert!(dir.path().join("a.bus.csv").is_dir());
        assert_eq!(
            fs::read_to_string(dir.path().join("b.bus.csv")).unwrap(),
            "TIME(s),1.2.100\n1.0,55\n"
        );
    }

    #[test]
    fn test_rejected_extension_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("c.txt");
        fs::write(&input, GOOD_LOG).unwrap();

        assert_eq!(execute(&args_for(&input)), 0);
        assert!(!dir.path().join("c.csv").exists());
    }

    #[test]
    fn test_unusable_path_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(execute(&args_for(&dir.path().join("missing"))), 2);
    }

    #[test]
    fn test_path_is_required() {
        assert!(Args::try_parse_from(["bus-log-cli"]).is_err());
        assert!(Args::try_parse_from(["bus-log-cli", "a.bus.log", "b.bus.log"]).is_err());

        let args = Args::try_parse_from(["bus-log-cli", "-vv", "logs"]).unwrap();
        assert_eq!(args.path, PathBuf::from("logs"));
        assert_eq!(args.verbose, 2);
    }
}
