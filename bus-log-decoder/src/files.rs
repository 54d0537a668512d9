//! Input discovery and CSV output
//!
//! Bus monitor logs are recognised by their two-segment `.bus.log` suffix.
//! The CSV for `name.bus.log` is `name.bus.csv`, next to the input unless an
//! output directory is given.

use crate::config::ConverterConfig;
use crate::session::{convert_reader, ConversionSummary, ConvertedLog};
use crate::types::{ConvertError, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// File name suffix of bus monitor logs
pub const BUS_LOG_SUFFIX: &str = ".bus.log";

/// True if the file name ends with `.bus.log`
///
/// A file named exactly `.bus.log` qualifies too.
pub fn has_bus_log_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(BUS_LOG_SUFFIX))
        .unwrap_or(false)
}

/// List the files to convert for a command-line path argument
///
/// A file is returned as is (its extension is checked when it is converted,
/// so the rejection gets reported). A directory yields its immediate child
/// files with the bus log suffix, sorted by name; anything else is skipped.
pub fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        return Err(ConvertError::InvalidPath(path.to_path_buf()));
    }

    let mut inputs = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.is_file() && has_bus_log_extension(&entry_path) {
            inputs.push(entry_path);
        } else {
            log::trace!("Skipping {:?}", entry_path);
        }
    }
    inputs.sort();

    log::debug!("Found {} bus log file(s) in {:?}", inputs.len(), path);
    Ok(inputs)
}

/// Where the CSV for `input` is written
pub fn csv_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let csv_path = input.with_extension("csv");
    match (output_dir, csv_path.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => csv_path,
    }
}

/// Parse a whole log file
pub fn read_log_file(path: &Path, config: ConverterConfig) -> Result<ConvertedLog> {
    let file = File::open(path).map_err(|source| ConvertError::Input {
        path: path.to_path_buf(),
        source,
    })?;

    convert_reader(BufReader::new(file), config).map_err(|e| match e {
        ConvertError::IoError(source) => ConvertError::Input {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Write a converted log as CSV
///
/// If writing fails, the partially written file is removed.
pub fn write_csv_file(log: &ConvertedLog, path: &Path) -> Result<()> {
    let output_error = |source| ConvertError::Output {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(output_error)?;
    let mut writer = BufWriter::new(file);
    if let Err(source) = log.emitter().write_csv(&mut writer) {
        drop(writer);
        if let Err(e) = fs::remove_file(path) {
            log::warn!("Could not remove partial CSV file {:?}: {}", path, e);
        }
        return Err(output_error(source));
    }

    Ok(())
}

/// Convert one bus log file to CSV
///
/// The input is parsed completely before the output file is created, so a
/// parse failure never leaves a CSV behind.
pub fn convert_file(
    input: &Path,
    output: &Path,
    config: ConverterConfig,
) -> Result<ConversionSummary> {
    if !has_bus_log_extension(input) {
        return Err(ConvertError::UnsupportedExtension(input.to_path_buf()));
    }

    log::info!("Opened {:?}", input);
    let log = read_log_file(input, config)?;
    let summary = log.summary();
    log::debug!(
        "{:?}: {} rows, {} streams, {} aliases",
        input,
        summary.rows,
        summary.streams,
        summary.aliases
    );

    write_csv_file(&log, output)?;
    log::info!("Created {:?}", output);

    Ok(summary)
}
