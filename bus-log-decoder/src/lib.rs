//! Bus Log Decoder Library
//!
//! Converts bus monitor event logs (textual records of parameter reads and
//! writes on a multiplexed hardware bus) into time-aligned tables ready for
//! spreadsheet import.
//!
//! # Architecture
//!
//! Each input file is parsed by its own [`ConversionSession`]:
//! - [`LineClassifier`] recognises alias, parameter update, open port and close port lines
//! - [`AliasTable`] collects address → name bindings from alias comments
//! - [`ContextTracker`] remembers the open bus/port scope
//! - [`TimeSeriesStore`] aligns the sparse updates into a forward-filled table
//! - [`Emitter`] renders the table as CSV rows
//!
//! The whole file is parsed before any output is produced.
//!
//! # Example Usage
//!
//! ```
//! use bus_log_decoder::{convert_str, ConverterConfig};
//!
//! let log = "\
//! * ALIAS: 1.2.100 = ENGINE_N1
//! 1.0,OPEN,1.2,
//! 1.0,READ_PARAM,100,55
//! 2.0,WRITE_PARAM,100,60
//! 2.0,CLOSE,1.2,
//! ";
//!
//! let converted = convert_str(log, ConverterConfig::new()).unwrap();
//! assert_eq!(converted.to_csv_string(), "TIME(s),ENGINE_N1\n1.0,55\n2.0,60\n");
//! ```

// Public modules
pub mod aliases;
pub mod config;
pub mod context;
pub mod emit;
pub mod files;
pub mod lines;
pub mod session;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use aliases::{AddressResolver, AliasTable};
pub use config::ConverterConfig;
pub use context::{ContextTracker, PortState};
pub use emit::Emitter;
pub use files::{collect_inputs, convert_file, csv_path_for, has_bus_log_extension};
pub use lines::{LineClassifier, LineMatch, UpdateKind};
pub use session::{convert_reader, convert_str, ConversionSession, ConversionSummary, ConvertedLog};
pub use store::TimeSeriesStore;
pub use types::{BusAddress, ContextMismatch, ConvertError, Result, INVALID_ID};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
