//! Converter configuration types
//!
//! This module defines the few knobs that affect how a converted table is
//! rendered. Parsing itself is not configurable: the recognised line shapes
//! are fixed by the bus monitor log format.

use serde::{Deserialize, Serialize};

/// Configuration for the converter library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Label of the first column in the header row
    #[serde(default = "default_time_header")]
    pub time_header: String,

    /// Column separator used when rendering rows
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Placeholder written for a stream in rows recorded before it existed
    #[serde(default = "default_blank_cell")]
    pub blank_cell: String,
}

fn default_time_header() -> String {
    "TIME(s)".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_blank_cell() -> String {
    " ".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            time_header: default_time_header(),
            delimiter: default_delimiter(),
            blank_cell: default_blank_cell(),
        }
    }
}

impl ConverterConfig {
    /// Create a new converter configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the header label of the time column
    pub fn with_time_header(mut self, header: impl Into<String>) -> Self {
        self.time_header = header.into();
        self
    }

    /// Builder method: set the column delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder method: set the backfill placeholder
    pub fn with_blank_cell(mut self, blank: impl Into<String>) -> Self {
        self.blank_cell = blank.into();
        self
    }
}
