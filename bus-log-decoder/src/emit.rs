//! CSV rendering of a [`TimeSeriesStore`]

use crate::config::ConverterConfig;
use crate::store::TimeSeriesStore;
use std::io::{self, Write};

/// Renders a store as delimited text rows
pub struct Emitter<'a> {
    store: &'a TimeSeriesStore,
    config: &'a ConverterConfig,
}

impl<'a> Emitter<'a> {
    pub fn new(store: &'a TimeSeriesStore, config: &'a ConverterConfig) -> Self {
        Self { store, config }
    }

    /// Time column label followed by the stream names
    pub fn header(&self) -> String {
        let mut cells = vec![self.config.time_header.as_str()];
        cells.extend(self.store.stream_names());
        cells.join(self.config.delimiter.to_string().as_str())
    }

    /// Render data row `index`, or None past the last row
    ///
    /// A stream without a value at `index` gets an empty cell.
    pub fn render_row(&self, index: usize) -> Option<String> {
        let timestamp = self.store.timestamp(index)?;
        let delimiter = self.config.delimiter.to_string();

        let mut cells = Vec::with_capacity(self.store.stream_count() + 1);
        cells.push(timestamp);
        for stream in 0..self.store.stream_count() {
            cells.push(self.store.value(stream, index).unwrap_or(""));
        }

        Some(cells.join(delimiter.as_str()))
    }

    /// Data rows in order (header not included)
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.store.len()).filter_map(move |index| self.render_row(index))
    }

    /// Write header and rows, each terminated by a newline
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", self.header())?;
        for row in self.rows() {
            writeln!(writer, "{}", row)?;
        }
        writer.flush()
    }

    /// Whole table as a string
    pub fn to_csv_string(&self) -> String {
        let mut out = self.header();
        out.push('\n');
        for row in self.rows() {
            out.push_str(&row);
            out.push('\n');
        }
        out
    }
}
