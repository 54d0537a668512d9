//! Time-aligned value table
//!
//! Bus logs are sparse: each update line touches a single address. The store
//! turns that stream of events into a rectangular table with one row per
//! event and one column per stream, so that every stream has a value at
//! every recorded timestamp:
//! - a stream that is not updated in a row repeats its last value (forward-fill)
//! - a stream created after rows already exist is padded with blank cells (backfill)
//!
//! Timestamps are kept as the opaque strings found in the log. They are not
//! sorted or de-duplicated, and two updates at the same instant produce two
//! rows.

use crate::aliases::AddressResolver;
use crate::types::BusAddress;
use std::collections::HashMap;

/// One named column of the table
#[derive(Debug, Clone)]
struct Stream {
    name: String,
    values: Vec<String>,
}

/// Rectangular table of timestamped stream values
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    /// Time axis, one entry per row, in file order
    timestamps: Vec<String>,

    /// Streams in order of first appearance
    streams: Vec<Stream>,

    /// Stream name lookup
    /// Key: stream name, Value: index in `streams`
    by_name: HashMap<String, usize>,

    /// Stream an address was bound to the first time it was seen
    by_address: HashMap<BusAddress, usize>,

    /// Placeholder for rows recorded before a stream existed
    blank_cell: String,
}

impl TimeSeriesStore {
    /// Create an empty store that backfills with `blank_cell`
    pub fn new(blank_cell: impl Into<String>) -> Self {
        Self {
            timestamps: Vec::new(),
            streams: Vec::new(),
            by_name: HashMap::new(),
            by_address: HashMap::new(),
            blank_cell: blank_cell.into(),
        }
    }

    /// Append a timestamp to the time axis
    ///
    /// Only [`record_value`](Self::record_value) may call this: on its own it
    /// leaves every stream one value short of the time axis.
    pub(crate) fn register_timestamp(&mut self, timestamp: impl Into<String>) {
        self.timestamps.push(timestamp.into());
    }

    /// Make sure a stream called `name` exists and return its index
    ///
    /// A new stream is padded with as many blank cells as the longest
    /// existing stream holds. The very first stream starts empty.
    pub fn ensure_stream(&mut self, name: &str) -> usize {
        if let Some(&index) = self.by_name.get(name) {
            return index;
        }

        let missing = self
            .streams
            .iter()
            .map(|stream| stream.values.len())
            .max()
            .unwrap_or(0);

        let index = self.streams.len();
        self.streams.push(Stream {
            name: name.to_string(),
            values: vec![self.blank_cell.clone(); missing],
        });
        self.by_name.insert(name.to_string(), index);

        log::debug!("New stream '{}' (backfilled {} rows)", name, missing);
        index
    }

    /// Record one update event as a new row
    ///
    /// The address is resolved to a stream name the first time it is seen;
    /// later calls for the same address keep using that stream even if the
    /// resolver would now answer differently. Every other stream repeats its
    /// last value in the new row.
    pub fn record_value<R: AddressResolver + ?Sized>(
        &mut self,
        resolver: &R,
        timestamp: &str,
        address: BusAddress,
        value: &str,
    ) {
        let target = match self.by_address.get(&address) {
            Some(&index) => index,
            None => {
                let name = resolver.resolve(&address);
                let index = self.ensure_stream(&name);
                self.by_address.insert(address, index);
                index
            }
        };

        self.register_timestamp(timestamp);

        for (index, stream) in self.streams.iter_mut().enumerate() {
            if index == target {
                stream.values.push(value.to_string());
            } else {
                // A stream with no value yet has nothing to repeat
                let fill = stream.values.last().unwrap_or(&self.blank_cell).clone();
                stream.values.push(fill);
            }
        }

        assert!(
            self.is_aligned(),
            "stream lengths diverged from the time axis after row {}",
            self.timestamps.len()
        );
    }

    /// True if every stream holds exactly one value per timestamp
    pub fn is_aligned(&self) -> bool {
        self.streams
            .iter()
            .all(|stream| stream.values.len() == self.timestamps.len())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True if no row has been recorded
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of streams
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Stream names in order of first appearance
    pub fn stream_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.streams.iter().map(|stream| stream.name.as_str())
    }

    /// Timestamp of row `row`
    pub fn timestamp(&self, row: usize) -> Option<&str> {
        self.timestamps.get(row).map(String::as_str)
    }

    /// Value of stream number `stream` at row `row`
    pub fn value(&self, stream: usize, row: usize) -> Option<&str> {
        self.streams
            .get(stream)
            .and_then(|s| s.values.get(row))
            .map(String::as_str)
    }

    /// All values of the stream called `name`
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.by_name
            .get(name)
            .map(|&index| self.streams[index].values.as_slice())
    }
}

impl Default for TimeSeriesStore {
    fn default() -> Self {
        Self::new(" ")
    }
}
