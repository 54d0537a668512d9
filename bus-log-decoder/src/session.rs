//! Per-file conversion state
//!
//! A [`ConversionSession`] owns everything one log file needs while it is
//! parsed: the alias table, the open port context and the value store. A
//! new session is created for every file, so nothing leaks between files.
//!
//! Lines are fed in file order. Each line is classified against every known
//! shape and each matching handler runs, in the order alias, parameter
//! update, open port, close port.

use crate::aliases::AliasTable;
use crate::config::ConverterConfig;
use crate::context::ContextTracker;
use crate::emit::Emitter;
use crate::lines::{LineClassifier, LineMatch, UpdateKind};
use crate::store::TimeSeriesStore;
use crate::types::{BusAddress, ContextMismatch, ConvertError, Result};
use std::io::BufRead;

/// Parsing state for a single log file
pub struct ConversionSession {
    config: ConverterConfig,
    aliases: AliasTable,
    context: ContextTracker,
    store: TimeSeriesStore,
    mismatches: Vec<ContextMismatch>,
    lines_read: usize,
    updates: usize,
}

impl ConversionSession {
    /// Create an empty session
    pub fn new(config: ConverterConfig) -> Self {
        let store = TimeSeriesStore::new(config.blank_cell.clone());
        Self {
            config,
            aliases: AliasTable::new(),
            context: ContextTracker::new(),
            store,
            mismatches: Vec::new(),
            lines_read: 0,
            updates: 0,
        }
    }

    /// Process the next line of the file
    ///
    /// Line numbers are counted from 1 in the order lines are fed.
    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        self.lines_read += 1;
        let line_number = self.lines_read;

        for matched in LineClassifier::global().classify(line) {
            log::trace!("line {}: {:?}", line_number, matched);
            match matched {
                LineMatch::Alias { bus, port, id, name } => {
                    self.handle_alias(line_number, bus, port, id, name)?
                }
                LineMatch::ParamUpdate {
                    time,
                    kind,
                    param_id,
                    value,
                } => self.handle_update(line_number, time, kind, param_id, value)?,
                LineMatch::OpenPort { bus, port, .. } => {
                    self.handle_open(line_number, bus, port)?
                }
                LineMatch::ClosePort { bus, port, .. } => {
                    self.handle_close(line_number, bus, port)?
                }
            }
        }

        Ok(())
    }

    fn handle_alias(
        &mut self,
        line: usize,
        bus: &str,
        port: &str,
        id: &str,
        name: &str,
    ) -> Result<()> {
        let alias_error = |reason: String| ConvertError::AliasParse { line, reason };

        let bus_id = parse_id(bus, "bus ID").map_err(alias_error)?;
        let port_id = parse_id(port, "port ID").map_err(alias_error)?;
        let param_id = parse_id(id, "parameter ID").map_err(alias_error)?;
        if name.is_empty() {
            log::warn!(
                "line {}: empty alias name for {}.{}.{}",
                line,
                bus_id,
                port_id,
                param_id
            );
        }

        self.aliases
            .insert(BusAddress::new(bus_id, port_id, param_id), name);
        Ok(())
    }

    fn handle_update(
        &mut self,
        line: usize,
        time: &str,
        kind: UpdateKind,
        param_id: &str,
        value: &str,
    ) -> Result<()> {
        let param_id = parse_id(param_id, "parameter ID")
            .map_err(|reason| ConvertError::ParamUpdateParse { line, reason })?;

        let address = self.context.address_for(param_id);
        if self.context.current().is_invalid() {
            log::debug!(
                "line {}: {} of parameter {} outside any open port",
                line,
                if kind.is_write() { "write" } else { "read" },
                param_id
            );
        }

        self.store.record_value(&self.aliases, time, address, value);
        self.updates += 1;
        Ok(())
    }

    fn handle_open(&mut self, line: usize, bus: &str, port: &str) -> Result<()> {
        let (bus_id, port_id) = parse_port(line, bus, port)?;
        self.context.open(bus_id, port_id);
        Ok(())
    }

    fn handle_close(&mut self, line: usize, bus: &str, port: &str) -> Result<()> {
        let (bus_id, port_id) = parse_port(line, bus, port)?;
        if let Some(mismatch) = self.context.close(bus_id, port_id, line) {
            log::warn!("Malformed file: {}", mismatch);
            self.mismatches.push(mismatch);
        }
        Ok(())
    }

    /// Current port context
    pub fn context(&self) -> &ContextTracker {
        &self.context
    }

    /// Aliases defined so far
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Table built so far
    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    /// Context mismatches seen so far
    pub fn mismatches(&self) -> &[ContextMismatch] {
        &self.mismatches
    }

    /// End the session and keep the finished table
    pub fn finish(self) -> ConvertedLog {
        let summary = ConversionSummary {
            lines: self.lines_read,
            rows: self.store.len(),
            updates: self.updates,
            streams: self.store.stream_count(),
            aliases: self.aliases.len(),
            context_mismatches: self.mismatches.len(),
        };

        ConvertedLog {
            config: self.config,
            store: self.store,
            mismatches: self.mismatches,
            summary,
        }
    }
}

/// Statistics about one converted file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Lines read from the input
    pub lines: usize,
    /// Data rows in the table
    pub rows: usize,
    /// Parameter update lines recognised
    pub updates: usize,
    /// Columns in the table, excluding time
    pub streams: usize,
    /// Aliases defined in the file
    pub aliases: usize,
    /// CLOSE lines that did not match the open port
    pub context_mismatches: usize,
}

/// A fully parsed log, ready to be written
pub struct ConvertedLog {
    config: ConverterConfig,
    store: TimeSeriesStore,
    mismatches: Vec<ContextMismatch>,
    summary: ConversionSummary,
}

impl ConvertedLog {
    /// The table
    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    /// Context mismatches reported while parsing
    pub fn mismatches(&self) -> &[ContextMismatch] {
        &self.mismatches
    }

    /// Conversion statistics
    pub fn summary(&self) -> ConversionSummary {
        self.summary
    }

    /// Emitter over the table using the session's configuration
    pub fn emitter(&self) -> Emitter<'_> {
        Emitter::new(&self.store, &self.config)
    }

    /// Render the whole table as CSV text
    pub fn to_csv_string(&self) -> String {
        self.emitter().to_csv_string()
    }
}

/// Parse a complete log from a reader
///
/// Lines are read as bytes; bytes that are not valid UTF-8 are replaced, so
/// a stray Latin-1 character in a comment does not stop the conversion.
/// Read failures are reported as [`ConvertError::IoError`]; callers that
/// know the file path map them to [`ConvertError::Input`].
pub fn convert_reader<R: BufRead>(mut reader: R, config: ConverterConfig) -> Result<ConvertedLog> {
    let mut session = ConversionSession::new(config);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }

        let mut bytes = buffer.as_slice();
        if let Some(stripped) = bytes.strip_suffix(b"\n") {
            bytes = stripped;
        }
        if let Some(stripped) = bytes.strip_suffix(b"\r") {
            bytes = stripped;
        }

        let line = String::from_utf8_lossy(bytes);
        if let std::borrow::Cow::Owned(_) = line {
            log::debug!("line {}: replaced invalid UTF-8 bytes", session.lines_read + 1);
        }
        session.feed_line(&line)?;
    }
    Ok(session.finish())
}

/// Parse a complete log held in memory
pub fn convert_str(text: &str, config: ConverterConfig) -> Result<ConvertedLog> {
    let mut session = ConversionSession::new(config);
    for line in text.lines() {
        session.feed_line(line)?;
    }
    Ok(session.finish())
}

fn parse_id(field: &str, what: &str) -> std::result::Result<u32, String> {
    field
        .parse::<u32>()
        .map_err(|e| format!("invalid {} '{}': {}", what, field, e))
}

fn parse_port(line: usize, bus: &str, port: &str) -> Result<(u32, u32)> {
    let port_error = |reason: String| ConvertError::PortParse { line, reason };
    let bus_id = parse_id(bus, "bus ID").map_err(port_error)?;
    let port_id = parse_id(port, "port ID").map_err(port_error)?;
    Ok((bus_id, port_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PortState;

    const SAMPLE: &str = "\
* ALIAS: 1.2.100 = ENGINE_N1
1.0,OPEN,1.2,
1.0,READ_PARAM,100,55
2.0,WRITE_PARAM,100,60
2.0,CLOSE,1.2,
";

    #[test]
    fn test_end_to_end_sample() {
        let log = convert_str(SAMPLE, ConverterConfig::default()).unwrap();
        assert_eq!(log.to_csv_string(), "TIME(s),ENGINE_N1\n1.0,55\n2.0,60\n");

        let summary = log.summary();
        assert_eq!(summary.lines, 5);
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.updates, 2);
        assert_eq!(summary.streams, 1);
        assert_eq!(summary.aliases, 1);
        assert_eq!(summary.context_mismatches, 0);
    }

    #[test]
    fn test_row_count_matches_updates() {
        let text = "\
1.0,OPEN,3.4,
1.0,READ_PARAM,1,a
1.1,WRITE_MSG_UNPACK_PARAM,2,b
some noise
1.2,READ_MSG_UNPACK_PARAM,1,c
* comment
1.3,WRITE_PARAM,3,d
";
        let log = convert_str(text, ConverterConfig::default()).unwrap();
        assert_eq!(log.summary().rows, 4);
        assert_eq!(log.store().timestamp(3), Some("1.3"));
        assert_eq!(
            log.store().stream_names().collect::<Vec<_>>(),
            vec!["3.4.1", "3.4.2", "3.4.3"]
        );
    }

    #[test]
    fn test_mismatched_close_is_not_fatal() {
        let mut session = ConversionSession::new(ConverterConfig::default());
        session.feed_line("1.0,OPEN,1.2,").unwrap();
        session.feed_line("1.5,CLOSE,9.9,").unwrap();

        assert_eq!(session.context().state(), PortState::Closed);
        assert_eq!(session.mismatches().len(), 1);
        assert_eq!(session.mismatches()[0].line, 2);

        session.feed_line("2.0,READ_PARAM,5,x").unwrap();
        assert_eq!(
            session.store().stream_names().collect::<Vec<_>>(),
            vec!["4294967295.4294967295.5"]
        );
    }

    #[test]
    fn test_malformed_alias_is_fatal() {
        let err = convert_str("ok\n* ALIAS: 1..3 = X\n", ConverterConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConvertError::AliasParse { line: 2, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_alias_id_overflow_is_fatal() {
        let err = convert_str("* ALIAS: 1.2.99999999999 = X\n", ConverterConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConvertError::AliasParse { line: 1, .. }));
    }

    #[test]
    fn test_empty_alias_name_is_kept() {
        let text = "* ALIAS: 1.2.100 = \n1.0,OPEN,1.2,\n1.0,READ_PARAM,100,55\n";
        let log = convert_str(text, ConverterConfig::default()).unwrap();
        assert_eq!(log.summary().aliases, 1);
        assert_eq!(log.to_csv_string(), "TIME(s),\n1.0,55\n");
    }

    #[test]
    fn test_malformed_update_is_fatal() {
        let text = "1.0,OPEN,1.2,\n1.0,READ_PARAM,,55\n";
        let err = convert_str(text, ConverterConfig::default()).err().unwrap();
        assert!(matches!(err, ConvertError::ParamUpdateParse { line: 2, .. }));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_malformed_port_is_fatal() {
        let err = convert_str("1.0,OPEN,.2,\n", ConverterConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConvertError::PortParse { line: 1, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_alias_after_first_use_does_not_rename() {
        let text = "\
1.0,OPEN,1.2,
1.0,READ_PARAM,100,55
* ALIAS: 1.2.100 = ENGINE_N1
2.0,READ_PARAM,100,60
";
        let log = convert_str(text, ConverterConfig::default()).unwrap();
        assert_eq!(log.to_csv_string(), "TIME(s),1.2.100\n1.0,55\n2.0,60\n");
    }

    #[test]
    fn test_convert_reader_accepts_latin1_comment() {
        let mut bytes = b"* operator: Jos".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"\n1.0,OPEN,1.2,\n1.0,READ_PARAM,100,55\n1.5,READ_PARAM,100,5");
        bytes.push(0xB0);
        bytes.push(b'\n');

        let log = convert_reader(bytes.as_slice(), ConverterConfig::default()).unwrap();
        assert_eq!(log.summary().lines, 4);
        assert_eq!(log.store().values("1.2.100").unwrap(), ["55", "5\u{FFFD}"]);
    }

    #[test]
    fn test_convert_reader_reports_line_numbers() {
        let text = "* comment\r\n1.0,OPEN,1.2,\r\n1.0,READ_PARAM,x,55\r\n";
        let err = convert_reader(text.as_bytes(), ConverterConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConvertError::ParamUpdateParse { line: 3, .. }));
    }

    #[test]
    fn test_convert_reader_handles_crlf() {
        let text = "1.0,OPEN,1.2,\r\n1.0,READ_PARAM,100,55\r\n";
        let log = convert_reader(text.as_bytes(), ConverterConfig::default()).unwrap();
        assert_eq!(log.store().values("1.2.100").unwrap(), ["55"]);
    }
}
