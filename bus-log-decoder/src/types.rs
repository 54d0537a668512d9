//! Core types for the bus log decoder library
//!
//! This module defines the address type shared by every component, the
//! error taxonomy, and the non-fatal diagnostics a conversion can produce.

use std::fmt;
use std::path::PathBuf;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Marker for an unset bus, port or parameter field
pub const INVALID_ID: u32 = u32::MAX;

/// Location of a value on the bus: (bus, port, parameter)
///
/// Fields set to [`INVALID_ID`] are unset. An address with every field unset
/// means "no address", which is also what a closed port context looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusAddress {
    /// Bus identifier
    pub bus_id: u32,
    /// Port identifier on the bus
    pub port_id: u32,
    /// Parameter identifier within the port
    pub param_id: u32,
}

impl BusAddress {
    /// The all-unset address
    pub const INVALID: BusAddress = BusAddress {
        bus_id: INVALID_ID,
        port_id: INVALID_ID,
        param_id: INVALID_ID,
    };

    /// Create a new bus address
    pub fn new(bus_id: u32, port_id: u32, param_id: u32) -> Self {
        Self {
            bus_id,
            port_id,
            param_id,
        }
    }

    /// Address of a bus/port scope, with the parameter left unset
    pub fn port(bus_id: u32, port_id: u32) -> Self {
        Self::new(bus_id, port_id, INVALID_ID)
    }

    /// True if every field is unset
    pub fn is_invalid(&self) -> bool {
        *self == Self::INVALID
    }
}

impl Default for BusAddress {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.bus_id, self.port_id, self.param_id)
    }
}

/// Errors that can occur while converting bus logs
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Could not import alias at line {line} [{reason}]")]
    AliasParse { line: usize, reason: String },

    #[error("Malformed parameter update at line {line} [{reason}]")]
    ParamUpdateParse { line: usize, reason: String },

    #[error("Invalid port ID at line {line} [{reason}]")]
    PortParse { line: usize, reason: String },

    #[error("Could not read input file {path:?}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write CSV file {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File {0:?} does not have the expected .bus.log extension")]
    UnsupportedExtension(PathBuf),

    #[error("Argument {0:?} should be a folder or file path")]
    InvalidPath(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConvertError {
    /// True if this error must abort the whole run rather than just the current file
    ///
    /// Malformed alias, parameter and port lines mean the log format is corrupt
    /// or unsupported, and an unusable path argument leaves nothing to do.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::AliasParse { .. }
                | ConvertError::ParamUpdateParse { .. }
                | ConvertError::PortParse { .. }
                | ConvertError::InvalidPath(_)
        )
    }

    /// Line number the error refers to, for parse errors
    pub fn line(&self) -> Option<usize> {
        match self {
            ConvertError::AliasParse { line, .. }
            | ConvertError::ParamUpdateParse { line, .. }
            | ConvertError::PortParse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// A CLOSE line that did not match the currently open port
///
/// This is a consistency warning only: the context is reset anyway and
/// parsing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMismatch {
    /// Line number of the offending CLOSE
    pub line: usize,
    /// Bus/port named by the CLOSE line
    pub closed: BusAddress,
    /// Context that was open at the time (None if no port was open)
    pub open: Option<BusAddress>,
}

impl fmt::Display for ContextMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the context {}.{} closed at line {} was never opened",
            self.closed.bus_id, self.closed.port_id, self.line
        )?;
        match &self.open {
            Some(open) => write!(f, ", current context is {}.{}", open.bus_id, open.port_id),
            None => write!(f, ", no context is open"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        assert_eq!(BusAddress::new(1, 2, 100).to_string(), "1.2.100");
        assert_eq!(
            BusAddress::port(3, 4).to_string(),
            format!("3.4.{}", INVALID_ID)
        );
    }

    #[test]
    fn test_address_value_equality() {
        assert_eq!(BusAddress::new(1, 2, 3), BusAddress::new(1, 2, 3));
        assert_ne!(BusAddress::new(1, 2, 3), BusAddress::new(1, 3, 2));
        assert!(BusAddress::default().is_invalid());
        assert!(!BusAddress::port(1, 2).is_invalid());
    }

    #[test]
    fn test_fatal_classification() {
        let alias = ConvertError::AliasParse {
            line: 3,
            reason: "bad".to_string(),
        };
        assert!(alias.is_fatal());
        assert_eq!(alias.line(), Some(3));

        let output = ConvertError::Output {
            path: PathBuf::from("out.csv"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(!output.is_fatal());
        assert_eq!(output.line(), None);

        assert!(!ConvertError::UnsupportedExtension(PathBuf::from("a.txt")).is_fatal());
    }

    #[test]
    fn test_mismatch_display() {
        let mismatch = ContextMismatch {
            line: 7,
            closed: BusAddress::port(9, 9),
            open: Some(BusAddress::port(1, 2)),
        };
        let text = mismatch.to_string();
        assert!(text.contains("line 7"));
        assert!(text.contains("current context is 1.2"));
    }
}
