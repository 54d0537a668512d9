//! Line shape recognition
//!
//! A bus monitor log mixes comment lines, port open/close records and
//! parameter reads/writes. Only four shapes matter to the converter; every
//! other line is ignored.
//!
//! The shapes are tested independently. A line may in principle match more
//! than one of them, so [`LineClassifier::classify`] reports every match in
//! the fixed order alias, parameter update, open port, close port.
//!
//! Numeric fields are captured as (possibly empty) digit runs. Turning them
//! into numbers is the handler's job, so a line with the right shape but a
//! broken number is still recognised and can be rejected with its line number.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static CLASSIFIER: LazyLock<LineClassifier> = LazyLock::new(LineClassifier::new);

/// Kind of a parameter update record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    WriteParam,
    ReadParam,
    WriteMsgUnpackParam,
    ReadMsgUnpackParam,
}

impl UpdateKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "WRITE_PARAM" => Some(UpdateKind::WriteParam),
            "READ_PARAM" => Some(UpdateKind::ReadParam),
            "WRITE_MSG_UNPACK_PARAM" => Some(UpdateKind::WriteMsgUnpackParam),
            "READ_MSG_UNPACK_PARAM" => Some(UpdateKind::ReadMsgUnpackParam),
            _ => None,
        }
    }

    /// True for the write variants
    pub fn is_write(&self) -> bool {
        matches!(self, UpdateKind::WriteParam | UpdateKind::WriteMsgUnpackParam)
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateKind::WriteParam => write!(f, "WRITE_PARAM"),
            UpdateKind::ReadParam => write!(f, "READ_PARAM"),
            UpdateKind::WriteMsgUnpackParam => write!(f, "WRITE_MSG_UNPACK_PARAM"),
            UpdateKind::ReadMsgUnpackParam => write!(f, "READ_MSG_UNPACK_PARAM"),
        }
    }
}

/// One recognised line shape, with its raw captured fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch<'a> {
    /// `* ALIAS: <bus>.<port>.<id> = <name>`
    Alias {
        bus: &'a str,
        port: &'a str,
        id: &'a str,
        name: &'a str,
    },

    /// `<time>,<KIND>,<paramID>,<value>`
    ParamUpdate {
        time: &'a str,
        kind: UpdateKind,
        param_id: &'a str,
        /// Rest of the line, verbatim (may contain commas)
        value: &'a str,
    },

    /// `<time>,OPEN,<bus>.<port>,`
    OpenPort {
        time: &'a str,
        bus: &'a str,
        port: &'a str,
    },

    /// `<time>,CLOSE,<bus>.<port>,`
    ClosePort {
        time: &'a str,
        bus: &'a str,
        port: &'a str,
    },
}

/// Recognises the line shapes of a bus monitor log
pub struct LineClassifier {
    alias: Regex,
    param_update: Regex,
    open_port: Regex,
    close_port: Regex,
}

impl LineClassifier {
    /// Compile the line patterns
    pub fn new() -> Self {
        Self {
            alias: compile(
                r"^\*\s*ALIAS\s*:\s*(?P<bus>\d*)\.(?P<port>\d*)\.(?P<id>\d*)\s*=\s*(?P<name>\w*)\s*$",
            ),
            param_update: compile(
                r"^\s*(?P<time>[\d.]*),(?P<kind>WRITE_PARAM|READ_PARAM|WRITE_MSG_UNPACK_PARAM|READ_MSG_UNPACK_PARAM)\s*,\s*(?P<param>\d*),(?P<value>.*)$",
            ),
            open_port: compile(
                r"^\s*(?P<time>[\d.]*)\s*,\s*OPEN\s*,(?P<bus>\d*)\.(?P<port>\d*)\s*,\s*$",
            ),
            close_port: compile(
                r"^\s*(?P<time>[\d.]*)\s*,\s*CLOSE\s*,(?P<bus>\d*)\.(?P<port>\d*)\s*,\s*$",
            ),
        }
    }

    /// Shared classifier, compiled once per process
    pub fn global() -> &'static LineClassifier {
        &CLASSIFIER
    }

    /// Test `line` against every shape and return all matches in handler order
    pub fn classify<'a>(&self, line: &'a str) -> Vec<LineMatch<'a>> {
        let mut matches = Vec::new();

        if let Some(caps) = self.alias.captures(line) {
            matches.push(LineMatch::Alias {
                bus: group(&caps, "bus"),
                port: group(&caps, "port"),
                id: group(&caps, "id"),
                name: group(&caps, "name"),
            });
        }

        if let Some(caps) = self.param_update.captures(line) {
            if let Some(kind) = UpdateKind::from_keyword(group(&caps, "kind")) {
                matches.push(LineMatch::ParamUpdate {
                    time: group(&caps, "time"),
                    kind,
                    param_id: group(&caps, "param"),
                    value: group(&caps, "value"),
                });
            }
        }

        if let Some(caps) = self.open_port.captures(line) {
            matches.push(LineMatch::OpenPort {
                time: group(&caps, "time"),
                bus: group(&caps, "bus"),
                port: group(&caps, "port"),
            });
        }

        if let Some(caps) = self.close_port.captures(line) {
            matches.push(LineMatch::ClosePort {
                time: group(&caps, "time"),
                bus: group(&caps, "bus"),
                port: group(&caps, "port"),
            });
        }

        matches
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("line pattern is a valid regex")
}

fn group<'a>(caps: &regex::Captures<'a>, name: &str) -> &'a str {
    caps.name(name).map(|m| m.as_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> Vec<LineMatch<'_>> {
        LineClassifier::global().classify(line)
    }

    #[test]
    fn test_alias_line() {
        assert_eq!(
            classify("* ALIAS: 1.2.100 = ENGINE_N1"),
            vec![LineMatch::Alias {
                bus: "1",
                port: "2",
                id: "100",
                name: "ENGINE_N1",
            }]
        );
        assert_eq!(classify("*ALIAS :  3.4.5=N2  ").len(), 1);
    }

    #[test]
    fn test_alias_line_with_empty_field_is_still_recognised() {
        let matches = classify("* ALIAS: 1..100 = X");
        assert!(matches!(matches[0], LineMatch::Alias { port: "", .. }));
    }

    #[test]
    fn test_param_update_kinds() {
        for keyword in [
            "WRITE_PARAM",
            "READ_PARAM",
            "WRITE_MSG_UNPACK_PARAM",
            "READ_MSG_UNPACK_PARAM",
        ] {
            let line = format!("1.5,{},42,7", keyword);
            let matches = classify(&line);
            assert_eq!(matches.len(), 1, "{}", line);
            match &matches[0] {
                LineMatch::ParamUpdate { kind, .. } => assert_eq!(kind.to_string(), keyword),
                other => panic!("unexpected match {:?}", other),
            }
        }
    }

    #[test]
    fn test_param_value_keeps_commas() {
        assert_eq!(
            classify("  12.25,READ_PARAM , 7,1,2, 3"),
            vec![LineMatch::ParamUpdate {
                time: "12.25",
                kind: UpdateKind::ReadParam,
                param_id: "7",
                value: "1,2, 3",
            }]
        );
    }

    #[test]
    fn test_open_and_close_lines() {
        assert_eq!(
            classify("1.0,OPEN,1.2,"),
            vec![LineMatch::OpenPort {
                time: "1.0",
                bus: "1",
                port: "2",
            }]
        );
        assert_eq!(
            classify("2.0 , CLOSE ,10.20, "),
            vec![LineMatch::ClosePort {
                time: "2.0",
                bus: "10",
                port: "20",
            }]
        );
    }

    #[test]
    fn test_unrecognised_lines() {
        assert!(classify("").is_empty());
        assert!(classify("* just a comment").is_empty());
        assert!(classify("1.0,RESET,1.2,").is_empty());
        assert!(classify("1.0,OPEN,1.2,extra").is_empty());
        assert!(classify("1.0,SEND_MSG,4,abc").is_empty());
    }

    #[test]
    fn test_update_kind_direction() {
        assert!(UpdateKind::WriteParam.is_write());
        assert!(UpdateKind::WriteMsgUnpackParam.is_write());
        assert!(!UpdateKind::ReadParam.is_write());
    }
}
