//! Reply classification
//!
//! Turns the raw bytes accumulated during a transaction into response
//! lines, using the [`EchoRule`] derived from the command.

use crate::command::{EchoRule, TERMINATOR};

/// Final status token for success
pub const STATUS_OK: &str = "OK";

/// Final status token for failure
pub const STATUS_ERROR: &str = "ERROR";

/// Which branch classification took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Command too short, reply not interpreted
    Skipped,
    /// Device echoed the command identifier followed by data lines
    EchoedData,
    /// Device answered with (at most) a status token
    Status,
}

/// Outcome of classifying one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ResponseKind,
    pub lines: Vec<String>,
}

/// Classify the bytes received in reply to `command`
///
/// Never fails. Ambiguous or unrecognized replies yield no lines.
pub fn classify(command: &str, received: &[u8]) -> Classification {
    let rule = EchoRule::for_command(command);
    match rule {
        EchoRule::Skip => Classification {
            kind: ResponseKind::Skipped,
            lines: Vec::new(),
        },
        _ if rule.is_echo(received) => Classification {
            kind: ResponseKind::EchoedData,
            lines: split_lines(received),
        },
        _ => Classification {
            kind: ResponseKind::Status,
            lines: status_token(received).map(str::to_string).into_iter().collect(),
        },
    }
}

/// Split on `\r\n`, dropping empty segments
pub fn split_lines(received: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(received)
        .split(TERMINATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Recognize `OK` or `ERROR` followed by a 2-byte terminator
///
/// The terminator bytes themselves are not inspected.
fn status_token(received: &[u8]) -> Option<&'static str> {
    let body_len = received.len().checked_sub(TERMINATOR.len())?;
    match &received[..body_len] {
        b"OK" => Some(STATUS_OK),
        b"ERROR" => Some(STATUS_ERROR),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_echo() {
        let result = classify("AT+NAME?\r\n", b"+NAME:FOO\r\n");
        assert_eq!(result.kind, ResponseKind::EchoedData);
        assert_eq!(result.lines, vec!["+NAME:FOO"]);
    }

    #[test]
    fn test_multi_line_echo_keeps_order() {
        let result = classify("AT+LIST?\r\n", b"+LIST:1\r\n\r\n+LIST:2\r\nOK\r\n");
        assert_eq!(result.kind, ResponseKind::EchoedData);
        assert_eq!(result.lines, vec!["+LIST:1", "+LIST:2", "OK"]);
    }

    #[test]
    fn test_status_ok() {
        let result = classify("AT+RST\r\n", b"OK\r\n");
        assert_eq!(result.kind, ResponseKind::Status);
        assert_eq!(result.lines, vec!["OK"]);
    }

    #[test]
    fn test_status_error() {
        let result = classify("AT+BAUD=9\r\n", b"ERROR\r\n");
        assert_eq!(result.lines, vec!["ERROR"]);
    }

    #[test]
    fn test_status_unrecognized() {
        assert!(classify("AT+RST\r\n", b"BUSY\r\n").lines.is_empty());
        assert!(classify("AT+RST\r\n", b"OK").lines.is_empty());
        assert!(classify("AT+RST\r\n", b"OK\r\nOK\r\n").lines.is_empty());
    }

    #[test]
    fn test_status_terminator_not_inspected() {
        assert_eq!(classify("AT+RST\r\n", b"OK\n\n").lines, vec!["OK"]);
    }

    #[test]
    fn test_nothing_received() {
        let result = classify("AT+RST\r\n", b"");
        assert_eq!(result.kind, ResponseKind::Status);
        assert!(result.lines.is_empty());
    }

    #[test]
    fn test_single_byte_received() {
        assert!(classify("AT+RST\r\n", b"O").lines.is_empty());
    }

    #[test]
    fn test_short_command_skipped() {
        let result = classify("AT\r\n", b"OK\r\n");
        assert_eq!(result.kind, ResponseKind::Skipped);
        assert!(result.lines.is_empty());
    }

    #[test]
    fn test_set_command_with_echoed_reply() {
        // A set command whose reply starts with its identifier is data too
        let result = classify("AT+NAME=B\r\n", b"+NAME:B\r\nOK\r\n");
        assert_eq!(result.kind, ResponseKind::EchoedData);
        assert_eq!(result.lines, vec!["+NAME:B", "OK"]);
    }

    #[test]
    fn test_split_lines_lossy() {
        assert_eq!(split_lines(b"\r\n\r\nA\xffB\r\n"), vec!["A\u{fffd}B"]);
        assert!(split_lines(b"").is_empty());
    }
}
