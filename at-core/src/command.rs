//! AT command shape
//!
//! Decides, from the shape of a command alone, how the device's reply to it
//! must be interpreted. A query such as `AT+NAME?\r\n` is answered with the
//! command identifier echoed back before the data (`+NAME:FOO\r\n`); a set
//! or action command such as `AT+RST\r\n` is answered with a bare status
//! token (`OK\r\n`).
//!
//! # Rule table
//!
//! With `n` the command length in bytes and `k = n - 5` (the command without
//! its 5-byte parameter/terminator tail, e.g. `ME?\r\n`):
//!
//! | Command shape                       | Rule                                 |
//! |-------------------------------------|--------------------------------------|
//! | `n <= 4`                            | [`EchoRule::Skip`]                   |
//! | first `min(k, 2)` bytes are not `AT`| [`EchoRule::Status`]                 |
//! | otherwise                           | [`EchoRule::Echo`] with stem `[2..k]`|
//!
//! The stem is the part of the identifier the device repeats. For
//! `AT+NAME?\r\n` it is `+NA`; for `AT+RST\r\n` it is `+`.

/// AT command prefix
pub const AT_PREFIX: &[u8] = b"AT";

/// Line terminator used by commands and replies
pub const TERMINATOR: &str = "\r\n";

/// Bytes of a command that never take part in classification
///
/// Commands no longer than this are sent but their reply is not
/// interpreted.
pub const CLASSIFY_ALLOWANCE: usize = 4;

/// Length of the parameter/terminator tail ignored when matching an echo
pub const ECHO_TAIL_LEN: usize = 5;

/// How the reply to a command is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoRule<'a> {
    /// Command too short; the reply is not interpreted
    Skip,
    /// The reply can only be a status token
    Status,
    /// The reply is echoed data if it begins with `stem`, otherwise a
    /// status token. An empty stem matches every reply.
    Echo { stem: &'a [u8] },
}

impl<'a> EchoRule<'a> {
    /// Derive the rule for `command`
    pub fn for_command(command: &'a str) -> Self {
        let bytes = command.as_bytes();
        if bytes.len() <= CLASSIFY_ALLOWANCE {
            return EchoRule::Skip;
        }

        let key_len = bytes.len() - ECHO_TAIL_LEN;
        let prefix_len = key_len.min(AT_PREFIX.len());
        if bytes[..prefix_len] != AT_PREFIX[..prefix_len] {
            return EchoRule::Status;
        }

        let stem = if key_len > AT_PREFIX.len() {
            &bytes[AT_PREFIX.len()..key_len]
        } else {
            &[]
        };
        EchoRule::Echo { stem }
    }

    /// Whether `received` is an echo of the command
    ///
    /// `received` is treated as if followed by an unbounded run of zero
    /// bytes, so a reply shorter than the stem only matches when the missing
    /// stem bytes are NUL.
    pub fn is_echo(&self, received: &[u8]) -> bool {
        match self {
            EchoRule::Skip | EchoRule::Status => false,
            EchoRule::Echo { stem } => stem
                .iter()
                .enumerate()
                .all(|(i, b)| received.get(i).copied().unwrap_or(0) == *b),
        }
    }
}
