//! Message type definitions for the line protocol.
//!
//! Commands arrive as single `\n`-terminated lines. Replies are rendered
//! with `Display` and always written as whole lines.

use std::fmt;

/// A command parsed from one client line.
///
/// Verbs match case-insensitively. `list`, `status` and `exit` must stand
/// alone on the line; anything that is not a recognised command is echoed.
///
/// # Examples
///
/// ```
/// use harbor_server::messaging::Command;
///
/// assert_eq!(Command::parse("  LIST "), Some(Command::List));
/// assert_eq!(Command::parse("get notes.txt"), Some(Command::Get("notes.txt".into())));
/// assert_eq!(Command::parse("hello"), Some(Command::Message("hello".into())));
/// assert_eq!(Command::parse("   "), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enumerate repository files
    List,
    /// Stream the named file
    Get(String),
    /// `get` without a file name
    GetUsage,
    /// Render the client registry
    Status,
    /// End the session
    Exit,
    /// Any other text, echoed back with ` ACK`
    Message(String),
}

impl Command {
    /// Parses a received line, returning `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let text = line.trim();
        if text.is_empty() {
            return None;
        }

        let (verb, rest) = match text.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (text, ""),
        };
        let verb = verb.to_ascii_lowercase();

        let command = match (verb.as_str(), rest.is_empty()) {
            ("list", true) => Command::List,
            ("status", true) => Command::Status,
            ("exit", true) => Command::Exit,
            ("get", true) => Command::GetUsage,
            ("get", false) => Command::Get(rest.to_string()),
            _ => Command::Message(text.to_string()),
        };
        Some(command)
    }
}

/// A line sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Handshake: the assigned client name
    Name(String),
    /// Capacity rejection, sent before closing
    Busy(String),
    /// Sorted repository listing
    Files(Vec<String>),
    /// Header preceding exactly `n` raw bytes
    FileSize(u64),
    /// Terminator after a file payload
    FileEnd,
    /// Error with a human readable message
    Error(String),
    /// Opens a status report
    StatusBegin,
    /// One status report row
    StatusLine(String),
    /// Closes a status report
    StatusEnd,
    /// Final reply to `exit`
    Bye,
    /// Echo of an unrecognised line
    Ack(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Name(name) => write!(f, "NAME {name}"),
            Reply::Busy(reason) => write!(f, "BUSY {reason}"),
            Reply::Files(files) if files.is_empty() => f.write_str("FILES <empty>"),
            Reply::Files(files) => write!(f, "FILES {}", files.join(" | ")),
            Reply::FileSize(size) => write!(f, "FILESIZE {size}"),
            Reply::FileEnd => f.write_str("FILEEND"),
            Reply::Error(message) => write!(f, "ERROR {message}"),
            Reply::StatusBegin => f.write_str("STATUS-BEGIN"),
            Reply::StatusLine(line) => f.write_str(line),
            Reply::StatusEnd => f.write_str("STATUS-END"),
            Reply::Bye => f.write_str("BYE"),
            Reply::Ack(text) => write!(f, "{text} ACK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verbs_case_insensitive() {
        assert_eq!(Command::parse("list"), Some(Command::List));
        assert_eq!(Command::parse("Status"), Some(Command::Status));
        assert_eq!(Command::parse("EXIT"), Some(Command::Exit));
        assert_eq!(Command::parse("Exit\r"), Some(Command::Exit));
    }

    #[test]
    fn test_parse_get_keeps_filename_case() {
        assert_eq!(
            Command::parse("GET Report.PDF"),
            Some(Command::Get("Report.PDF".to_string()))
        );
        assert_eq!(
            Command::parse("get   spaced name.txt  "),
            Some(Command::Get("spaced name.txt".to_string()))
        );
    }

    #[test]
    fn test_parse_get_without_filename() {
        assert_eq!(Command::parse("get"), Some(Command::GetUsage));
        assert_eq!(Command::parse("get    "), Some(Command::GetUsage));
    }

    #[test]
    fn test_parse_extra_arguments_echo() {
        assert_eq!(
            Command::parse("list everything"),
            Some(Command::Message("list everything".to_string()))
        );
        assert_eq!(
            Command::parse("exit now"),
            Some(Command::Message("exit now".to_string()))
        );
        assert_eq!(
            Command::parse("getfile.txt"),
            Some(Command::Message("getfile.txt".to_string()))
        );
    }

    #[test]
    fn test_parse_blank_lines() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse(" \t "), None);
    }

    #[test]
    fn test_reply_rendering() {
        assert_eq!(Reply::Name("Client01".into()).to_string(), "NAME Client01");
        assert_eq!(Reply::Files(vec![]).to_string(), "FILES <empty>");
        assert_eq!(
            Reply::Files(vec!["a.txt".into(), "b.txt".into()]).to_string(),
            "FILES a.txt | b.txt"
        );
        assert_eq!(Reply::FileSize(42).to_string(), "FILESIZE 42");
        assert_eq!(Reply::Error("File not found".into()).to_string(), "ERROR File not found");
        assert_eq!(Reply::Ack("hello there".into()).to_string(), "hello there ACK");
        assert_eq!(Reply::Bye.to_string(), "BYE");
    }
}
