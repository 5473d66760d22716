use chrono::{DateTime, Local};

/// Column widths of one log record, in order.  Fields longer than their
/// column are written in full; the widths are minimums, not truncation.
pub const TIMESTAMP_WIDTH: usize = 23;
pub const SERVICE_WIDTH: usize = 10;
pub const MODE_WIDTH: usize = 10;
pub const PRINCIPAL_WIDTH: usize = 50;
pub const MESSAGE_WIDTH: usize = 15;

/// Format the `user@host` column, substituting `localhost` for an empty
/// remote host.
pub fn principal(login: &str, host: &str) -> String {
    let host = if host.is_empty() { "localhost" } else { host };
    format!("{login}@{host}")
}

/// Render one fixed-width, newline-terminated record.
pub fn format_record(
    timestamp: DateTime<Local>,
    service: &str,
    mode: &str,
    login: &str,
    host: &str,
    message: &str,
) -> String {
    let stamp = timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
    format!(
        "{stamp:<tw$}{service:<sw$}{mode:<mw$}{principal:<pw$}{message:<gw$}\n",
        principal = principal(login, host),
        tw = TIMESTAMP_WIDTH,
        sw = SERVICE_WIDTH,
        mw = MODE_WIDTH,
        pw = PRINCIPAL_WIDTH,
        gw = MESSAGE_WIDTH,
    )
}

/// The letter-bearing tokens of one record, split into the expected column
/// layout.
///
/// Tokenizing is purely positional: the two timestamp tokens carry no
/// letters and are dropped by the filter, leaving service, mode,
/// `user@host`, and the message words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub service: String,
    pub mode: String,
    pub principal: String,
    /// Message words; always at least two for a valid record.
    pub message: Vec<String>,
}

/// Tokenize one log line.  Returns `None` for lines that do not parse into
/// the expected layout (fewer than five letter-bearing tokens).
pub fn parse_line(line: &str) -> Option<RecordFields> {
    let tokens: Vec<&str> = line
        .split_whitespace()
        .filter(|token| token.chars().any(|c| c.is_ascii_alphabetic()))
        .collect();
    if tokens.len() < 5 {
        return None;
    }
    Some(RecordFields {
        service: tokens[0].to_string(),
        mode: tokens[1].to_string(),
        principal: tokens[2].to_string(),
        message: tokens[3..].iter().map(|t| t.to_string()).collect(),
    })
}
