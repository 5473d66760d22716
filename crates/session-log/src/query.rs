use std::path::Path;

use chrono::Local;
use tracing::{debug, warn};

use crate::record::{parse_line, principal};
use crate::writer::month_file_name;

/// What the history scan found for a closing `login@host` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseNotice {
    /// Mode column of the record that opened the session (`OPEN`, `ASK`,
    /// ...).  The close record should re-use it.
    pub recorded_mode: String,
}

impl CloseNotice {
    /// Whether the session was admitted through an `ASK` rule; callers use
    /// this to decide the extra owner notification on close.
    pub fn needs_ask_cleanup(&self) -> bool {
        self.recorded_mode == "ASK"
    }
}

/// Scan log `contents` most-recent-first for the first structurally valid
/// record belonging to `login@host`.
///
/// Returns a [`CloseNotice`] when that record describes a still-open
/// session (message tail `new` or `granted`); `None` when no record
/// matches or the first match already indicates a closing state.
pub fn scan_for_close(contents: &str, login: &str, host: &str) -> Option<CloseNotice> {
    let wanted = principal(login, host);

    for line in contents.lines().rev() {
        let Some(fields) = parse_line(line) else {
            continue;
        };
        if fields.principal != wanted {
            continue;
        }

        debug!(principal = %wanted, mode = %fields.mode, "most recent session record");
        return match fields.message.get(1).map(String::as_str) {
            Some("new") | Some("granted") => Some(CloseNotice {
                recorded_mode: fields.mode,
            }),
            _ => None,
        };
    }
    None
}

/// Run [`scan_for_close`] against the current month's log file under `dir`.
///
/// An unreadable log file is reported and treated as "no action needed" —
/// it never blocks the close path.
pub fn close_notice(dir: &Path, login: &str, host: &str) -> Option<CloseNotice> {
    let path = dir.join(month_file_name(Local::now().date_naive()));
    match std::fs::read_to_string(&path) {
        Ok(contents) => scan_for_close(&contents, login, host),
        Err(err) => {
            warn!(file = %path.display(), %err, "cannot read session log");
            None
        }
    }
}
