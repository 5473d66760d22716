//! Append-only session logging for session-warden.
//!
//! Every access decision leaves one fixed-width, newline-terminated record
//! in a per-month log file.  The columns are left-justified to fixed widths
//! — timestamp (23), service (10), mode (10), `user@host` (50), message
//! (15) — so the files stay grep- and cut-friendly, and many concurrent
//! writers can append without coordination beyond line-level atomicity.
//!
//! The [`query`] module answers the one question asked at session close:
//! does the most recent record for this `login@host` describe a session
//! that is still open, and if so, was it admitted through an `ASK` rule.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use session_log::SessionLogWriter;
//!
//! let writer = SessionLogWriter::new("/var/log/session-warden");
//! writer.append("sshd", "10.0.0.7", "alice", "OPEN", "access granted")?;
//! # Ok::<(), session_log::SessionLogError>(())
//! ```

pub mod query;
pub mod record;
pub mod writer;

// Re-export primary public types at the crate root for convenience.
pub use query::{close_notice, scan_for_close, CloseNotice};
pub use record::{parse_line, principal, RecordFields};
pub use writer::{month_file_name, SessionLogError, SessionLogWriter};
