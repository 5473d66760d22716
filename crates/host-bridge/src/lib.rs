//! Host-facing adapters for session-warden.
//!
//! The decision core consumes its group-membership and session-census
//! oracles through traits; this crate provides the real implementations,
//! plus the out-of-process notification dialog client.  All process
//! spawning goes through the [`CommandRunner`] port so every adapter can be
//! exercised with fake runners in tests.

pub mod census;
pub mod command;
pub mod dialog;
pub mod groups;

// Re-export primary public types at the crate root.
pub use census::LoginctlCensus;
pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use dialog::{DialogError, DialogKind, NotifyDialog, SessionDialog};
pub use groups::NssGroupResolver;
