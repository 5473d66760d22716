use std::sync::Arc;

use tracing::debug;

use crate::command::CommandRunner;

/// Default location of the notifier helper.
pub const DEFAULT_NOTIFIER: &str = "/usr/share/session-warden/notify";

/// Which window the notifier should raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// Confirmation window; the reply decides the login.
    Ask,
    /// Session-closed notification.
    Info,
    /// Denied-login notice on the display manager's X session.
    Xorg,
}

impl DialogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Info => "info",
            Self::Xorg => "xorg",
        }
    }
}

/// Errors from the interactive confirmation collaborator.  Unlike config
/// and resolver failures these surface to the caller, which must fail
/// closed.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("failed to spawn notifier: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("notifier reply is not an integer: {0:?}")]
    UnparseableReply(String),
}

/// Contract for the interactive confirmation collaborator.
///
/// There is no timeout here: an unresponsive collaborator blocks the
/// calling authentication flow, and any deadline must be imposed by the
/// caller or the collaborator itself.
pub trait SessionDialog {
    /// Raise a window.  The returned string is the collaborator's raw
    /// stdout.
    fn show(
        &self,
        debug: bool,
        host: &str,
        login: &str,
        kind: DialogKind,
        service: &str,
    ) -> Result<String, DialogError>;

    /// Raise the `ask` window and interpret the reply: `0` approves, any
    /// other integer denies, anything else is an interaction error.
    fn confirm(
        &self,
        debug: bool,
        host: &str,
        login: &str,
        service: &str,
    ) -> Result<bool, DialogError> {
        let reply = self.show(debug, host, login, DialogKind::Ask, service)?;
        match reply.trim().parse::<i64>() {
            Ok(0) => Ok(true),
            Ok(_) => Ok(false),
            Err(_) => Err(DialogError::UnparseableReply(reply)),
        }
    }
}

/// Out-of-process notifier client, spawned through the command port with
/// argv `(debug, host, login, kind, service)`.
pub struct NotifyDialog {
    runner: Arc<dyn CommandRunner>,
    helper: String,
}

impl NotifyDialog {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_helper(runner, DEFAULT_NOTIFIER)
    }

    pub fn with_helper(runner: Arc<dyn CommandRunner>, helper: impl Into<String>) -> Self {
        Self {
            runner,
            helper: helper.into(),
        }
    }
}

impl SessionDialog for NotifyDialog {
    fn show(
        &self,
        debug: bool,
        host: &str,
        login: &str,
        kind: DialogKind,
        service: &str,
    ) -> Result<String, DialogError> {
        let debug_arg = if debug { "True" } else { "False" };
        let out = self.runner.run(
            &self.helper,
            &[debug_arg, host, login, kind.as_str(), service],
        )?;
        debug!(
            helper = %self.helper,
            kind = kind.as_str(),
            status = out.status,
            stdout = %out.stdout,
            "notifier finished"
        );
        Ok(out.stdout)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::command::CommandOutput;

    use super::*;

    struct ScriptedRunner {
        stdout: &'static str,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(stdout: &'static str) -> Self {
            Self {
                stdout,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(program.to_string());
            seen.extend(args.iter().map(|a| a.to_string()));
            Ok(CommandOutput {
                status: 0,
                stdout: self.stdout.to_string(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn zero_reply_approves() {
        let runner = Arc::new(ScriptedRunner::new("0\n"));
        let dialog = NotifyDialog::with_helper(runner, "/opt/notify");
        assert!(dialog.confirm(false, "web1", "alice", "sshd").unwrap());
    }

    #[test]
    fn nonzero_reply_denies() {
        let runner = Arc::new(ScriptedRunner::new("1\n"));
        let dialog = NotifyDialog::new(runner);
        assert!(!dialog.confirm(false, "web1", "alice", "sshd").unwrap());
    }

    #[test]
    fn unparseable_reply_is_an_interaction_error() {
        let runner = Arc::new(ScriptedRunner::new("maybe later\n"));
        let dialog = NotifyDialog::new(runner);
        let err = dialog.confirm(false, "web1", "alice", "sshd").unwrap_err();
        assert!(matches!(err, DialogError::UnparseableReply(_)));
    }

    #[test]
    fn notifier_argv_matches_the_contract() {
        let runner = Arc::new(ScriptedRunner::new("0"));
        let dialog = NotifyDialog::with_helper(Arc::clone(&runner) as Arc<dyn CommandRunner>, "/opt/notify");
        dialog
            .show(true, "web1", "alice", DialogKind::Info, "sshd")
            .unwrap();

        let seen = runner.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec!["/opt/notify", "True", "web1", "alice", "info", "sshd"]
        );
    }
}
