use std::process::Command;

/// Structured result of one finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code; `-1` when the process died without one.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Abstract command-execution port.
///
/// Every subprocess the adapters need (`loginctl`, the notifier helper)
/// goes through this trait, so the adapters stay fully testable with fake
/// runners that never fork.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] that spawns real processes and waits for them.
#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_code() {
        let out = SystemCommandRunner.run("sh", &["-c", "printf hello"]).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "hello");
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn nonzero_exit_is_not_success() {
        let out = SystemCommandRunner.run("sh", &["-c", "exit 3"]).unwrap();
        assert_eq!(out.status, 3);
        assert!(!out.success());
    }

    #[test]
    fn missing_binary_is_an_io_error() {
        assert!(SystemCommandRunner
            .run("/no/such/binary-anywhere", &[])
            .is_err());
    }
}
