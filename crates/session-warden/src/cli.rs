use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "session-warden",
    version,
    about = "Rule-based access control for login sessions"
)]
pub struct Cli {
    /// Directory holding the *.conf rule files
    #[arg(short, long, default_value = "/etc/session-warden.d")]
    pub config_dir: PathBuf,

    /// Directory holding the monthly session log files
    #[arg(short, long, default_value = "/var/log/session-warden")]
    pub log_dir: PathBuf,

    /// Notifier helper executable (overrides the built-in path)
    #[arg(long)]
    pub notifier: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the login flow for a session request; exits 0 when admitted
    Check {
        /// Requesting service (e.g. sshd, gdm)
        #[arg(short, long)]
        service: String,

        /// Login name requesting the session
        #[arg(short, long)]
        user: String,

        /// Remote host; empty means a local login
        #[arg(long, default_value = "")]
        host: String,
    },

    /// Run the close-notification flow for an ending session
    Close {
        #[arg(short, long)]
        service: String,

        #[arg(short, long)]
        user: String,

        #[arg(long, default_value = "")]
        host: String,
    },

    /// Print the global policy and the parsed rules for a service
    Rules {
        #[arg(short, long)]
        service: String,
    },
}
