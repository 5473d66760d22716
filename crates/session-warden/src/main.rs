mod cli;
mod flow;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use access_policy::{loader, GroupResolver, SessionCensus};
use host_bridge::{
    CommandRunner, LoginctlCensus, NotifyDialog, NssGroupResolver, SessionDialog,
    SystemCommandRunner,
};
use session_log::SessionLogWriter;

use crate::cli::{Cli, Command};
use crate::flow::{AccessResult, SessionGate};

fn main() -> ExitCode {
    // 1. Parse CLI args.
    let cli = Cli::parse();

    // 2. Init tracing-subscriber.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    // 3. Wire the host oracles behind their ports.
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner);
    let resolver: Arc<dyn GroupResolver> = Arc::new(NssGroupResolver);
    let census: Arc<dyn SessionCensus> = Arc::new(LoginctlCensus::new(
        Arc::clone(&runner),
        Arc::clone(&resolver),
    ));
    let dialog: Arc<dyn SessionDialog> = match cli.notifier {
        Some(ref helper) => Arc::new(NotifyDialog::with_helper(runner, helper.clone())),
        None => Arc::new(NotifyDialog::new(runner)),
    };

    let gate = SessionGate::new(
        &cli.config_dir,
        resolver,
        census,
        dialog,
        SessionLogWriter::new(&cli.log_dir),
    );

    match cli.command {
        Command::Check {
            service,
            user,
            host,
        } => {
            info!(
                config_dir = %cli.config_dir.display(),
                service = %service,
                user = %user,
                "session check"
            );
            match gate.open_session(&service, &host, &user) {
                AccessResult::Granted => {
                    println!("OPEN");
                    ExitCode::SUCCESS
                }
                AccessResult::Denied => {
                    println!("CLOSE");
                    ExitCode::from(1)
                }
            }
        }

        Command::Close {
            service,
            user,
            host,
        } => {
            gate.close_session(&service, &host, &user);
            ExitCode::SUCCESS
        }

        Command::Rules { service } => {
            let lines = loader::load_config_dir(&cli.config_dir);
            let policy = loader::global_policy(&lines);
            println!("default: {:?}  debug: {}", policy.default, policy.debug);
            for rule in loader::parse_rules(&lines, &service) {
                println!(
                    "{:<8} {:<6} {}",
                    rule.action.as_str(),
                    rule.subject_kind.as_str(),
                    rule.subjects.join(",")
                );
            }
            ExitCode::SUCCESS
        }
    }
}
