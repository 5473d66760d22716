use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use access_policy::{loader, Decision, DecisionEngine, GroupResolver, SessionCensus, Verdict};
use host_bridge::{DialogKind, SessionDialog};
use session_log::{close_notice, SessionLogWriter};

/// Display-manager services whose denied logins get a notice on the
/// greeter's X session.
const DISPLAY_MANAGER_SERVICES: [&str; 5] = ["slim", "sddm", "lightdm", "xdm", "kdm"];

/// Outcome of a session request, as reported to the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Granted,
    Denied,
}

/// Wires the decision engine to the host oracles, the notifier, and the
/// session log for the login and close flows.
///
/// Configuration is re-read on every request; the host environment invokes
/// these flows once per login/session event, and the rules on disk may have
/// changed in between.
pub struct SessionGate {
    config_dir: PathBuf,
    resolver: Arc<dyn GroupResolver>,
    census: Arc<dyn SessionCensus>,
    dialog: Arc<dyn SessionDialog>,
    log: SessionLogWriter,
}

impl SessionGate {
    pub fn new(
        config_dir: impl Into<PathBuf>,
        resolver: Arc<dyn GroupResolver>,
        census: Arc<dyn SessionCensus>,
        dialog: Arc<dyn SessionDialog>,
        log: SessionLogWriter,
    ) -> Self {
        Self {
            config_dir: config_dir.into(),
            resolver,
            census,
            dialog,
            log,
        }
    }

    /// Login / session-open flow.
    pub fn open_session(&self, service: &str, host: &str, login: &str) -> AccessResult {
        let span = info_span!("session", service, login);
        let _guard = span.enter();

        let (decision, debug) = self.decide(service, login);
        info!(verdict = %decision.verdict, reason = %decision.reason, "decision");

        match decision.verdict {
            Verdict::Open => {
                self.append_log(service, host, login, "OPEN", "access granted");
                info!("access granted");
                AccessResult::Granted
            }
            Verdict::Close => {
                self.append_log(service, host, login, "CLOSE", "access denied");
                info!("access denied");
                if DISPLAY_MANAGER_SERVICES.contains(&service) {
                    if let Err(err) =
                        self.dialog.show(debug, host, login, DialogKind::Xorg, service)
                    {
                        warn!(%err, "cannot raise the denied-login notice");
                    }
                }
                AccessResult::Denied
            }
            Verdict::Ask => self.confirm_session(service, host, login, debug),
        }
    }

    /// Session-close flow: when the most recent record for this
    /// `login@host` describes a still-open session, record its closing and
    /// notify the session owner of ASK-admitted logins.
    pub fn close_session(&self, service: &str, host: &str, login: &str) {
        let span = info_span!("session", service, login);
        let _guard = span.enter();

        let Some(notice) = close_notice(self.log.dir(), login, host) else {
            debug!("no close notification needed");
            return;
        };

        info!(mode = %notice.recorded_mode, "closing session");
        self.append_log(service, host, login, &notice.recorded_mode, "closing session");

        if notice.needs_ask_cleanup() {
            let lines = loader::load_config_dir(&self.config_dir);
            let debug = loader::global_policy(&lines).debug;
            if let Err(err) = self.dialog.show(debug, host, login, DialogKind::Info, service) {
                warn!(%err, "cannot raise the session-closed notice");
            }
        }
    }

    /// ASK path: block on the confirmation window, then re-check before
    /// admitting.
    fn confirm_session(&self, service: &str, host: &str, login: &str, debug: bool) -> AccessResult {
        match self.dialog.confirm(debug, host, login, service) {
            Ok(true) => {
                // Re-decide against fresh config and census: capacity may
                // have been consumed while the window was open.
                let (second, _) = self.decide(service, login);
                if second.verdict == Verdict::Ask {
                    self.append_log(service, host, login, "ASK", "creating new session");
                    info!("access granted");
                    AccessResult::Granted
                } else {
                    info!(verdict = %second.verdict, "capacity consumed while waiting; denying");
                    AccessResult::Denied
                }
            }
            Ok(false) => {
                info!("session owner declined the connection");
                AccessResult::Denied
            }
            Err(err) => {
                warn!(%err, "no usable reply from the confirmation window; failing closed");
                AccessResult::Denied
            }
        }
    }

    /// Load the configuration and run the engine once.
    fn decide(&self, service: &str, login: &str) -> (Decision, bool) {
        let lines = loader::load_config_dir(&self.config_dir);
        let policy = loader::global_policy(&lines);
        let rules = loader::parse_rules(&lines, service);

        let engine = DecisionEngine::new(self.resolver.as_ref(), self.census.as_ref());
        let decision = engine.decide(service, login, &policy, &rules);
        (decision, policy.debug)
    }

    /// Best-effort log append; a broken log never alters the decision.
    fn append_log(&self, service: &str, host: &str, login: &str, mode: &str, message: &str) {
        if let Err(err) = self.log.append(service, host, login, mode, message) {
            warn!(%err, "cannot write session log entry");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
