//! # access-policy
//!
//! Core decision logic for session-warden.  This crate loads ordered rule
//! text from a configuration directory, extracts the global `DEFAULT:` and
//! `DEBUG:` directives, parses the per-service rules, and reduces them to a
//! single verdict through the [`DecisionEngine`].
//!
//! Group membership and active-session counts are supplied by the caller
//! through the [`GroupResolver`] and [`SessionCensus`] contracts, so the
//! engine itself never touches the operating system.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use access_policy::{loader, DecisionEngine};
//! # fn demo(resolver: &dyn access_policy::GroupResolver,
//! #         census: &dyn access_policy::SessionCensus) {
//! let lines = loader::load_config_dir("/etc/session-warden.d".as_ref());
//! let policy = loader::global_policy(&lines);
//! let rules = loader::parse_rules(&lines, "sshd");
//!
//! let engine = DecisionEngine::new(resolver, census);
//! let decision = engine.decide("sshd", "alice", &policy, &rules);
//! println!("{:?}", decision.verdict);
//! # }
//! ```

mod decision;
mod evaluator;
pub mod loader;
mod resolver;
mod schema;

// Re-export primary public API at crate root.
pub use decision::{Decision, Verdict};
pub use evaluator::DecisionEngine;
pub use resolver::{GroupResolver, SessionCensus};
pub use schema::{DefaultPolicy, GlobalPolicy, Rule, RuleAction, SubjectKind};
