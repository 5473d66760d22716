use tracing::{debug, warn};

use crate::decision::Decision;
use crate::resolver::{GroupResolver, SessionCensus};
use crate::schema::{DefaultPolicy, GlobalPolicy, Rule, RuleAction, SubjectKind};

/// Services with an interactive confirmation channel.  ASK degrades to
/// CLOSE everywhere else.
const ASK_CAPABLE_SERVICES: [&str; 2] = ["sshd", "sshd-key"];

// ---------------------------------------------------------------------------
// Bucket aggregation
// ---------------------------------------------------------------------------

/// Per-request accumulation of resolved logins by action.  The `number`
/// bucket holds raw `GROUP:CAPACITY` tokens; everything else holds login
/// names.  Duplicates are harmless.
#[derive(Debug, Default)]
struct AccessBuckets {
    open: Vec<String>,
    close: Vec<String>,
    ask: Vec<String>,
    number: Vec<String>,
}

impl AccessBuckets {
    fn bucket_mut(&mut self, action: RuleAction) -> &mut Vec<String> {
        match action {
            RuleAction::Open => &mut self.open,
            RuleAction::Close => &mut self.close,
            RuleAction::Ask => &mut self.ask,
            RuleAction::Number => &mut self.number,
        }
    }
}

// ---------------------------------------------------------------------------
// DecisionEngine
// ---------------------------------------------------------------------------

/// Reduces parsed rules to a single verdict.
///
/// The engine is a pure function of its inputs and the oracle responses; it
/// performs no writes.  Oracle failures are absorbed as "no membership" /
/// "unknown count", both of which bias toward denial.
pub struct DecisionEngine<'a> {
    resolver: &'a dyn GroupResolver,
    census: &'a dyn SessionCensus,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(resolver: &'a dyn GroupResolver, census: &'a dyn SessionCensus) -> Self {
        Self { resolver, census }
    }

    /// Decide whether `login` may hold a session on `service`.
    pub fn decide(
        &self,
        service: &str,
        login: &str,
        policy: &GlobalPolicy,
        rules: &[Rule],
    ) -> Decision {
        let mut buckets = self.collect(rules, login);

        debug!(
            open = ?buckets.open,
            close = ?buckets.close,
            ask = ?buckets.ask,
            number = ?buckets.number,
            "buckets aggregated"
        );

        // A failed capacity check short-circuits everything below.
        if !buckets.number.is_empty() && !self.capacity_allows(login, &buckets.number) {
            return Decision::close("session capacity exhausted for every applicable group");
        }

        // An explicit CLOSE always overrides an explicit OPEN for the same
        // login; the CLOSE bucket is untouched.
        buckets.open.retain(|name| !buckets.close.contains(name));

        if buckets.close.iter().any(|name| name == login) {
            Decision::close(format!("login '{login}' is explicitly closed"))
        } else if buckets.ask.iter().any(|name| name == login) {
            if ASK_CAPABLE_SERVICES.contains(&service) {
                Decision::ask(format!("login '{login}' requires confirmation"))
            } else {
                // No confirmation channel for this service: fail closed.
                Decision::close(format!("service '{service}' cannot ask for confirmation"))
            }
        } else if buckets.open.iter().any(|name| name == login) {
            Decision::open(format!("login '{login}' is explicitly open"))
        } else {
            match policy.default {
                DefaultPolicy::Open => Decision::open("default policy"),
                DefaultPolicy::Close => Decision::close("default policy"),
            }
        }
    }

    /// Route every rule into its action bucket.
    ///
    /// USER subjects land verbatim; GROUP subjects go through the resolver
    /// so only `login` (if a member) lands in the bucket.  NUMBER keeps its
    /// `GROUP:CAPACITY` tokens unresolved, and is not defined for USER
    /// subjects.
    fn collect(&self, rules: &[Rule], login: &str) -> AccessBuckets {
        let mut buckets = AccessBuckets::default();

        for rule in rules {
            debug!(?rule, "routing rule");
            match (rule.action, rule.subject_kind) {
                (RuleAction::Number, SubjectKind::Group) => {
                    buckets.number.extend(rule.subjects.iter().cloned());
                }
                (RuleAction::Number, SubjectKind::User) => {
                    debug!(?rule, "NUMBER does not take USER subjects; ignoring");
                }
                (action, SubjectKind::User) => {
                    buckets.bucket_mut(action).extend(rule.subjects.iter().cloned());
                }
                (action, SubjectKind::Group) => {
                    for group in &rule.subjects {
                        match self.resolver.resolve(group, login) {
                            Ok(members) => buckets.bucket_mut(action).extend(members),
                            Err(err) => warn!(
                                group = %group,
                                login,
                                %err,
                                "group resolver failed; rule contributes nothing"
                            ),
                        }
                    }
                }
            }
        }
        buckets
    }

    /// Apply the NUMBER constraints for `login`.
    ///
    /// Returns `false` only when at least one entry applies to the login and
    /// every applicable entry denies.  Malformed entries are skipped; a
    /// census failure counts as a denial for that entry.
    fn capacity_allows(&self, login: &str, entries: &[String]) -> bool {
        let mut applicable: Vec<bool> = Vec::new();

        for entry in entries {
            let Some((group, capacity)) = split_capacity(entry) else {
                warn!(entry = %entry, "malformed NUMBER entry; skipping");
                continue;
            };
            if !self.resolver.is_member(group, login) {
                debug!(login, group, "login not in group; NUMBER entry does not apply");
                continue;
            }
            match self.census.census(group, login) {
                Ok(count) => {
                    let allowed = capacity >= count as i64;
                    debug!(group, capacity, count, allowed, "capacity check");
                    applicable.push(allowed);
                }
                Err(err) => {
                    warn!(group, %err, "session census failed; entry denies");
                    applicable.push(false);
                }
            }
        }

        if applicable.is_empty() {
            debug!(login, "no NUMBER entry applies");
            return true;
        }
        applicable.into_iter().any(|allowed| allowed)
    }
}

/// Split a `GROUP:CAPACITY` token.  `None` when the shape is wrong (not
/// exactly one colon) or the capacity is not an integer.
fn split_capacity(entry: &str) -> Option<(&str, i64)> {
    let mut parts = entry.split(':');
    let group = parts.next()?;
    let capacity = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((group, capacity.parse().ok()?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
