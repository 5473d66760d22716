use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::debug;

use access_policy::{GroupResolver, SessionCensus};

use crate::command::CommandRunner;

/// Active-session census backed by `loginctl list-users`.
///
/// The count is best-effort by design: it is read without any cross-process
/// lock, so two near-simultaneous logins can both observe a stale count for
/// a near-full group and both be admitted.
pub struct LoginctlCensus {
    runner: Arc<dyn CommandRunner>,
    resolver: Arc<dyn GroupResolver>,
}

impl LoginctlCensus {
    pub fn new(runner: Arc<dyn CommandRunner>, resolver: Arc<dyn GroupResolver>) -> Self {
        Self { runner, resolver }
    }
}

impl SessionCensus for LoginctlCensus {
    /// Count the distinct login names in `group` with active sessions, as
    /// if `candidate` were already among them.  Repeated sessions of one
    /// login count once.
    fn census(&self, group: &str, candidate: &str) -> Result<usize> {
        let out = self.runner.run("loginctl", &["list-users"])?;
        if !out.success() {
            bail!("loginctl list-users exited with status {}", out.status);
        }

        let mut names = parse_list_users(&out.stdout);
        names.push(candidate.to_string());
        names.sort();
        names.dedup();
        debug!(?names, "active users after adding the candidate");

        let count = names
            .iter()
            .filter(|name| self.resolver.is_member(group, name))
            .count();
        debug!(group, candidate, count, "session census");
        Ok(count)
    }
}

/// Extract the USER column from `loginctl list-users` output.
///
/// The rows sit between the header line and the blank line that precedes
/// the `N users listed.` summary.
fn parse_list_users(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let uid = fields.next()?;
            let name = fields.next()?;
            uid.parse::<u32>().ok()?;
            Some(name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::command::CommandOutput;

    use super::*;

    const LISTING: &str = "\
 UID USER
1000 alice
1001 bob
1000 alice

3 users listed.
";

    struct CannedRunner {
        status: i32,
        stdout: &'static str,
    }

    impl CommandRunner for CannedRunner {
        fn run(&self, _program: &str, _args: &[&str]) -> std::io::Result<CommandOutput> {
            Ok(CommandOutput {
                status: self.status,
                stdout: self.stdout.to_string(),
                stderr: String::new(),
            })
        }
    }

    struct MapResolver {
        groups: HashMap<String, Vec<String>>,
    }

    impl MapResolver {
        fn with(group: &str, members: &[&str]) -> Self {
            let mut groups = HashMap::new();
            groups.insert(
                group.to_string(),
                members.iter().map(|m| m.to_string()).collect(),
            );
            Self { groups }
        }
    }

    impl GroupResolver for MapResolver {
        fn resolve(&self, group: &str, login: &str) -> Result<Vec<String>> {
            let member = self
                .groups
                .get(group)
                .is_some_and(|members| members.iter().any(|m| m == login));
            Ok(if member {
                vec![login.to_string()]
            } else {
                Vec::new()
            })
        }
    }

    fn census_with(members: &[&str]) -> LoginctlCensus {
        LoginctlCensus::new(
            Arc::new(CannedRunner {
                status: 0,
                stdout: LISTING,
            }),
            Arc::new(MapResolver::with("staff", members)),
        )
    }

    #[test]
    fn table_parsing_skips_header_and_summary() {
        assert_eq!(parse_list_users(LISTING), vec!["alice", "bob", "alice"]);
    }

    #[test]
    fn repeated_sessions_of_one_login_count_once() {
        let census = census_with(&["alice", "bob"]);
        // alice appears twice in the listing; bob is the candidate and is
        // already listed.
        assert_eq!(census.census("staff", "bob").unwrap(), 2);
    }

    #[test]
    fn candidate_is_counted_as_if_already_logged_in() {
        let census = census_with(&["alice", "bob", "carol"]);
        assert_eq!(census.census("staff", "carol").unwrap(), 3);
    }

    #[test]
    fn non_members_do_not_count() {
        let census = census_with(&["carol"]);
        assert_eq!(census.census("staff", "carol").unwrap(), 1);
    }

    #[test]
    fn loginctl_failure_propagates() {
        let census = LoginctlCensus::new(
            Arc::new(CannedRunner {
                status: 1,
                stdout: "",
            }),
            Arc::new(MapResolver::with("staff", &[])),
        );
        assert!(census.census("staff", "alice").is_err());
    }
}
