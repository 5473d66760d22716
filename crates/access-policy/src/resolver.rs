//! Contracts for the two external oracles consumed by the decision engine.
//!
//! The engine never enumerates OS sessions or group databases itself; the
//! host adapters (or test fakes) implement these traits.

use anyhow::Result;
use tracing::warn;

/// Group-membership oracle.
pub trait GroupResolver {
    /// Return a list containing `login` when the login belongs to `group`
    /// (primary or supplementary membership), otherwise an empty list.
    ///
    /// The pseudo-group `ALL` matches unconditionally.  Returning the login
    /// itself lets the engine union resolver results straight into its
    /// buckets without special-casing "everyone" rules.
    fn resolve(&self, group: &str, login: &str) -> Result<Vec<String>>;

    /// Membership test on top of [`resolve`](Self::resolve).  A resolver
    /// failure counts as non-membership.
    fn is_member(&self, group: &str, login: &str) -> bool {
        match self.resolve(group, login) {
            Ok(members) => !members.is_empty(),
            Err(err) => {
                warn!(group, login, %err, "group resolver failed; treating as non-member");
                false
            }
        }
    }
}

/// Active-session-count oracle.
pub trait SessionCensus {
    /// Return the number of distinct login names currently holding active
    /// sessions that belong to `group`, computed as if `candidate` were
    /// already part of that population.  One principal with several
    /// simultaneous sessions counts once.
    fn census(&self, group: &str, candidate: &str) -> Result<usize>;
}
