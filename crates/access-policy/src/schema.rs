/// A single well-formed access rule, already filtered to the requesting
/// service.
///
/// Produced by [`crate::loader::parse_rules`].  A configuration line that
/// fails validation produces no `Rule` at all; rules are never partially
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// What the rule grants or demands when a subject matches.
    pub action: RuleAction,
    /// Whether the subject list names logins or groups.
    pub subject_kind: SubjectKind,
    /// Ordered subject tokens.  For [`RuleAction::Number`] each token has
    /// the form `GROUP:CAPACITY` and stays unresolved until the capacity
    /// check.
    pub subjects: Vec<String>,
}

/// The action field of a rule line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Admit matching logins.
    Open,
    /// Deny matching logins.
    Close,
    /// Require interactive confirmation for matching logins.
    Ask,
    /// Constrain the number of distinct session owners per group.
    Number,
}

impl RuleAction {
    /// Parse an (already uppercased) action token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "OPEN" => Some(Self::Open),
            "CLOSE" => Some(Self::Close),
            "ASK" => Some(Self::Ask),
            "NUMBER" => Some(Self::Number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
            Self::Ask => "ASK",
            Self::Number => "NUMBER",
        }
    }
}

/// The subject-kind field of a rule line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    User,
    Group,
}

impl SubjectKind {
    /// Parse an (already uppercased) subject-kind token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "USER" => Some(Self::User),
            "GROUP" => Some(Self::Group),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Group => "GROUP",
        }
    }
}

/// Fallback behavior for logins no rule speaks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultPolicy {
    Open,
    Close,
}

/// Global directives extracted from the configuration.
///
/// `default` resolves to [`DefaultPolicy::Close`] and `debug` to `false`
/// unless overridden by a later, validly formed directive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalPolicy {
    pub default: DefaultPolicy,
    pub debug: bool,
}

impl Default for GlobalPolicy {
    fn default() -> Self {
        Self {
            default: DefaultPolicy::Close,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_tokens_round_trip() {
        for token in ["OPEN", "CLOSE", "ASK", "NUMBER"] {
            let action = RuleAction::parse(token).unwrap();
            assert_eq!(action.as_str(), token);
        }
    }

    #[test]
    fn unknown_action_rejected() {
        assert_eq!(RuleAction::parse("open"), None);
        assert_eq!(RuleAction::parse("DENY"), None);
        assert_eq!(RuleAction::parse(""), None);
    }

    #[test]
    fn subject_kind_tokens() {
        assert_eq!(SubjectKind::parse("USER"), Some(SubjectKind::User));
        assert_eq!(SubjectKind::parse("GROUP"), Some(SubjectKind::Group));
        assert_eq!(SubjectKind::parse("Group"), None);
    }

    #[test]
    fn policy_defaults_fail_closed() {
        let policy = GlobalPolicy::default();
        assert_eq!(policy.default, DefaultPolicy::Close);
        assert!(!policy.debug);
    }
}
