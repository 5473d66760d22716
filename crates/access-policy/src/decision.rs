use std::fmt;

/// Final verdict for a session request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Admit the session.
    Open,
    /// Deny the session.
    Close,
    /// Ask the interactive confirmation collaborator before admitting.
    Ask,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
            Self::Ask => "ASK",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of reducing the loaded rules for one request.
#[derive(Debug, Clone)]
pub struct Decision {
    pub verdict: Verdict,
    /// Human-readable reason explaining the decision.
    pub reason: String,
}

impl Decision {
    pub fn open(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Open,
            reason: reason.into(),
        }
    }

    pub fn close(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Close,
            reason: reason.into(),
        }
    }

    pub fn ask(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Ask,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_carry_verdict_and_reason() {
        let d = Decision::open("explicitly open");
        assert_eq!(d.verdict, Verdict::Open);
        assert_eq!(d.reason, "explicitly open");

        assert_eq!(Decision::close("x").verdict, Verdict::Close);
        assert_eq!(Decision::ask("x").verdict, Verdict::Ask);
    }

    #[test]
    fn verdict_display_matches_rule_tokens() {
        assert_eq!(Verdict::Open.to_string(), "OPEN");
        assert_eq!(Verdict::Close.to_string(), "CLOSE");
        assert_eq!(Verdict::Ask.to_string(), "ASK");
    }
}
