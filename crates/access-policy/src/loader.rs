use std::path::{Path, PathBuf};

use globset::Glob;
use tracing::{debug, warn};

use crate::schema::{DefaultPolicy, GlobalPolicy, Rule, RuleAction, SubjectKind};

/// Filename pattern for configuration fragments.
const CONF_PATTERN: &str = "*.conf";

/// Read every `*.conf` file under `dir` and return the normalized rule
/// lines, concatenated in sorted-filename order with intra-file order
/// preserved.
///
/// A file that cannot be opened or read is skipped with a diagnostic;
/// loading is never fatal.  A missing or unreadable directory yields an
/// empty list.
pub fn load_config_dir(dir: &Path) -> Vec<String> {
    let Ok(glob) = Glob::new(CONF_PATTERN) else {
        return Vec::new();
    };
    let matcher = glob.compile_matcher();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), %err, "cannot read configuration directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| matcher.is_match(name))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    let mut lines = Vec::new();
    for file in files {
        match std::fs::read_to_string(&file) {
            Ok(contents) => lines.extend(contents.lines().map(normalize_line)),
            Err(err) => {
                warn!(file = %file.display(), %err, "cannot open configuration file; skipping");
            }
        }
    }
    lines
}

/// Uppercase every whitespace-separated token except the last, rejoining
/// with single spaces.
///
/// The last token is the subject list and may contain mixed-case login
/// names, so its case is preserved.  Lines with at most one token pass
/// through unchanged.
fn normalize_line(line: &str) -> String {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return line.to_string();
    }
    let (subjects, options) = tokens.split_last().unwrap_or((&"", &[]));
    let mut normalized: Vec<String> = options.iter().map(|t| t.to_uppercase()).collect();
    normalized.push((*subjects).to_string());
    normalized.join(" ")
}

/// Extract the `DEFAULT:` and `DEBUG:` directives from the normalized
/// lines.  The last valid directive wins; absent directives fall back to
/// `CLOSE` and `false`.
pub fn global_policy(lines: &[String]) -> GlobalPolicy {
    let mut policy = GlobalPolicy::default();

    for line in lines {
        let line = line.to_uppercase();

        if let Some(value) = line.strip_prefix("DEFAULT:") {
            match value.split(':').next().unwrap_or("") {
                "OPEN" => policy.default = DefaultPolicy::Open,
                "CLOSE" => policy.default = DefaultPolicy::Close,
                other => {
                    warn!(value = other, "unknown DEFAULT directive value; keeping previous")
                }
            }
        }

        if let Some(value) = line.strip_prefix("DEBUG:") {
            policy.debug = value.split(':').next().unwrap_or("") == "TRUE";
        }
    }

    debug!(?policy, "global policy resolved");
    policy
}

/// Parse the normalized lines into the rules that apply to `service`.
///
/// A line survives only if it has exactly 4 fields, its service field
/// equals the requesting service (case-insensitively), its action is one of
/// `OPEN`/`CLOSE`/`ASK`/`NUMBER` and its subject kind is `USER` or `GROUP`.
/// Anything else is skipped whole; broken rules never apply partially.
pub fn parse_rules(lines: &[String], service: &str) -> Vec<Rule> {
    let service = service.to_uppercase();
    let mut rules = Vec::new();

    for line in lines.iter().filter(|line| line.len() > 5) {
        let fields: Vec<&str> = line.split(' ').collect();

        if fields.len() != 4 {
            debug!(rule = %line, "broken rule, wrong number of fields; skipping");
            continue;
        }
        if fields[0] != service {
            debug!(rule = %line, "other service; skipping");
            continue;
        }
        let Some(action) = RuleAction::parse(fields[1]) else {
            debug!(rule = %line, "second field is broken; skipping");
            continue;
        };
        let Some(subject_kind) = SubjectKind::parse(fields[2]) else {
            debug!(rule = %line, "third field is broken; skipping");
            continue;
        };

        rules.push(Rule {
            action,
            subject_kind,
            subjects: split_subjects(fields[3]),
        });
    }
    rules
}

/// Split a comma-separated subject list, dropping empty tokens.
fn split_subjects(list: &str) -> Vec<String> {
    list.split(',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| normalize_line(l)).collect()
    }

    // -- Normalization --

    #[test]
    fn normalize_uppercases_all_but_last_token() {
        assert_eq!(normalize_line("sshd open user Alice"), "SSHD OPEN USER Alice");
    }

    #[test]
    fn normalize_collapses_redundant_whitespace() {
        assert_eq!(
            normalize_line("sshd   open\tuser   bob,Tom"),
            "SSHD OPEN USER bob,Tom"
        );
    }

    #[test]
    fn normalize_leaves_single_token_lines_alone() {
        assert_eq!(normalize_line("default:open"), "default:open");
        assert_eq!(normalize_line(""), "");
    }

    // -- Directive extraction --

    #[test]
    fn default_falls_back_to_close() {
        let policy = global_policy(&lines(&["SSHD OPEN USER alice"]));
        assert_eq!(policy.default, DefaultPolicy::Close);
        assert!(!policy.debug);
    }

    #[test]
    fn default_directive_is_case_insensitive() {
        let policy = global_policy(&lines(&["default:open"]));
        assert_eq!(policy.default, DefaultPolicy::Open);
    }

    #[test]
    fn last_valid_default_wins() {
        let policy = global_policy(&lines(&["DEFAULT:OPEN", "DEFAULT:CLOSE"]));
        assert_eq!(policy.default, DefaultPolicy::Close);
    }

    #[test]
    fn invalid_default_value_leaves_previous() {
        let policy = global_policy(&lines(&["DEFAULT:OPEN", "DEFAULT:MAYBE"]));
        assert_eq!(policy.default, DefaultPolicy::Open);
    }

    #[test]
    fn debug_requires_exactly_true() {
        assert!(global_policy(&lines(&["DEBUG:TRUE"])).debug);
        assert!(global_policy(&lines(&["debug:true"])).debug);
        assert!(!global_policy(&lines(&["DEBUG:YES"])).debug);
        assert!(!global_policy(&lines(&["DEBUG:TRUE", "DEBUG:FALSE"])).debug);
    }

    // -- Rule parsing --

    #[test]
    fn parses_well_formed_rule() {
        let rules = parse_rules(&lines(&["sshd open user alice,bob"]), "sshd");
        assert_eq!(
            rules,
            vec![Rule {
                action: RuleAction::Open,
                subject_kind: SubjectKind::User,
                subjects: vec!["alice".to_string(), "bob".to_string()],
            }]
        );
    }

    #[test]
    fn service_match_is_case_insensitive() {
        let rules = parse_rules(&lines(&["SSHD CLOSE GROUP wheel"]), "SshD");
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn wrong_field_count_is_skipped_without_breaking_later_lines() {
        let config = lines(&[
            "sshd open user",
            "sshd open user alice extra",
            "sshd close user mallory",
        ]);
        let rules = parse_rules(&config, "sshd");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].action, RuleAction::Close);
    }

    #[test]
    fn other_service_and_broken_fields_are_skipped() {
        let config = lines(&[
            "gdm open user alice",
            "sshd grant user alice",
            "sshd open member alice",
        ]);
        assert!(parse_rules(&config, "sshd").is_empty());
    }

    #[test]
    fn short_and_directive_lines_yield_no_rules() {
        let config = lines(&["", "x y", "DEFAULT:OPEN", "DEBUG:TRUE"]);
        assert!(parse_rules(&config, "sshd").is_empty());
    }

    #[test]
    fn empty_subject_tokens_are_dropped() {
        let rules = parse_rules(&lines(&["sshd open user ,alice,,bob,"]), "sshd");
        assert_eq!(rules[0].subjects, vec!["alice", "bob"]);
    }

    // -- Directory loading --

    #[test]
    fn loads_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20-extra.conf"), "sshd close user mallory\n").unwrap();
        std::fs::write(
            dir.path().join("10-base.conf"),
            "DEFAULT:OPEN\nsshd open group staff\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a config\n").unwrap();

        let loaded = load_config_dir(dir.path());
        assert_eq!(
            loaded,
            vec![
                "DEFAULT:OPEN".to_string(),
                "SSHD OPEN GROUP staff".to_string(),
                "SSHD CLOSE USER mallory".to_string(),
            ]
        );
    }

    #[test]
    fn missing_directory_yields_no_lines() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("does-not-exist");
        assert!(load_config_dir(&gone).is_empty());
    }
}
