//! CODEOWNERS rules
//!
//! Each non-blank, non-comment line is `pattern owner... [# comment]`.
//! Patterns follow gitignore rules: a leading `/` anchors to the root, a
//! trailing `/` matches directories only, and a pattern without an inner `/`
//! matches at any depth. When several rules match, the last one wins.

use glob::{MatchOptions, Pattern};

use crate::error::CodeownerError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One CODEOWNERS line
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: String,
    owners: Vec<String>,
    comment: String,
    line: usize,
    globs: Vec<Pattern>,
}

impl Rule {
    /// Pattern as written in the file
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Owners in file order
    pub fn owners(&self) -> &[String] {
        &self.owners
    }

    /// Inline comment without the leading `#`, trimmed
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// 1-based line number
    pub fn line(&self) -> usize {
        self.line
    }

    /// Check if `path` (relative, `/`-separated) is covered by this rule
    pub fn matches(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        self.globs
            .iter()
            .any(|g| g.matches_with(path, MATCH_OPTIONS))
    }
}

/// Parsed CODEOWNERS file
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    rules: Vec<Rule>,
}

impl Ruleset {
    /// Parse the contents of a CODEOWNERS file
    ///
    /// # Errors
    ///
    /// `CodeownerError::Parse` naming the first offending line.
    pub fn parse(input: &str) -> Result<Self, CodeownerError> {
        let mut rules = Vec::new();

        for (index, raw) in input.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (body, comment) = split_comment(trimmed);
            let mut fields = body.split_whitespace();
            let Some(pattern) = fields.next() else {
                continue;
            };

            let owners: Vec<String> = fields.map(str::to_string).collect();
            if let Some(owner) = owners.iter().find(|o| !is_valid_owner(o)) {
                return Err(CodeownerError::Parse {
                    line,
                    message: format!("invalid owner '{}'", owner),
                });
            }

            let globs = compile(pattern).map_err(|e| CodeownerError::Parse {
                line,
                message: format!("invalid pattern '{}': {}", pattern, e.msg),
            })?;

            rules.push(Rule {
                pattern: pattern.to_string(),
                owners,
                comment: comment.to_string(),
                line,
                globs,
            });
        }

        Ok(Self { rules })
    }

    /// Rules in file order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Last rule matching `path`
    pub fn matching(&self, path: &str) -> Option<&Rule> {
        self.rules.iter().rev().find(|rule| rule.matches(path))
    }
}

/// Split `pattern owners # comment` at the first `#` that starts a word
fn split_comment(line: &str) -> (&str, &str) {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return (&line[..i], line[i + 1..].trim());
        }
    }
    (line, "")
}

/// `@user`, `@org/team` or an email address
fn is_valid_owner(owner: &str) -> bool {
    if let Some(handle) = owner.strip_prefix('@') {
        return !handle.is_empty() && !handle.starts_with('/') && !handle.ends_with('/');
    }

    match owner.split_once('@') {
        Some((user, domain)) => !user.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn compile(pattern: &str) -> Result<Vec<Pattern>, glob::PatternError> {
    let trimmed = pattern.trim_start_matches('/');
    let dir_only = trimmed.ends_with('/');
    let base = trimmed.trim_end_matches('/');
    let anchored = pattern.starts_with('/') || base.contains('/');

    let prefixes: &[&str] = if anchored { &[""] } else { &["", "**/"] };
    let mut globs = Vec::new();
    for prefix in prefixes {
        if !dir_only {
            globs.push(Pattern::new(&format!("{}{}", prefix, base))?);
        }
        globs.push(Pattern::new(&format!("{}{}/**", prefix, base))?);
    }
    Ok(globs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Default owners
*                @sysdiglabs/terraform   # report to: <@platform>

/sysdig/         @sysdiglabs/monitor
*_team.go        dev@example.com @alice # report to: <@alice> bob
docs/*.md        @docs
";

    #[test]
    fn test_parse_rules() {
        let ruleset = Ruleset::parse(SAMPLE).unwrap();
        let rules = ruleset.rules();

        assert_eq!(rules.len(), 4);
        assert_eq!(rules[0].pattern(), "*");
        assert_eq!(rules[0].comment(), "report to: <@platform>");
        assert_eq!(rules[1].comment(), "");
        assert_eq!(rules[2].owners(), ["dev@example.com", "@alice"]);
        assert_eq!(rules[2].line(), 5);
    }

    #[test]
    fn test_last_match_wins() {
        let ruleset = Ruleset::parse(SAMPLE).unwrap();

        let rule = ruleset.matching("resource_sysdig_monitor_team.go").unwrap();
        assert_eq!(rule.pattern(), "*_team.go");

        let rule = ruleset.matching("provider.go").unwrap();
        assert_eq!(rule.pattern(), "*");
    }

    #[test]
    fn test_pattern_semantics() {
        let ruleset = Ruleset::parse(SAMPLE).unwrap();
        let monitor = &ruleset.rules()[1];
        let docs = &ruleset.rules()[3];

        assert!(monitor.matches("sysdig/provider.go"));
        assert!(monitor.matches("sysdig/nested/file.go"));
        assert!(!monitor.matches("other/sysdig/file.go"));

        assert!(docs.matches("docs/index.md"));
        assert!(!docs.matches("docs/nested/index.md"));
        assert!(!docs.matches("website/docs/index.md"));
    }

    #[test]
    fn test_unanchored_pattern_matches_at_any_depth() {
        let ruleset = Ruleset::parse("*.tf @infra\n").unwrap();
        assert!(ruleset.matching("main.tf").is_some());
        assert!(ruleset.matching("modules/team/main.tf").is_some());
        assert!(ruleset.matching("main.go").is_none());
    }

    #[test]
    fn test_invalid_owner_is_rejected() {
        let err = Ruleset::parse("*.go @ok\n*.md not-an-owner\n").unwrap_err();
        assert!(matches!(err, CodeownerError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = Ruleset::parse("[*.go @ok\n").unwrap_err();
        assert!(matches!(err, CodeownerError::Parse { line: 1, .. }));
    }
}
