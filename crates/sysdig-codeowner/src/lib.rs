// # sysdig-codeowner
//
// Finds who to notify about a resource file.
//
// The CODEOWNERS file carries a `report to:` comment on each rule:
//
// ```text
// *_team.go   @sysdiglabs/monitor   # report to: <@alice> bob
// ```
//
// [`OwnerLoader::load_owners`] matches a file's base name against the rules
// and returns the mentions from the winning rule's comment, normalized to
// `<@handle>` form. The file is parsed on first use and cached in the loader
// until [`OwnerLoader::reset`] is called.

pub mod error;
pub mod ruleset;

pub use error::CodeownerError;
pub use ruleset::{Rule, Ruleset};

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

/// Name of the file looked up in the working directory
pub const CODEOWNERS_FILE: &str = "CODEOWNERS";

const REPORT_PREFIX: &str = "report to:";

static REPORT_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^report to:\s+.*").expect("static regex should not panic"));

/// Loads and caches one CODEOWNERS file
///
/// Create one per process (or per test) and share it; the ruleset is read
/// on the first lookup and reused afterwards, even if the file changes or
/// disappears.
#[derive(Debug)]
pub struct OwnerLoader {
    path: PathBuf,
    cache: Mutex<Option<Arc<Ruleset>>>,
}

impl OwnerLoader {
    /// Loader for the CODEOWNERS file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Loader for `CODEOWNERS` in the current working directory
    pub fn from_current_dir() -> Result<Self, CodeownerError> {
        let dir = std::env::current_dir().map_err(CodeownerError::CurrentDir)?;
        Ok(Self::new(dir.join(CODEOWNERS_FILE)))
    }

    /// Path of the CODEOWNERS file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mentions to report to for `path`
    ///
    /// Only the base name of `path` is matched.
    ///
    /// # Errors
    ///
    /// - `Read`/`Parse` if the file cannot be loaded
    /// - `NoMatch` if no rule covers the file
    /// - `MissingReportComment` if the matching rule has no `report to:` comment
    pub fn load_owners(&self, path: impl AsRef<Path>) -> Result<Vec<String>, CodeownerError> {
        let ruleset = self.ruleset()?;

        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let rule = ruleset
            .matching(&name)
            .ok_or_else(|| CodeownerError::NoMatch(name.clone()))?;
        tracing::debug!(file = %name, line = rule.line(), pattern = rule.pattern(), "matched CODEOWNERS rule");

        report_mentions(rule.comment())
    }

    /// Drop the cached ruleset so the next lookup reads the file again
    pub fn reset(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn ruleset(&self) -> Result<Arc<Ruleset>, CodeownerError> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ruleset) = cache.as_ref() {
            return Ok(Arc::clone(ruleset));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| CodeownerError::Read {
            path: self.path.clone(),
            source,
        })?;
        let ruleset = Arc::new(Ruleset::parse(&content)?);
        tracing::debug!(path = %self.path.display(), rules = ruleset.rules().len(), "loaded CODEOWNERS");

        *cache = Some(Arc::clone(&ruleset));
        Ok(ruleset)
    }
}

/// Extract `<@handle>` mentions from a `report to:` comment
pub fn report_mentions(comment: &str) -> Result<Vec<String>, CodeownerError> {
    if !REPORT_TO.is_match(comment) {
        return Err(CodeownerError::MissingReportComment);
    }

    Ok(comment[REPORT_PREFIX.len()..]
        .split_whitespace()
        .map(mention)
        .collect())
}

fn mention(token: &str) -> String {
    let handle = token.strip_prefix("<@").unwrap_or(token);
    let handle = handle.strip_suffix('>').unwrap_or(handle);
    format!("<@{}>", handle)
}
