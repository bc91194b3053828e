// src/watch/patterns.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use glob::Pattern;
use globset::{GlobBuilder, GlobMatcher};
use tracing::warn;

use crate::config::model::WatchTarget;
use crate::errors::{BuildwatchError, Result};
use crate::resolve::VariableResolver;

/// A compiled watch rule: a glob pattern bound to a target.
///
/// Relative patterns are anchored at the project root, so both the
/// directory expansion and the event matching work on absolute paths.
#[derive(Clone)]
pub struct WatchRule {
    /// Pattern after variable resolution, as written.
    pattern: String,
    /// `pattern` anchored at the root, in `glob` syntax for expansion.
    absolute: String,
    matcher: GlobMatcher,
    target: WatchTarget,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("pattern", &self.pattern)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    /// Resolve variables in `raw_pattern`, anchor it at `root` and compile it.
    ///
    /// `*` and `?` do not cross `/`, matching `filepath.Match`-style globbing.
    pub fn compile(
        raw_pattern: &str,
        target: WatchTarget,
        resolver: &VariableResolver,
        root: &Path,
    ) -> Result<Self> {
        let pattern = resolver.resolve(raw_pattern)?;
        let relative = pattern.trim_start_matches("./");

        // The root is a literal path: `[` or `*` in a directory name must not
        // be read as glob syntax. The two crates escape differently.
        let (absolute, matched) = if Path::new(relative).is_absolute() {
            (relative.to_string(), relative.to_string())
        } else {
            let root = root.to_string_lossy();
            let root = root.trim_end_matches(MAIN_SEPARATOR);
            (
                format!("{}{MAIN_SEPARATOR}{relative}", Pattern::escape(root)),
                format!("{}{MAIN_SEPARATOR}{relative}", globset::escape(root)),
            )
        };

        let matcher = GlobBuilder::new(&matched)
            .literal_separator(true)
            .build()
            .map_err(|e| BuildwatchError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?
            .compile_matcher();

        Ok(Self {
            pattern,
            absolute,
            matcher,
            target,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Glob-match an absolute path against this rule.
    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }

    /// Expand the pattern to the paths that currently exist.
    ///
    /// A syntactically invalid pattern is an error; unreadable entries are
    /// skipped with a warning.
    pub fn expand(&self) -> Result<Vec<PathBuf>> {
        let entries = glob::glob(&self.absolute).map_err(|e| BuildwatchError::InvalidPattern {
            pattern: self.pattern.clone(),
            reason: e.to_string(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => paths.push(path),
                Err(err) => {
                    warn!(pattern = %self.pattern, error = %err, "skipping unreadable path");
                }
            }
        }
        Ok(paths)
    }
}

/// Compile every configured watch rule.
pub fn compile_rules(
    watch: &BTreeMap<String, WatchTarget>,
    resolver: &VariableResolver,
    root: &Path,
) -> Result<Vec<WatchRule>> {
    watch
        .iter()
        .map(|(pattern, target)| WatchRule::compile(pattern, target.clone(), resolver, root))
        .collect()
}
