//! Ignore rules for the working-directory walker
//!
//! Rules are read from the `.gitignore` file at the workspace root. A
//! pattern containing a slash is anchored to the repository root; a bare
//! pattern matches the basename at any depth. A trailing slash restricts
//! the pattern to directories.

use crate::areas::workspace::Workspace;
use glob::Pattern;
use std::path::Path;

const IGNORE_FILE: &str = ".gitignore";

#[derive(Debug)]
struct IgnorePattern {
    pattern: Pattern,
    anchored: bool,
    dir_only: bool,
}

/// Compiled ignore rules for one workspace
#[derive(Debug, Default)]
pub struct IgnoreRules {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreRules {
    /// Load the rules from the workspace root
    ///
    /// A missing ignore file yields the empty rule set.
    pub fn load(workspace: &Workspace) -> anyhow::Result<Self> {
        let ignore_path = Path::new(IGNORE_FILE);

        if !workspace.exists(ignore_path) {
            return Ok(Self::default());
        }

        let content = workspace.read_file(ignore_path)?;
        Ok(Self::parse(&content))
    }

    fn parse(content: &str) -> Self {
        let patterns = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let dir_only = line.ends_with('/');
                let raw = line.trim_end_matches('/');
                let anchored = raw.contains('/');

                Pattern::new(raw).ok().map(|pattern| IgnorePattern {
                    pattern,
                    anchored,
                    dir_only,
                })
            })
            .collect();

        IgnoreRules { patterns }
    }

    /// Whether a workspace-relative path matches an ignore pattern
    ///
    /// Directory paths may carry their trailing slash; it is stripped
    /// before matching.
    pub fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        let path = path.trim_end_matches('/');
        let basename = path.rsplit('/').next().unwrap_or(path);

        self.patterns.iter().any(|rule| {
            if rule.dir_only && !is_dir {
                return false;
            }

            if rule.anchored {
                rule.pattern.matches(path)
            } else {
                rule.pattern.matches(basename)
            }
        })
    }
}
