//! Pathspec filtering
//!
//! A pathspec is a set of glob patterns plus the literal prefix they share.
//! The prefix narrows the entry sources before the merge-join runs; the
//! patterns gate every delta the join wants to emit. With
//! `DISABLE_PATHSPEC_MATCH` the patterns degrade to literal prefixes.

use glob::{MatchOptions, Pattern};

/// Compiled pathspec
#[derive(Debug, Clone, Default)]
pub struct Pathspec {
    raw: Vec<String>,
    patterns: Vec<Pattern>,
    prefix: String,
}

impl Pathspec {
    /// Compile a set of glob patterns
    ///
    /// A pattern that fails to compile is kept as a literal by escaping its
    /// metacharacters. An empty set matches everything.
    pub fn new(specs: &[String]) -> Self {
        let patterns = specs
            .iter()
            .map(|spec| {
                Pattern::new(spec)
                    .unwrap_or_else(|_| Pattern::new(&Pattern::escape(spec)).expect("escaped"))
            })
            .collect();

        Pathspec {
            raw: specs.to_vec(),
            patterns,
            prefix: Self::common_prefix(specs),
        }
    }

    /// The literal prefix shared by every pattern
    ///
    /// Used to restrict the entry sources to the relevant path range.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Whether a path passes the pathspec
    ///
    /// `disable_glob` reduces every pattern to a literal prefix; `icase`
    /// folds ASCII case on both the literal and glob routes.
    pub fn matches(&self, path: &str, disable_glob: bool, icase: bool) -> bool {
        if self.raw.is_empty() {
            return true;
        }

        let path = path.trim_end_matches('/');

        if disable_glob {
            return self.raw.iter().any(|spec| starts_with(path, spec, icase));
        }

        let options = MatchOptions {
            case_sensitive: !icase,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };

        self.patterns.iter().zip(&self.raw).any(|(pattern, spec)| {
            pattern.matches_with(path, options)
                || starts_with(path, &format!("{}/", spec.trim_end_matches('/')), icase)
        })
    }

    fn common_prefix(specs: &[String]) -> String {
        let literals = specs
            .iter()
            .map(|spec| {
                let end = spec
                    .find(|c| matches!(c, '*' | '?' | '['))
                    .unwrap_or(spec.len());
                &spec[..end]
            })
            .collect::<Vec<_>>();

        let Some(mut prefix) = literals.first().map(|l| l.to_string()) else {
            return String::new();
        };

        for literal in &literals[1..] {
            let shared = prefix
                .bytes()
                .zip(literal.bytes())
                .take_while(|(a, b)| a == b)
                .count();
            prefix.truncate(shared);
        }

        prefix
    }
}

fn starts_with(path: &str, prefix: &str, icase: bool) -> bool {
    if icase {
        path.len() >= prefix.len() && path[..prefix.len()].eq_ignore_ascii_case(prefix)
    } else {
        path.starts_with(prefix)
    }
}
