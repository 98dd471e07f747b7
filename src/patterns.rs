//! Gitignore-style ignore patterns.
//!
//! Patterns are evaluated in declaration order.  A pattern that matches sets
//! the "ignored" flag; a negated pattern (`!pattern`) that matches while the
//! flag is set clears it again.  Later patterns therefore override earlier
//! ones, so `["*.swp", "!keep.swp"]` keeps `keep.swp` while
//! `["!keep.swp", "*.swp"]` ignores it.
//!
//! # Examples
//!
//! ```
//! use dotlink::patterns::IgnoreMatcher;
//!
//! let matcher = IgnoreMatcher::new(&["*.swp", "node_modules", "!keep.swp"]).unwrap();
//! assert!(matcher.is_ignored(".foo.swp"));
//! assert!(matcher.is_ignored("config/app/node_modules/x.js"));
//! assert!(!matcher.is_ignored("keep.swp"));
//! assert!(!matcher.is_ignored(".bashrc"));
//! ```
use globset::{GlobBuilder, GlobMatcher};

use crate::error::ConfigError;

/// Characters that turn a pattern (or part of one) into a glob.
const GLOB_CHARS: &[char] = &['*', '?', '['];

/// One piece of a pattern: either a literal string or a compiled glob.
#[derive(Debug, Clone)]
struct Segment {
    text: String,
    glob: Option<GlobMatcher>,
}

impl Segment {
    fn new(text: &str) -> Result<Self, ConfigError> {
        let glob = if text.contains(GLOB_CHARS) {
            let compiled = GlobBuilder::new(text)
                .literal_separator(true)
                .build()
                .map_err(|e| ConfigError::InvalidPattern {
                    pattern: text.to_string(),
                    message: e.kind().to_string(),
                })?;
            Some(compiled.compile_matcher())
        } else {
            None
        };
        Ok(Self {
            text: text.to_string(),
            glob,
        })
    }

    fn literal(text: &str) -> Self {
        Self {
            text: text.to_string(),
            glob: None,
        }
    }

    fn is_match(&self, candidate: &str) -> bool {
        self.glob
            .as_ref()
            .map_or_else(|| candidate == self.text, |g| g.is_match(candidate))
    }

    /// Number of `/`-separated components in this segment.
    fn depth(&self) -> usize {
        self.text.split('/').filter(|c| !c.is_empty()).count()
    }

    /// Match the first `depth()` components of `components`.
    fn matches_leading(&self, components: &[&str]) -> bool {
        let depth = self.depth();
        components
            .get(..depth)
            .is_some_and(|head| depth > 0 && self.is_match(&head.join("/")))
    }

    /// Match any contiguous run of components (a single component, a tail,
    /// or the whole path).
    fn matches_any_window(&self, components: &[&str]) -> bool {
        (0..components.len()).any(|start| {
            (start + 1..=components.len()).any(|end| {
                components
                    .get(start..end)
                    .is_some_and(|window| self.is_match(&window.join("/")))
            })
        })
    }
}

/// Split form of a pattern containing `**`.
#[derive(Debug, Clone)]
struct DoubleStar {
    prefix: Option<Segment>,
    suffix: Option<Segment>,
}

impl DoubleStar {
    fn matches(&self, components: &[&str]) -> bool {
        match (&self.prefix, &self.suffix) {
            (None, None) => true,
            (None, Some(suffix)) => suffix.matches_any_window(components),
            (Some(prefix), None) => prefix.matches_leading(components),
            (Some(prefix), Some(suffix)) => {
                prefix.matches_leading(components)
                    && components
                        .get(prefix.depth()..)
                        .is_some_and(|rest| suffix.matches_any_window(rest))
            }
        }
    }
}

/// A single ignore pattern, classified once at compile time.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Pattern body with `!`, leading `/` and trailing `/` removed.
    pub pattern: String,
    /// The pattern was written as `!pattern`.
    pub is_negation: bool,
    /// The pattern ended in `/`.
    pub is_directory_only: bool,
    /// The body contains a `/` (or was anchored with a leading `/`).
    pub has_path_separator: bool,
    /// The body contains glob metacharacters.
    pub is_glob: bool,
    body: Segment,
    double_star: Option<DoubleStar>,
}

impl CompiledPattern {
    /// Compile a raw pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] if the pattern is empty or a
    /// glob part fails to compile.
    pub fn compile(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let (is_negation, rest) = trimmed
            .strip_prefix('!')
            .map_or((false, trimmed), |r| (true, r));
        let is_directory_only = rest.ends_with('/');
        let rest = rest.trim_end_matches('/');
        let has_path_separator = rest.contains('/');
        let body = rest.trim_start_matches('/');

        if body.is_empty() {
            return Err(ConfigError::InvalidPattern {
                pattern: raw.to_string(),
                message: "pattern is empty".to_string(),
            });
        }

        let double_star = if body.contains("**") {
            let (before, after) = body.split_once("**").unwrap_or((body, ""));
            let before = before.trim_end_matches('/');
            let after = after.trim_start_matches('/');
            Some(DoubleStar {
                prefix: (!before.is_empty()).then(|| Segment::new(before)).transpose()?,
                suffix: (!after.is_empty()).then(|| Segment::new(after)).transpose()?,
            })
        } else {
            None
        };

        Ok(Self {
            pattern: body.to_string(),
            is_negation,
            is_directory_only,
            has_path_separator,
            is_glob: body.contains(GLOB_CHARS),
            body: if double_star.is_some() {
                Segment::literal(body)
            } else {
                Segment::new(body)?
            },
            double_star,
        })
    }

    /// Test a normalized relative path against this pattern, ignoring
    /// negation.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        if components.is_empty() {
            return false;
        }

        if self.is_directory_only {
            return self.matches_directory(&components);
        }

        if let Some(double_star) = &self.double_star {
            return double_star.matches(&components);
        }

        if self.has_path_separator {
            return self.body.is_match(&components.join("/"));
        }

        // A bare name matches the final component or any parent directory.
        components.iter().any(|c| self.body.is_match(c))
    }

    fn matches_directory(&self, components: &[&str]) -> bool {
        if let Some(double_star) = &self.double_star {
            // The matched run must be a directory: the path itself or a parent.
            return (1..=components.len()).any(|end| {
                components
                    .get(..end)
                    .is_some_and(|head| double_star.matches(head))
            });
        }
        if self.body.matches_leading(components) {
            return true;
        }
        if self.has_path_separator {
            return false;
        }
        // Directory name at any depth: every component but the file name.
        components
            .split_last()
            .is_some_and(|(_, parents)| parents.iter().any(|c| self.body.is_match(c)))
    }
}

/// An ordered, compiled list of ignore patterns.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    patterns: Vec<CompiledPattern>,
}

impl IgnoreMatcher {
    /// Compile every pattern in declaration order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidPattern`] encountered.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| CompiledPattern::compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Return `true` if `path` should be ignored.
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        let path = normalize_path(path);
        let mut ignored = false;
        for pattern in &self.patterns {
            if pattern.is_negation {
                if ignored && pattern.matches(&path) {
                    ignored = false;
                }
            } else if !ignored && pattern.matches(&path) {
                ignored = true;
            }
        }
        ignored
    }

    /// Number of compiled patterns.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Return `true` if there are no patterns.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Convenience form of [`IgnoreMatcher::is_ignored`] over raw strings.
///
/// Patterns that fail to compile never match; configuration loading rejects
/// them before they reach this point.
#[must_use]
pub fn matches<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    let compiled: Vec<CompiledPattern> = patterns
        .iter()
        .filter_map(|p| CompiledPattern::compile(p.as_ref()).ok())
        .collect();
    IgnoreMatcher { patterns: compiled }.is_ignored(path)
}

/// Normalize a relative path for matching: backslashes become `/`, a
/// leading `./` and a trailing `/` are stripped.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut s = path.replace('\\', "/");
    while let Some(rest) = s.strip_prefix("./") {
        s = rest.to_string();
    }
    while s.ends_with('/') {
        s.pop();
    }
    s
}
