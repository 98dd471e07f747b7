//! Load-time validation (hard errors) and repository-aware checks (warnings).
use std::collections::HashSet;
use std::path::Path;

use super::{Config, Mapping};
use crate::error::ConfigError;
use crate::paths;
use crate::patterns::CompiledPattern;

/// Reject the first field that breaks a load-time rule.
///
/// - at least one mapping is declared
/// - `source` is non-empty, relative and free of `..`
/// - `target` is non-empty and absolute or `~/`-prefixed
/// - `link_as_unit` entries are safe relative paths
/// - every ignore pattern is non-empty and compiles
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] or [`ConfigError::InvalidPattern`].
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.link_mappings.is_empty() {
        return Err(invalid("link_mappings", "at least one mapping is required"));
    }

    for (i, mapping) in config.link_mappings.iter().enumerate() {
        validate_mapping(i, mapping)?;
    }

    for (i, pattern) in config.ignore_patterns.iter().enumerate() {
        if pattern.trim().is_empty() {
            return Err(invalid(
                &format!("ignore_patterns[{i}]"),
                "pattern must not be empty",
            ));
        }
        CompiledPattern::compile(pattern)?;
    }

    Ok(())
}

fn validate_mapping(index: usize, mapping: &Mapping) -> Result<(), ConfigError> {
    let field = |name: &str| format!("link_mappings[{index}].{name}");

    if mapping.source.trim().is_empty() {
        return Err(invalid(&field("source"), "must not be empty"));
    }
    if !paths::is_safe_relative(&mapping.source) {
        return Err(invalid(
            &field("source"),
            &format!(
                "'{}' must be a relative path without '..'",
                mapping.source
            ),
        ));
    }

    let target = mapping.target.trim();
    if target.is_empty() {
        return Err(invalid(&field("target"), "must not be empty"));
    }
    if !(target.starts_with("~/") || Path::new(target).is_absolute()) {
        return Err(invalid(
            &field("target"),
            &format!("'{target}' must be absolute or start with '~/'"),
        ));
    }

    for (j, unit) in mapping.link_as_unit.iter().enumerate() {
        if !paths::is_safe_relative(unit) {
            return Err(invalid(
                &field(&format!("link_as_unit[{j}]")),
                &format!("'{unit}' must be a relative path without '..'"),
            ));
        }
    }

    Ok(())
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// A non-fatal issue detected when checking configuration against the
/// repository on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The mapping or pattern that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    #[must_use]
    fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Trait for configuration checks that need the repository on disk.
pub trait ConfigValidator {
    /// Inspect the configuration against `repo_root` and return warnings.
    fn validate(&self, repo_root: &Path) -> Vec<ValidationWarning>;
}

/// Warns about mappings whose source directory is missing, and about
/// duplicate or nested mapping sources.
#[derive(Debug)]
pub struct MappingValidator<'a> {
    mappings: &'a [Mapping],
}

impl<'a> MappingValidator<'a> {
    /// Create a validator over `mappings`.
    #[must_use]
    pub const fn new(mappings: &'a [Mapping]) -> Self {
        Self { mappings }
    }
}

impl ConfigValidator for MappingValidator<'_> {
    fn validate(&self, repo_root: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for mapping in self.mappings {
            let source = mapping.source_path(repo_root);
            if !source.is_dir() {
                warnings.push(ValidationWarning::new(
                    mapping.name(),
                    format!("source directory does not exist: {}", source.display()),
                ));
            }

            if !seen.insert(mapping.name()) {
                warnings.push(ValidationWarning::new(
                    mapping.name(),
                    "mapping is declared more than once; the first declaration wins",
                ));
            }

            for other in self.mappings {
                if other.name() != mapping.name()
                    && paths::is_within(Path::new(mapping.name()), Path::new(other.name()))
                {
                    warnings.push(ValidationWarning::new(
                        mapping.name(),
                        format!("source is nested inside mapping '{}'", other.name()),
                    ));
                }
            }
        }

        warnings
    }
}

/// Run every repository-aware validator.
#[must_use]
pub fn warnings(config: &Config, repo_root: &Path) -> Vec<ValidationWarning> {
    MappingValidator::new(&config.link_mappings).validate(repo_root)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn config_with(mappings: Vec<Mapping>, patterns: &[&str]) -> Config {
        Config {
            ignore_patterns: patterns.iter().map(ToString::to_string).collect(),
            link_mappings: mappings,
        }
    }

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn accepts_valid_config() {
        let config = config_with(
            vec![Mapping::new("home", "~/"), Mapping::new("etc", "/etc")],
            &["*.swp", "!keep.swp", "build/"],
        );
        validate(&config).unwrap();
    }

    #[test]
    fn rejects_empty_mapping_list() {
        let err = validate(&config_with(vec![], &[])).unwrap_err();
        assert_eq!(field_of(err), "link_mappings");
    }

    #[test]
    fn rejects_absolute_source() {
        let err = validate(&config_with(vec![Mapping::new("/home", "~/")], &[])).unwrap_err();
        assert_eq!(field_of(err), "link_mappings[0].source");
    }

    #[test]
    fn rejects_parent_dir_source() {
        let err = validate(&config_with(vec![Mapping::new("a/../..", "~/")], &[])).unwrap_err();
        assert_eq!(field_of(err), "link_mappings[0].source");
    }

    #[test]
    fn rejects_relative_target() {
        let err = validate(&config_with(vec![Mapping::new("home", "dest")], &[])).unwrap_err();
        assert_eq!(field_of(err), "link_mappings[0].target");
    }

    #[test]
    fn rejects_empty_target() {
        let err = validate(&config_with(vec![Mapping::new("home", " ")], &[])).unwrap_err();
        assert_eq!(field_of(err), "link_mappings[0].target");
    }

    #[test]
    fn rejects_unsafe_link_unit() {
        let mut m = Mapping::new("config", "~/.config");
        m.link_as_unit = vec!["../nvim".to_string()];
        let err = validate(&config_with(vec![m], &[])).unwrap_err();
        assert_eq!(field_of(err), "link_mappings[0].link_as_unit[0]");
    }

    #[test]
    fn rejects_empty_pattern() {
        let err =
            validate(&config_with(vec![Mapping::new("home", "~/")], &["*.swp", ""])).unwrap_err();
        assert_eq!(field_of(err), "ignore_patterns[1]");
    }

    #[test]
    fn rejects_uncompilable_glob() {
        let err = validate(&config_with(vec![Mapping::new("home", "~/")], &["[oops"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn warns_about_missing_and_duplicate_sources() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::create_dir(repo.path().join("home")).unwrap();
        let config = config_with(
            vec![
                Mapping::new("home", "~/"),
                Mapping::new("home", "/srv"),
                Mapping::new("missing", "~/m"),
            ],
            &[],
        );
        let found = warnings(&config, repo.path());
        assert!(found.iter().any(|w| w.item == "missing"));
        assert!(
            found
                .iter()
                .any(|w| w.item == "home" && w.message.contains("more than once"))
        );
    }

    #[test]
    fn warns_about_nested_sources() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(repo.path().join("home/config")).unwrap();
        let config = config_with(
            vec![
                Mapping::new("home", "~/"),
                Mapping::new("home/config", "~/.config"),
            ],
            &[],
        );
        let found = warnings(&config, repo.path());
        assert!(found.iter().any(|w| w.item == "home/config"
            && w.message.contains("nested")));
    }
}
