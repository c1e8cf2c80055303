//! Rule data embedded in the binary for standalone distribution.

/// Default rule document (YAML), compiled in from `rules/patterns.yml`.
pub static DEFAULT_RULES: &str = include_str!("../../../../rules/patterns.yml");
