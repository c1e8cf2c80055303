//! Rule definitions, loading and compilation.
//!
//! Rule documents have the shape
//!
//! ```yaml
//! version: v1
//! rules:
//!   - id: free_cancel_days
//!     priority: 90
//!     regex: 'FREE CANCELLATION UNTIL (?P<days>\d+) DAYS'
//!     map:
//!       window:
//!         cutoff_days: "$days"
//! ```
//!
//! Nested `map` objects flatten to dot-separated field paths. A rule whose
//! map is missing or malformed is kept but disabled.

pub mod expr;
pub mod number;
pub mod patterns;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub use expr::Expression;

use crate::error::{CanxError, RuleError};
use crate::models::embedded::DEFAULT_RULES;
use crate::models::span::Span;

/// Named captures of one occurrence.
pub type CaptureMap = BTreeMap<String, String>;

/// Upper bound on the compiled size of a single rule pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// A rule as written in a rule document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    pub id: String,
    #[serde(default)]
    pub priority: i32,
    pub regex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<Value>,
}

/// A rule document: a version tag plus rule definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDocument {
    #[serde(default = "default_version")]
    pub version: String,
    pub rules: Vec<RuleDef>,
}

fn default_version() -> String {
    "unversioned".to_string()
}

/// One target path and the expression that fills it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub path: String,
    pub expr: Expression,
}

/// One located match of a rule's pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub span: Span,
    pub captures: CaptureMap,
}

/// A compiled, immutable extraction rule.
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    priority: i32,
    pattern: Regex,
    fields: Option<Vec<FieldMapping>>,
}

impl Rule {
    /// Compile a rule from its pattern and flat field map.
    ///
    /// Passing `None` for `fields` creates a disabled rule.
    pub fn new<I, P, E>(
        id: impl Into<String>,
        priority: i32,
        pattern: &str,
        fields: Option<I>,
    ) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (P, E)>,
        P: Into<String>,
        E: AsRef<str>,
    {
        let id = id.into();
        let fields = fields.map(|f| {
            f.into_iter()
                .map(|(path, expr)| FieldMapping {
                    path: path.into(),
                    expr: Expression::parse(expr.as_ref()),
                })
                .collect()
        });
        Self::compile(id, priority, pattern, fields)
    }

    /// Compile a rule from a document entry.
    pub fn from_def(def: RuleDef) -> Result<Self, RuleError> {
        let fields = def.map.as_ref().and_then(flatten_map);
        if fields.is_none() {
            warn!("Rule {} has a missing or malformed field map; disabled", def.id);
        }
        Self::compile(def.id, def.priority, &def.regex, fields)
    }

    fn compile(
        id: String,
        priority: i32,
        pattern: &str,
        fields: Option<Vec<FieldMapping>>,
    ) -> Result<Self, RuleError> {
        if id.trim().is_empty() {
            return Err(RuleError::EmptyId);
        }

        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|source| RuleError::InvalidPattern { id: id.clone(), source })?;

        Ok(Self { id, priority, pattern, fields })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Field mappings, or `None` for a disabled rule.
    pub fn fields(&self) -> Option<&[FieldMapping]> {
        self.fields.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.fields.is_some()
    }

    /// Find the next occurrence starting at byte offset `from`.
    pub fn next_occurrence(&self, text: &str, from: usize) -> Option<Occurrence> {
        if from > text.len() {
            return None;
        }

        let caps = self.pattern.captures_at(text, from)?;
        let whole = caps.get(0)?;

        let captures = self
            .pattern
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();

        Some(Occurrence {
            span: Span::new(whole.start(), whole.end()),
            captures,
        })
    }
}

/// Flatten a nested map into dot-path mappings.
///
/// Returns `None` if the map is not an object or contains arrays.
fn flatten_map(map: &Value) -> Option<Vec<FieldMapping>> {
    fn walk(node: &serde_json::Map<String, Value>, base: &str, out: &mut Vec<FieldMapping>) -> bool {
        for (key, value) in node {
            let path = if base.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", base, key)
            };

            let template = match value {
                Value::Object(child) => {
                    if !walk(child, &path, out) {
                        return false;
                    }
                    continue;
                }
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => continue,
                Value::Array(_) => return false,
            };

            out.push(FieldMapping {
                path,
                expr: Expression::parse(&template),
            });
        }
        true
    }

    let object = map.as_object()?;
    let mut out = Vec::new();
    walk(object, "", &mut out).then_some(out)
}

/// An ordered, immutable collection of rules.
///
/// Rules are held in evaluation order: descending priority, stable for
/// equal priorities.
#[derive(Debug, Clone)]
pub struct RuleSet {
    version: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build a rule set, rejecting duplicate ids.
    pub fn new(mut rules: Vec<Rule>) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleError::DuplicateId(rule.id.clone()));
            }
        }

        rules.sort_by_key(|r| std::cmp::Reverse(r.priority));

        Ok(Self {
            version: default_version(),
            rules,
        })
    }

    /// Set the version tag reported in extraction metadata.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn from_document(doc: RuleDocument) -> Result<Self, RuleError> {
        let rules = doc
            .rules
            .into_iter()
            .map(Rule::from_def)
            .collect::<Result<Vec<_>, _>>()?;
        let set = Self::new(rules)?.with_version(doc.version);
        debug!("Loaded {} rules (version {})", set.len(), set.version);
        Ok(set)
    }

    pub fn from_yaml_str(s: &str) -> crate::Result<Self> {
        let doc: RuleDocument = serde_yaml::from_str(s)?;
        Ok(Self::from_document(doc)?)
    }

    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        let doc: RuleDocument = serde_json::from_str(s)?;
        Ok(Self::from_document(doc)?)
    }

    /// Load a rule file; `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// The rule set compiled into the binary.
    pub fn embedded() -> crate::Result<Self> {
        Self::from_yaml_str(DEFAULT_RULES)
    }

    /// Load from `path` when given, otherwise the embedded rules.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        match path {
            Some(p) => Self::from_file(p).map_err(|e| match e {
                CanxError::Io(io) => CanxError::Config(format!(
                    "cannot read rule file {}: {}",
                    p.display(),
                    io
                )),
                other => other,
            }),
            None => Self::embedded(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
