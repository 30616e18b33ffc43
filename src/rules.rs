use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::diff::ChangeSet;
use crate::error::{Error, Result};

/// Trigger value that short-circuits matching: the rule always fires.
const ALWAYS_TRIGGER: &str = "always";

/// A field that accepts either a bare string or an array of strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// One rule as written in the table: triggers, checklist items, and an
/// optional path filter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mapping {
    pub triggers: OneOrMany,
    pub items: Vec<String>,
    #[serde(default)]
    pub paths: Option<OneOrMany>,
}

/// Top-level rule table shape: `{ "mappings": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleFile {
    pub mappings: Vec<Mapping>,
}

/// How a compiled rule decides whether it fires.
#[derive(Debug)]
pub enum RuleKind {
    /// Fires unconditionally; diff content and path filters are ignored.
    Always,
    /// Fires when any trigger matches the (possibly path-scoped) change text.
    Content {
        triggers: Vec<Regex>,
        scope: Option<PathScope>,
    },
}

/// Compiled path filter of a rule.
///
/// Glob dialect, pinned here: `*` and `?` stay within a path segment, `**`
/// crosses segments, dotfiles are matched like any other name, matching is
/// case-sensitive.
#[derive(Debug)]
pub struct PathScope {
    patterns: Vec<String>,
    globs: GlobSet,
}

impl PathScope {
    fn new(patterns: Vec<String>) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| Error::InvalidGlob(format!("`{pattern}`: {e}")))?;
            builder.add(glob);
        }
        let globs = builder
            .build()
            .map_err(|e| Error::InvalidGlob(e.to_string()))?;
        Ok(Self { patterns, globs })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.globs.is_match(Path::new(path))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// A rule ready for evaluation: triggers compiled once per table load.
#[derive(Debug)]
pub struct CompiledRule {
    pub items: Vec<String>,
    pub kind: RuleKind,
}

/// Read and compile a rule table from a JSON file.
pub fn load(path: &Path) -> Result<Vec<CompiledRule>> {
    if !path.exists() {
        return Err(Error::RuleTableNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Parse and compile a rule table from JSON text.
pub fn parse(content: &str) -> Result<Vec<CompiledRule>> {
    let file: RuleFile = serde_json::from_str(content)?;
    compile(file)
}

/// Compile a deserialized rule table, surfacing configuration defects:
/// empty `items`/`triggers`, invalid trigger regexes, invalid path globs.
pub fn compile(file: RuleFile) -> Result<Vec<CompiledRule>> {
    let rules: Vec<CompiledRule> = file
        .mappings
        .into_iter()
        .map(compile_mapping)
        .collect::<Result<_>>()?;
    debug!(count = rules.len(), "compiled rule table");
    Ok(rules)
}

fn compile_mapping(mapping: Mapping) -> Result<CompiledRule> {
    let triggers = mapping.triggers.into_vec();
    if triggers.is_empty() {
        return Err(Error::RuleValidation("rule has no triggers".to_string()));
    }
    if mapping.items.is_empty() {
        return Err(Error::RuleValidation("rule has no items".to_string()));
    }

    if triggers.iter().any(|t| t.eq_ignore_ascii_case(ALWAYS_TRIGGER)) {
        return Ok(CompiledRule {
            items: mapping.items,
            kind: RuleKind::Always,
        });
    }

    let triggers = triggers
        .iter()
        .map(|pattern| compile_trigger(pattern))
        .collect::<Result<Vec<_>>>()?;
    let scope = mapping
        .paths
        .map(|paths| PathScope::new(paths.into_vec()))
        .transpose()?;

    Ok(CompiledRule {
        items: mapping.items,
        kind: RuleKind::Content { triggers, scope },
    })
}

fn compile_trigger(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::InvalidTrigger(format!("`{pattern}`: {e}")))
}

/// Evaluate every rule against the change set, in table order.
///
/// Returns the raw, not-yet-deduplicated item sequence. Items from a
/// path-scoped firing rule are suffixed with the matching file identifiers
/// in first-encountered order, `" (id1, id2, ...)"`.
pub fn evaluate(changes: &ChangeSet, rules: &[CompiledRule]) -> Vec<String> {
    let mut items = Vec::new();

    for rule in rules {
        match &rule.kind {
            RuleKind::Always => items.extend(rule.items.iter().cloned()),
            RuleKind::Content { triggers, scope } => {
                let (text, scoped_paths) = match scope {
                    Some(scope) => {
                        let matching: Vec<(&str, &str)> = changes
                            .iter()
                            .filter(|(path, _)| scope.matches(path))
                            .collect();
                        let texts: Vec<&str> =
                            matching.iter().map(|(_, text)| *text).collect();
                        let paths: Vec<&str> =
                            matching.iter().map(|(path, _)| *path).collect();
                        (texts.join("\n"), Some(paths))
                    }
                    None => (changes.all_text(), None),
                };

                if !triggers.iter().any(|trigger| trigger.is_match(&text)) {
                    continue;
                }

                match &scoped_paths {
                    Some(paths) => {
                        let suffix = paths.join(", ");
                        items.extend(
                            rule.items.iter().map(|item| format!("{item} ({suffix})")),
                        );
                    }
                    None => items.extend(rule.items.iter().cloned()),
                }
            }
        }
    }

    items
}
