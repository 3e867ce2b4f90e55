//! # Project Descriptor Model
//!
//! This module defines the parsed-project handle handed out by the loader
//! and the parsing seam that produces it.
//!
//! ## Key Components
//!
//! - **`Project`**: an evaluated descriptor — property lookup, ordered item
//!   lists, and the descriptor's own directory.
//!
//! - **`DescriptorParser`**: the trait seam between the graph loader and
//!   the concrete descriptor format. The loader only ever talks to this
//!   trait, which keeps the traversal testable with mock parsers and keeps
//!   the format swappable.
//!
//! - **`YamlDescriptorParser`**: the default implementation. A descriptor
//!   is a YAML mapping with an optional `tools` version, a `properties`
//!   string map, and an `items` map of list name to sequence of strings.
//!
//! ## Evaluation
//!
//! Property values and item values may reference properties as `$(Name)`.
//! Global properties always win over local definitions, matching the rule
//! that every project in one load shares a single evaluation context.
//! Local properties are evaluated in file order, so a property may refer
//! to the ones defined above it. Expansion is iterative with a depth cap
//! to turn reference cycles into descriptor errors instead of hangs.
//!
//! ## Failure Taxonomy
//!
//! Parsing fails with the tagged [`ParseFailure`]: `Invalid` carries a
//! structured [`DescriptorError`] with source location and a stable error
//! code; `Other` is the generic variant for I/O and similar failures. The
//! two variants are what the loader forwards to its error sink.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_yaml::Value;

use crate::logger::SourceLocation;
use crate::path::absolutize;

/// Stable error codes carried by structured descriptor errors.
pub mod codes {
    /// The descriptor is not well-formed YAML.
    pub const SYNTAX: &str = "PG0001";
    /// The descriptor is well-formed YAML but violates the descriptor schema.
    pub const SCHEMA: &str = "PG0002";
    /// The descriptor declares a tools version the loader cannot evaluate.
    pub const TOOLS_VERSION: &str = "PG0003";
    /// A value references a property that is not defined (strict mode only).
    pub const UNDEFINED_PROPERTY: &str = "PG0004";
    /// Property expansion exceeded the depth cap, typically a reference cycle.
    pub const EXPANSION_DEPTH: &str = "PG0005";
}

/// Expansion passes allowed before a value is declared cyclic.
const MAX_EXPANSION_DEPTH: usize = 16;

/// How permissively malformed descriptor constructs are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Reject unknown top-level keys, non-string scalars, and references to
    /// undefined properties.
    #[default]
    Strict,
    /// Ignore unknown keys, stringify non-string scalars, and expand
    /// undefined property references to the empty string.
    Lenient,
}

/// Structured "invalid descriptor" failure with source location detail.
///
/// Location fields are 1-based where known and zero where the parser could
/// not determine them (semantic errors have no span).
#[derive(Debug, Clone)]
pub struct DescriptorError {
    pub path: PathBuf,
    pub line: u64,
    pub column: u64,
    pub end_line: u64,
    pub end_column: u64,
    pub code: String,
    pub message: String,
}

impl From<&DescriptorError> for SourceLocation {
    fn from(error: &DescriptorError) -> Self {
        SourceLocation {
            file: error.path.clone(),
            line: error.line,
            column: error.column,
            end_line: error.end_line,
            end_column: error.end_column,
            code: error.code.clone(),
        }
    }
}

/// Tagged result of a failed parse attempt.
#[derive(Debug)]
pub enum ParseFailure {
    /// The descriptor exists but is invalid; carries location detail.
    Invalid(DescriptorError),
    /// Anything else: unreadable file, I/O failure, evaluation breakdown.
    Other(String),
}

/// A single entry of a named item list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectItem {
    /// The item value with all property references expanded.
    pub evaluated_value: String,
    /// Directory of the descriptor that declared this item. Relative
    /// reference targets resolve against it.
    pub declaring_directory: PathBuf,
}

/// An evaluated project descriptor.
#[derive(Debug, Clone)]
pub struct Project {
    path: PathBuf,
    directory: PathBuf,
    properties: BTreeMap<String, String>,
    items: BTreeMap<String, Vec<ProjectItem>>,
}

impl Project {
    /// Build a project handle from already-evaluated parts.
    ///
    /// The path is normalized to absolute; the project directory is its
    /// parent.
    pub fn new(
        path: PathBuf,
        properties: BTreeMap<String, String>,
        items: BTreeMap<String, Vec<ProjectItem>>,
    ) -> Self {
        let path = absolutize(&path);
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            directory,
            properties,
            items,
        }
    }

    /// Absolute path of the descriptor this project was parsed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the descriptor.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Evaluated property lookup.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// The ordered item list registered under `name`, empty if absent.
    pub fn items(&self, name: &str) -> &[ProjectItem] {
        self.items.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Parsing seam between the graph loader and the descriptor format.
///
/// Implementations receive the loader's full evaluation context so that
/// every project parsed in one load shares it.
pub trait DescriptorParser: Send + Sync {
    fn parse(
        &self,
        path: &Path,
        global_properties: &BTreeMap<String, String>,
        tools_version: &str,
        mode: ParseMode,
    ) -> Result<Project, ParseFailure>;
}

/// The default descriptor parser for the YAML descriptor format.
pub struct YamlDescriptorParser {
    property_ref: Regex,
}

impl YamlDescriptorParser {
    pub fn new() -> Self {
        Self {
            property_ref: Regex::new(r"\$\(([A-Za-z_][A-Za-z0-9_.\-]*)\)")
                .expect("property reference pattern is valid"),
        }
    }

    /// Expand `$(Name)` references in `raw` until none remain.
    ///
    /// Returns `(code, message)` on failure so the caller can attach the
    /// descriptor path.
    fn expand(
        &self,
        raw: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
        mode: ParseMode,
    ) -> Result<String, (&'static str, String)> {
        let mut value = raw.to_string();
        for _ in 0..MAX_EXPANSION_DEPTH {
            if !self.property_ref.is_match(&value) {
                return Ok(value);
            }
            let mut undefined: Option<String> = None;
            let next = self
                .property_ref
                .replace_all(&value, |caps: &regex::Captures<'_>| {
                    let name = &caps[1];
                    match lookup(name) {
                        Some(resolved) => resolved,
                        None => {
                            undefined.get_or_insert_with(|| name.to_string());
                            String::new()
                        }
                    }
                })
                .into_owned();
            if let Some(name) = undefined {
                if mode == ParseMode::Strict {
                    return Err((
                        codes::UNDEFINED_PROPERTY,
                        format!("reference to undefined property `{}` in `{}`", name, raw),
                    ));
                }
            }
            value = next;
        }
        Err((
            codes::EXPANSION_DEPTH,
            format!("property expansion of `{}` did not terminate (reference cycle?)", raw),
        ))
    }

    /// Coerce a YAML scalar to a string according to the parse mode.
    ///
    /// `Ok(None)` means "skip this entry" (lenient nulls). Sequences and
    /// mappings are invalid in either mode.
    fn scalar_string(
        value: &Value,
        mode: ParseMode,
        what: &str,
    ) -> Result<Option<String>, (&'static str, String)> {
        match value {
            Value::String(s) => Ok(Some(s.clone())),
            Value::Bool(b) if mode == ParseMode::Lenient => Ok(Some(b.to_string())),
            Value::Number(n) if mode == ParseMode::Lenient => Ok(Some(n.to_string())),
            Value::Null if mode == ParseMode::Lenient => Ok(None),
            other => Err((
                codes::SCHEMA,
                format!("{} must be a string, found {}", what, yaml_kind(other)),
            )),
        }
    }
}

impl Default for YamlDescriptorParser {
    fn default() -> Self {
        Self::new()
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Leading component of a version string, for compatibility checks.
fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

impl DescriptorParser for YamlDescriptorParser {
    fn parse(
        &self,
        path: &Path,
        global_properties: &BTreeMap<String, String>,
        tools_version: &str,
        mode: ParseMode,
    ) -> Result<Project, ParseFailure> {
        let invalid = |code: &str, message: String| {
            ParseFailure::Invalid(DescriptorError {
                path: path.to_path_buf(),
                line: 0,
                column: 0,
                end_line: 0,
                end_column: 0,
                code: code.to_string(),
                message,
            })
        };

        let text = std::fs::read_to_string(path).map_err(|e| {
            ParseFailure::Other(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let root: Value = serde_yaml::from_str(&text).map_err(|e| {
            let (line, column) = e
                .location()
                .map(|loc| (loc.line() as u64, loc.column() as u64))
                .unwrap_or((0, 0));
            ParseFailure::Invalid(DescriptorError {
                path: path.to_path_buf(),
                line,
                column,
                end_line: 0,
                end_column: 0,
                code: codes::SYNTAX.to_string(),
                message: e.to_string(),
            })
        })?;

        let mapping = match root {
            // An empty descriptor is a valid project with nothing in it.
            Value::Null => serde_yaml::Mapping::new(),
            Value::Mapping(m) => m,
            other => {
                return Err(invalid(
                    codes::SCHEMA,
                    format!("descriptor root must be a mapping, found {}", yaml_kind(&other)),
                ));
            }
        };

        let mut raw_properties: Vec<(String, String)> = Vec::new();
        let mut raw_items: Vec<(String, Vec<String>)> = Vec::new();

        for (key, value) in &mapping {
            let key = match key {
                Value::String(k) => k.as_str(),
                other if mode == ParseMode::Lenient => {
                    log::debug!(
                        "{}: ignoring non-string key ({})",
                        path.display(),
                        yaml_kind(other)
                    );
                    continue;
                }
                other => {
                    return Err(invalid(
                        codes::SCHEMA,
                        format!("descriptor keys must be strings, found {}", yaml_kind(other)),
                    ));
                }
            };

            match key {
                "tools" => {
                    let declared = Self::scalar_string(value, mode, "`tools`")
                        .map_err(|(code, message)| invalid(code, message))?;
                    if let Some(declared) = declared {
                        if major(&declared) != major(tools_version) {
                            return Err(invalid(
                                codes::TOOLS_VERSION,
                                format!(
                                    "descriptor requires tools version {} but the loader is configured for {}",
                                    declared, tools_version
                                ),
                            ));
                        }
                    }
                }
                "properties" => {
                    let map = match value {
                        Value::Mapping(m) => m,
                        Value::Null => continue,
                        other => {
                            return Err(invalid(
                                codes::SCHEMA,
                                format!("`properties` must be a mapping, found {}", yaml_kind(other)),
                            ));
                        }
                    };
                    for (name, raw) in map {
                        let name = match Self::scalar_string(name, mode, "property name")
                            .map_err(|(code, message)| invalid(code, message))?
                        {
                            Some(name) => name,
                            None => continue,
                        };
                        let raw = match Self::scalar_string(
                            raw,
                            mode,
                            &format!("property `{}`", name),
                        )
                        .map_err(|(code, message)| invalid(code, message))?
                        {
                            Some(raw) => raw,
                            None => continue,
                        };
                        raw_properties.push((name, raw));
                    }
                }
                "items" => {
                    let map = match value {
                        Value::Mapping(m) => m,
                        Value::Null => continue,
                        other => {
                            return Err(invalid(
                                codes::SCHEMA,
                                format!("`items` must be a mapping, found {}", yaml_kind(other)),
                            ));
                        }
                    };
                    for (name, entries) in map {
                        let name = match Self::scalar_string(name, mode, "item list name")
                            .map_err(|(code, message)| invalid(code, message))?
                        {
                            Some(name) => name,
                            None => continue,
                        };
                        let entries = match entries {
                            Value::Sequence(seq) => seq,
                            Value::Null => continue,
                            other => {
                                return Err(invalid(
                                    codes::SCHEMA,
                                    format!(
                                        "item list `{}` must be a sequence, found {}",
                                        name,
                                        yaml_kind(other)
                                    ),
                                ));
                            }
                        };
                        let mut values = Vec::with_capacity(entries.len());
                        for entry in entries {
                            if let Some(value) = Self::scalar_string(
                                entry,
                                mode,
                                &format!("entries of item list `{}`", name),
                            )
                            .map_err(|(code, message)| invalid(code, message))?
                            {
                                values.push(value);
                            }
                        }
                        raw_items.push((name, values));
                    }
                }
                unknown if mode == ParseMode::Strict => {
                    return Err(invalid(
                        codes::SCHEMA,
                        format!("unknown top-level key `{}`", unknown),
                    ));
                }
                unknown => {
                    log::debug!("{}: ignoring unknown key `{}`", path.display(), unknown);
                }
            }
        }

        // Local properties evaluate in file order and may refer to earlier
        // ones; globals always win over locals.
        let mut locals: BTreeMap<String, String> = BTreeMap::new();
        for (name, raw) in raw_properties {
            let evaluated = self
                .expand(
                    &raw,
                    &|n: &str| {
                        global_properties
                            .get(n)
                            .or_else(|| locals.get(n))
                            .cloned()
                    },
                    mode,
                )
                .map_err(|(code, message)| invalid(code, message))?;
            locals.insert(name, evaluated);
        }
        let mut properties = locals;
        for (name, value) in global_properties {
            properties.insert(name.clone(), value.clone());
        }

        let absolute = absolutize(path);
        let directory = absolute.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut items: BTreeMap<String, Vec<ProjectItem>> = BTreeMap::new();
        for (name, values) in raw_items {
            let list = items.entry(name).or_default();
            for raw in values {
                let evaluated = self
                    .expand(&raw, &|n: &str| properties.get(n).cloned(), mode)
                    .map_err(|(code, message)| invalid(code, message))?;
                // An entry that evaluates to nothing contributes no item.
                if evaluated.is_empty() {
                    continue;
                }
                list.push(ProjectItem {
                    evaluated_value: evaluated,
                    declaring_directory: directory.clone(),
                });
            }
        }

        Ok(Project::new(absolute, properties, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn globals(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write_descriptor(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn parse(path: &Path, globals: &BTreeMap<String, String>, mode: ParseMode) -> Result<Project, ParseFailure> {
        YamlDescriptorParser::new().parse(path, globals, "1.0", mode)
    }

    #[test]
    fn test_parse_minimal_descriptor() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(
            &dir,
            "app.proj",
            "properties:\n  Configuration: Release\nitems:\n  ProjectReference:\n    - ../lib/lib.proj\n",
        );

        let project = parse(&path, &BTreeMap::new(), ParseMode::Strict).unwrap();
        assert_eq!(project.property("Configuration"), Some("Release"));
        let refs = project.items("ProjectReference");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].evaluated_value, "../lib/lib.proj");
        assert_eq!(refs[0].declaring_directory, crate::path::absolutize(dir.path()));
        assert!(project.path().is_absolute());
    }

    #[test]
    fn test_parse_empty_descriptor() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(&dir, "empty.proj", "");

        let project = parse(&path, &BTreeMap::new(), ParseMode::Strict).unwrap();
        assert_eq!(project.property("anything"), None);
        assert!(project.items("ProjectReference").is_empty());
    }

    #[test]
    fn test_property_expansion_in_file_order() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(
            &dir,
            "app.proj",
            "properties:\n  Root: /srv\n  OutDir: $(Root)/out\n",
        );

        let project = parse(&path, &BTreeMap::new(), ParseMode::Strict).unwrap();
        assert_eq!(project.property("OutDir"), Some("/srv/out"));
    }

    #[test]
    fn test_global_properties_override_locals() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(
            &dir,
            "app.proj",
            "properties:\n  Configuration: Debug\n  OutDir: out/$(Configuration)\n",
        );

        let project = parse(
            &path,
            &globals(&[("Configuration", "Release")]),
            ParseMode::Strict,
        )
        .unwrap();
        assert_eq!(project.property("Configuration"), Some("Release"));
        assert_eq!(project.property("OutDir"), Some("out/Release"));
    }

    #[test]
    fn test_item_values_are_evaluated() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(
            &dir,
            "app.proj",
            "properties:\n  LibDir: ../lib\nitems:\n  ProjectReference:\n    - $(LibDir)/lib.proj\n",
        );

        let project = parse(&path, &BTreeMap::new(), ParseMode::Strict).unwrap();
        assert_eq!(
            project.items("ProjectReference")[0].evaluated_value,
            "../lib/lib.proj"
        );
    }

    #[test]
    fn test_empty_item_entries_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(
            &dir,
            "app.proj",
            "items:\n  ProjectReference:\n    - $(Missing)\n    - real.proj\n",
        );

        let project = parse(&path, &BTreeMap::new(), ParseMode::Lenient).unwrap();
        let refs = project.items("ProjectReference");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].evaluated_value, "real.proj");
    }

    #[test]
    fn test_strict_rejects_undefined_property() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(
            &dir,
            "app.proj",
            "properties:\n  OutDir: $(Missing)/out\n",
        );

        let failure = parse(&path, &BTreeMap::new(), ParseMode::Strict).unwrap_err();
        match failure {
            ParseFailure::Invalid(error) => {
                assert_eq!(error.code, codes::UNDEFINED_PROPERTY);
                assert!(error.message.contains("Missing"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_expansion_cycle_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(
            &dir,
            "app.proj",
            "properties:\n  A: $(A)x\n",
        );

        let failure = parse(&path, &globals(&[("A", "$(A)x")]), ParseMode::Lenient).unwrap_err();
        match failure {
            ParseFailure::Invalid(error) => assert_eq!(error.code, codes::EXPANSION_DEPTH),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_rejects_unknown_top_level_key() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(&dir, "app.proj", "bogus: 1\n");

        let failure = parse(&path, &BTreeMap::new(), ParseMode::Strict).unwrap_err();
        match failure {
            ParseFailure::Invalid(error) => {
                assert_eq!(error.code, codes::SCHEMA);
                assert!(error.message.contains("bogus"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_lenient_ignores_unknown_top_level_key() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(
            &dir,
            "app.proj",
            "bogus: 1\nproperties:\n  Name: app\n",
        );

        let project = parse(&path, &BTreeMap::new(), ParseMode::Lenient).unwrap();
        assert_eq!(project.property("Name"), Some("app"));
    }

    #[test]
    fn test_strict_rejects_non_string_property() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(&dir, "app.proj", "properties:\n  Answer: 42\n");

        let failure = parse(&path, &BTreeMap::new(), ParseMode::Strict).unwrap_err();
        match failure {
            ParseFailure::Invalid(error) => assert_eq!(error.code, codes::SCHEMA),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_lenient_stringifies_scalars() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(
            &dir,
            "app.proj",
            "properties:\n  Answer: 42\n  IsTraversal: true\n",
        );

        let project = parse(&path, &BTreeMap::new(), ParseMode::Lenient).unwrap();
        assert_eq!(project.property("Answer"), Some("42"));
        assert_eq!(project.property("IsTraversal"), Some("true"));
    }

    #[test]
    fn test_syntax_error_carries_location() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(&dir, "broken.proj", "properties:\n  - [unclosed\n");

        let failure = parse(&path, &BTreeMap::new(), ParseMode::Strict).unwrap_err();
        match failure {
            ParseFailure::Invalid(error) => {
                assert_eq!(error.code, codes::SYNTAX);
                assert!(error.line > 0);
                assert_eq!(error.path, path);
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_generic_failure() {
        let failure = parse(
            Path::new("/nonexistent/missing.proj"),
            &BTreeMap::new(),
            ParseMode::Strict,
        )
        .unwrap_err();
        match failure {
            ParseFailure::Other(message) => assert!(message.contains("missing.proj")),
            other => panic!("expected Other, got {:?}", other),
        }
    }

    #[test]
    fn test_tools_version_major_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(&dir, "app.proj", "tools: \"2.0\"\n");

        let failure = parse(&path, &BTreeMap::new(), ParseMode::Strict).unwrap_err();
        match failure {
            ParseFailure::Invalid(error) => {
                assert_eq!(error.code, codes::TOOLS_VERSION);
                assert!(error.message.contains("2.0"));
                assert!(error.message.contains("1.0"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_tools_version_minor_difference_is_compatible() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(&dir, "app.proj", "tools: \"1.3\"\n");

        assert!(parse(&path, &BTreeMap::new(), ParseMode::Strict).is_ok());
    }

    #[test]
    fn test_descriptor_root_must_be_mapping() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(&dir, "app.proj", "- a\n- b\n");

        let failure = parse(&path, &BTreeMap::new(), ParseMode::Lenient).unwrap_err();
        match failure {
            ParseFailure::Invalid(error) => assert_eq!(error.code, codes::SCHEMA),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }
}
