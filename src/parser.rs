use crate::ast::{Group, Node, TokenData};
use crate::error::{LoadError, ValidationError};
use crate::utils::offset_for_line_column;
use miette::NamedSource;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One parsed token source file.
///
/// The per-file tree is kept intact for collision analysis; merging happens
/// on copies (see [`crate::store::SourceSet::merged`]).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: Arc<Path>,
    pub root: Group,
    /// True for context-mapping files, whose tokens may omit `$type`.
    pub context: bool,
    /// Structure issues found while building the tree.
    pub issues: Vec<ValidationError>,
}

impl SourceFile {
    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Builds token trees from JSON documents.
pub struct Parser<'a> {
    source_text: &'a str,
    path: Arc<Path>,
    context: bool,
    issues: Vec<ValidationError>,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        Self {
            source_text,
            path: Arc::from(path),
            context: false,
            issues: Vec::new(),
        }
    }

    /// Marks the document as a context-mapping file.
    pub fn context(mut self, context: bool) -> Self {
        self.context = context;
        self
    }

    /// Parses the whole document.
    ///
    /// Malformed JSON is a [`LoadError::Parse`] and a non-object root is a
    /// [`LoadError::Structure`]. Smaller shape problems inside the tree are
    /// collected into [`SourceFile::issues`] without stopping the parse.
    pub fn parse_document(mut self) -> Result<SourceFile, LoadError> {
        let json: Value = serde_json::from_str(self.source_text).map_err(|err| {
            let offset = offset_for_line_column(self.source_text, err.line(), err.column());
            let len = usize::from(offset < self.source_text.len());
            LoadError::Parse {
                path: self.path.to_path_buf(),
                message: err.to_string(),
                src: NamedSource::new(
                    self.path.display().to_string(),
                    self.source_text.to_string(),
                ),
                span: (offset, len).into(),
            }
        })?;

        let map = match json {
            Value::Object(map) => map,
            other => {
                return Err(LoadError::Structure {
                    path: self.path.to_path_buf(),
                    message: format!(
                        "document root must be an object, found {}",
                        kind_of(&other)
                    ),
                })
            }
        };

        let mut path = Vec::new();
        let root = self.parse_group(&map, &mut path, None);
        log::debug!("parsed {}", self.path.display());

        Ok(SourceFile {
            path: self.path,
            root,
            context: self.context,
            issues: self.issues,
        })
    }

    /// Group ::= { "$"-key | key: (Token | Group) }
    fn parse_group(
        &mut self,
        map: &Map<String, Value>,
        path: &mut Vec<String>,
        inherited_type: Option<&str>,
    ) -> Group {
        let mut group = Group::new();
        group.type_name = map.get("$type").and_then(Value::as_str).map(str::to_string);
        group.description = map
            .get("$description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let effective_type = group.type_name.as_deref().or(inherited_type);

        for (key, value) in map {
            if key.starts_with('$') {
                continue;
            }
            path.push(key.clone());
            match value {
                Value::Object(child) => {
                    if let Some(node) = self.parse_node(child, path, effective_type) {
                        group.children.insert(key.clone(), node);
                    }
                }
                other => self.structure_issue(
                    path,
                    format!("expected a token or group object, found {}", kind_of(other)),
                ),
            }
            path.pop();
        }
        group
    }

    /// Node ::= Token | Group, decided by the presence of `$value`.
    fn parse_node(
        &mut self,
        map: &Map<String, Value>,
        path: &mut Vec<String>,
        inherited_type: Option<&str>,
    ) -> Option<Node> {
        let Some(value) = map.get("$value") else {
            let group = self.parse_group(map, path, inherited_type);
            if group.is_empty() && map.contains_key("$type") {
                self.structure_issue(path, "has a $type but no $value".to_string());
                return None;
            }
            return Some(Node::Group(group));
        };

        if map.keys().any(|k| !k.starts_with('$')) {
            self.structure_issue(
                path,
                "a token with $value cannot also contain child tokens or groups".to_string(),
            );
        }

        let type_name = match map.get("$type") {
            Some(Value::String(t)) => Some(t.clone()),
            Some(other) => {
                self.structure_issue(path, format!("$type must be a string, found {}", kind_of(other)));
                None
            }
            None => inherited_type.map(str::to_string),
        };

        Some(Node::Token(TokenData {
            path: path.clone(),
            value: value.clone(),
            type_name,
            description: map
                .get("$description")
                .and_then(Value::as_str)
                .map(str::to_string),
            source: Arc::clone(&self.path),
            context: self.context,
        }))
    }

    fn structure_issue(&mut self, path: &[String], message: String) {
        self.issues.push(ValidationError::Structure {
            file: self.path.display().to_string(),
            path: Some(path.join(".")),
            message: format!("`{}` {message}", path.join(".")),
        });
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parses a document held in memory, e.g. in tests.
pub fn parse_str(source_text: &str, name: &str) -> Result<SourceFile, LoadError> {
    Parser::new(source_text, name).parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_tokens_and_groups() {
        let source = r##"{
            "$schema": "https://example.com/schema.json",
            "color": {
                "$description": "Palette",
                "white": { "$value": "#ffffff", "$type": "color", "$description": "Pure white" }
            }
        }"##;
        let file = parse_str(source, "colors.json").unwrap();
        assert!(file.issues.is_empty());
        assert_eq!(file.root.children.len(), 1);
        let white = file.root.get("color.white").unwrap();
        assert_eq!(white.path, vec!["color", "white"]);
        assert_eq!(white.value, json!("#ffffff"));
        assert_eq!(white.type_name.as_deref(), Some("color"));
        assert_eq!(white.description.as_deref(), Some("Pure white"));
        assert!(file.root.get("$schema").is_none());
    }

    #[test]
    fn test_group_type_is_inherited() {
        let source = r#"{ "spacing": { "$type": "dimension", "sm": { "$value": "8px" } } }"#;
        let file = parse_str(source, "spacing.json").unwrap();
        assert_eq!(
            file.root.get("spacing.sm").unwrap().type_name.as_deref(),
            Some("dimension")
        );
    }

    #[test]
    fn test_structure_issues_are_collected() {
        let source = r##"{
            "color": {
                "red": "#ff0000",
                "blue": { "$type": "color" },
                "green": { "$value": "#00ff00", "$type": "color", "light": { "$value": "#0f0" } }
            }
        }"##;
        let file = parse_str(source, "broken.json").unwrap();
        assert_eq!(file.issues.len(), 3);
        assert!(file.root.get("color.green").is_some());
    }

    #[test]
    fn test_root_must_be_object() {
        let err = parse_str("[1, 2]", "list.json").unwrap_err();
        assert!(matches!(err, LoadError::Structure { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_str("{ \"a\": ", "bad.json").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
