use crate::ast::{walk_tokens, TokenData, TokenType};
use crate::error::ValidationError;
use crate::lexer::{is_reference, references};
use crate::resolver::{find_cycles, is_context_value};
use crate::store::{SourceSet, TokenIndex};
use crate::utils::DIMENSION_UNITS;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap()
});
static FUNCTIONAL_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(rgba?|hsla?)\(\s*[^()]*\)$").unwrap());
static DIMENSION: LazyLock<Regex> = LazyLock::new(|| {
    let units = DIMENSION_UNITS.join("|");
    Regex::new(&format!(r"^[+-]?(\d+(\.\d+)?|\.\d+)({units})$")).unwrap()
});

const NAMED_COLORS: [&str; 16] = [
    "transparent",
    "currentColor",
    "currentcolor",
    "inherit",
    "initial",
    "unset",
    "black",
    "white",
    "red",
    "green",
    "blue",
    "yellow",
    "orange",
    "purple",
    "gray",
    "grey",
];

const FONT_WEIGHT_KEYWORDS: [&str; 4] = ["normal", "bold", "lighter", "bolder"];

/// The outcome of a validation run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Checks every per-file token against the merged index.
///
/// Validation only reads; neither `sources` nor `index` is changed.
pub fn validate(sources: &SourceSet, index: &TokenIndex) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.issues.extend(sources.structure_issues().cloned());

    for file in &sources.files {
        let file_name = file.display_name();
        walk_tokens(&file.root, &mut |token| {
            check_token(token, &file_name, index, &mut report.issues);
        });
    }

    for chain in find_cycles(index) {
        report
            .issues
            .push(ValidationError::CircularReference { chain });
    }

    log::debug!(
        "validation finished: {} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
    report
}

fn check_token(
    token: &TokenData,
    file: &str,
    index: &TokenIndex,
    issues: &mut Vec<ValidationError>,
) {
    let path = token.name();

    match token.type_name.as_deref() {
        None if !token.context => issues.push(ValidationError::MissingType {
            path: path.clone(),
            file: file.to_string(),
        }),
        None => {}
        Some(type_name) => match type_name.parse::<TokenType>() {
            Ok(token_type) => {
                if !check_literal(token_type, &token.value) {
                    issues.push(ValidationError::InvalidLiteral {
                        path: path.clone(),
                        file: file.to_string(),
                        type_name: type_name.to_string(),
                        value: display_value(&token.value),
                    });
                }
            }
            Err(_) => issues.push(ValidationError::UnknownType {
                path: path.clone(),
                file: file.to_string(),
                type_name: type_name.to_string(),
            }),
        },
    }

    for target in references(&token.value) {
        if index.contains(&target) {
            continue;
        }
        let issue = if target.contains('.') {
            ValidationError::ExternalReference {
                path: path.clone(),
                file: file.to_string(),
                target,
            }
        } else {
            ValidationError::BrokenReference {
                path: path.clone(),
                file: file.to_string(),
                target,
            }
        };
        issues.push(issue);
    }
}

/// Checks literal syntax for the types that have one. References and context
/// values are not literals and always pass.
pub fn check_literal(token_type: TokenType, value: &Value) -> bool {
    if let Value::String(s) = value {
        if is_reference(s) || is_context_value(value) {
            return true;
        }
    }
    match token_type {
        TokenType::Color => value.as_str().is_some_and(is_color),
        TokenType::Dimension => match value {
            Value::String(s) => is_dimension(s),
            Value::Number(n) => n.as_f64() == Some(0.0),
            _ => false,
        },
        TokenType::FontWeight => match value {
            Value::String(s) => is_font_weight(s),
            Value::Number(n) => n
                .as_u64()
                .is_some_and(|w| (100..=900).contains(&w) && w % 100 == 0),
            _ => false,
        },
        _ => true,
    }
}

pub fn is_color(value: &str) -> bool {
    let value = value.trim();
    HEX_COLOR.is_match(value) || FUNCTIONAL_COLOR.is_match(value) || NAMED_COLORS.contains(&value)
}

/// `0`, a signed number with a unit, or a space-separated list of those.
pub fn is_dimension(value: &str) -> bool {
    let mut parts = value.split_whitespace().peekable();
    if parts.peek().is_none() {
        return false;
    }
    parts.all(|part| part == "0" || DIMENSION.is_match(part))
}

pub fn is_font_weight(value: &str) -> bool {
    if FONT_WEIGHT_KEYWORDS.contains(&value) {
        return true;
    }
    value.len() == 3
        && value.ends_with("00")
        && matches!(value.as_bytes()[0], b'1'..=b'9')
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_colors() {
        for ok in ["#fff", "#ffffff", "#ffffff80", "rgb(0, 0, 0)", "rgba(0,0,0,0.5)", "hsl(210 50% 40%)", "transparent"] {
            assert!(is_color(ok), "{ok} should be a color");
        }
        for bad in ["#ffff", "fff", "#gggggg", "rgb(0,0,0", "chartreuse-ish"] {
            assert!(!is_color(bad), "{bad} should not be a color");
        }
    }

    #[test]
    fn test_dimensions() {
        for ok in ["0", "1rem", "-2px", "+0.5em", ".25rem", "100%", "8px 16px"] {
            assert!(is_dimension(ok), "{ok} should be a dimension");
        }
        assert!(!is_dimension("0 auto"));
        assert!(!is_dimension("12"));
        assert!(!is_dimension(""));
        assert!(!is_dimension("1 rem"));
        assert!(check_literal(TokenType::Dimension, &json!(0)));
        assert!(!check_literal(TokenType::Dimension, &json!(4)));
    }

    #[test]
    fn test_font_weights() {
        assert!(is_font_weight("400"));
        assert!(is_font_weight("bold"));
        assert!(!is_font_weight("450"));
        assert!(!is_font_weight("000"));
        assert!(!is_font_weight("1000"));
        assert!(check_literal(TokenType::FontWeight, &json!(700)));
        assert!(!check_literal(TokenType::FontWeight, &json!(750)));
    }

    #[test]
    fn test_references_skip_literal_checks() {
        assert!(check_literal(TokenType::Color, &json!("{color.white}")));
        assert!(check_literal(TokenType::Dimension, &json!("{spacing.sm} {spacing.md}")));
        assert!(check_literal(TokenType::Color, &json!("@color.primary")));
    }
}
