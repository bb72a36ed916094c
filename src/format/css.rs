use super::{Format, FormatOptions, ResolvedSet, ResolvedToken, GENERATED_NOTICE};
use crate::ast::TokenType;
use crate::lexer::{parse_expr, Fragment, ValueExpr};
use crate::utils::dashed_name;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt::Write;

/// CSS custom properties: base tokens under the configured selector, each
/// theme's tokens under that theme's selector.
pub struct Css;

impl Format for Css {
    fn render(&self, tokens: &ResolvedSet, options: &FormatOptions) -> String {
        let mut out = format!("/**\n * {GENERATED_NOTICE}\n */\n");
        let reference = |path: &str| {
            let target = tokens.get(path).filter(|t| t.theme.is_none())?;
            css_value(target, None)?;
            Some(format!("var({})", options.css_variable(target.variable_path())))
        };

        write_block(&mut out, &options.selector, tokens.base(), options, &reference);
        for (theme, selector) in &options.themes {
            let mut themed = tokens.themed(theme).peekable();
            if themed.peek().is_some() {
                write_block(&mut out, selector, themed, options, &reference);
            }
        }
        out
    }
}

fn write_block<'t>(
    out: &mut String,
    selector: &str,
    tokens: impl Iterator<Item = &'t ResolvedToken>,
    options: &FormatOptions,
    reference: &dyn Fn(&str) -> Option<String>,
) {
    let mut seen = HashSet::new();
    let _ = writeln!(out, "\n{selector} {{");
    for token in tokens {
        let Some(value) = css_value(token, options.output_references.then_some(reference)) else {
            log::debug!("`{}` has no single CSS value, skipped", token.name());
            continue;
        };
        let name = options.css_variable(token.variable_path());
        if !seen.insert(name.clone()) {
            log::warn!("`{}` maps to {name}, which is already declared in {selector}", token.name());
            continue;
        }
        let _ = writeln!(out, "  {name}: {value};");
    }
    out.push_str("}\n");
}

/// SCSS variables. Sass has no cascade to lean on, so themed tokens keep
/// the theme in their name: `$prefix-dark-color-bg`.
pub struct Scss;

impl Format for Scss {
    fn render(&self, tokens: &ResolvedSet, options: &FormatOptions) -> String {
        let mut out = format!("// {GENERATED_NOTICE}\n\n");
        let mut seen = HashSet::new();
        let mut themed: Vec<&ResolvedToken> = Vec::new();
        for theme in options.themes.keys() {
            themed.extend(tokens.themed(theme));
        }
        for token in tokens.base().chain(themed) {
            let Some(value) = css_value(token, None) else {
                continue;
            };
            let mut path: Vec<&str> = token.theme.as_deref().into_iter().collect();
            path.extend(token.variable_path().iter().map(String::as_str));
            let name = dashed_name(&options.prefix, &path);
            if seen.insert(name.clone()) {
                let _ = writeln!(out, "${name}: {value};");
            }
        }
        out
    }
}

/// Renders a token as one CSS value, or `None` when the type has no
/// single-value form (typography, or objects of an unknown shape).
///
/// With `reference` set, values written as references in the source are
/// rendered through it instead of being inlined. When `reference` has no
/// variable for one of the targets, the resolved value is used instead.
pub fn css_value(
    token: &ResolvedToken,
    reference: Option<&dyn Fn(&str) -> Option<String>>,
) -> Option<String> {
    let token_type = token.token_type();
    if token_type == Some(TokenType::Typography) {
        return None;
    }
    if let (Some(reference), Value::String(original)) = (reference, &token.original) {
        if let Some(value) = referenced_value(original, reference) {
            return Some(value);
        }
    }
    render_value(&token.value, token_type)
}

fn referenced_value(original: &str, reference: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    match parse_expr(original) {
        ValueExpr::Literal => None,
        ValueExpr::Simple(path) => reference(&path),
        ValueExpr::Compound(fragments) => {
            let mut out = String::new();
            for fragment in fragments {
                match fragment {
                    Fragment::Literal(text) => out.push_str(&text),
                    Fragment::Reference(path) => out.push_str(&reference(&path)?),
                }
            }
            Some(out)
        }
    }
}

fn render_value(value: &Value, token_type: Option<TokenType>) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        Value::Array(items) => match token_type {
            Some(TokenType::CubicBezier) => {
                let points: Option<Vec<String>> =
                    items.iter().map(|v| render_value(v, None)).collect();
                Some(format!("cubic-bezier({})", points?.join(", ")))
            }
            Some(TokenType::FontFamily) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(quote_font_family)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => {
                let parts: Option<Vec<String>> =
                    items.iter().map(|v| render_value(v, token_type)).collect();
                let separator = if token_type == Some(TokenType::Shadow) { ", " } else { " " };
                Some(parts?.join(separator))
            }
        },
        Value::Object(map) => match token_type? {
            TokenType::Shadow => Some(shadow(map)),
            TokenType::Border => shorthand(map, &["width", "style", "color"]),
            TokenType::Transition => shorthand(map, &["duration", "timingFunction", "delay"]),
            _ => None,
        },
    }
}

fn shadow(map: &Map<String, Value>) -> String {
    let mut parts = Vec::new();
    if map.get("inset").and_then(Value::as_bool) == Some(true) {
        parts.push("inset".to_string());
    }
    for key in ["offsetX", "offsetY", "blur", "spread", "color"] {
        if let Some(part) = map.get(key).and_then(|v| render_value(v, None)) {
            parts.push(part);
        }
    }
    parts.join(" ")
}

fn shorthand(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    let parts: Vec<String> = keys
        .iter()
        .filter_map(|key| map.get(*key))
        .filter_map(|v| match v {
            Value::Array(_) => render_value(v, Some(TokenType::CubicBezier)),
            _ => render_value(v, None),
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn quote_font_family(name: &str) -> String {
    if name.contains(' ') && !name.starts_with('"') {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}
