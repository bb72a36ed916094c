use super::{pretty_json, Format, FormatOptions, ResolvedSet, ResolvedToken};
use crate::ast::TokenType;
use crate::utils::Dimension;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Number, Value};

const DEFAULT_MODE: &str = "light";

/// A variable-collection document for Figma import: one collection per
/// top-level category, with a `light` mode plus one mode per theme.
pub struct Figma;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FigmaDocument {
    collections: Vec<FigmaCollection>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FigmaCollection {
    name: String,
    modes: Vec<String>,
    variables: Vec<FigmaVariable>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FigmaVariable {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    description: String,
    values_by_mode: IndexMap<String, Value>,
}

impl Format for Figma {
    fn render(&self, tokens: &ResolvedSet, options: &FormatOptions) -> String {
        let mut modes = vec![DEFAULT_MODE.to_string()];
        modes.extend(options.themes.keys().cloned());

        let mut collections: IndexMap<String, IndexMap<String, FigmaVariable>> = IndexMap::new();
        let mut entries: Vec<(&str, &ResolvedToken)> =
            tokens.base().map(|t| (DEFAULT_MODE, t)).collect();
        for theme in options.themes.keys() {
            entries.extend(tokens.themed(theme).map(|t| (theme.as_str(), t)));
        }

        for (mode, token) in entries {
            let Some((kind, value)) = figma_value(token, options.base_font_size) else {
                continue;
            };
            let path = token.variable_path();
            let Some((category, rest)) = path.split_first() else {
                continue;
            };
            let name = if rest.is_empty() {
                category.clone()
            } else {
                rest.join("/")
            };
            let variable = collections
                .entry(category.clone())
                .or_default()
                .entry(name.clone())
                .or_insert_with(|| FigmaVariable {
                    name,
                    kind,
                    description: token.description.clone().unwrap_or_default(),
                    values_by_mode: IndexMap::new(),
                });
            variable.values_by_mode.insert(mode.to_string(), value);
        }

        let document = FigmaDocument {
            collections: collections
                .into_iter()
                .map(|(name, variables)| FigmaCollection {
                    name,
                    modes: modes.clone(),
                    variables: variables
                        .into_values()
                        .map(|mut variable| {
                            fill_missing_modes(&mut variable, &modes);
                            variable
                        })
                        .collect(),
                })
                .collect(),
        };
        pretty_json(&document)
    }
}

/// A mode with no value of its own takes the default mode's value.
fn fill_missing_modes(variable: &mut FigmaVariable, modes: &[String]) {
    let fallback = variable
        .values_by_mode
        .get(DEFAULT_MODE)
        .or_else(|| variable.values_by_mode.values().next())
        .cloned();
    let Some(fallback) = fallback else {
        return;
    };
    let mut ordered = IndexMap::new();
    for mode in modes {
        let value = variable
            .values_by_mode
            .get(mode)
            .cloned()
            .unwrap_or_else(|| fallback.clone());
        ordered.insert(mode.clone(), value);
    }
    variable.values_by_mode = ordered;
}

/// Maps a token onto a Figma variable type and value. Composite types have
/// no Figma variable equivalent and are skipped.
fn figma_value(token: &ResolvedToken, base_font_size: f64) -> Option<(&'static str, Value)> {
    let value = &token.value;
    match token.token_type()? {
        TokenType::Color => Some(("COLOR", Value::String(value.as_str()?.to_string()))),
        TokenType::Dimension | TokenType::FontSize | TokenType::LineHeight | TokenType::Number => {
            match value {
                Value::Number(n) => Some(("FLOAT", Value::Number(n.clone()))),
                Value::String(s) => {
                    let px = s.parse::<Dimension>().ok()?.to_px(base_font_size)?;
                    Some(("FLOAT", float(px)?))
                }
                _ => None,
            }
        }
        TokenType::FontWeight => match value {
            Value::Number(n) => Some(("FLOAT", Value::Number(n.clone()))),
            Value::String(s) => match s.parse::<f64>() {
                Ok(weight) => Some(("FLOAT", float(weight)?)),
                Err(_) => Some(("STRING", value.clone())),
            },
            _ => None,
        },
        TokenType::FontFamily => match value {
            Value::Array(names) => Some((
                "STRING",
                Value::String(
                    names
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            )),
            Value::String(_) => Some(("STRING", value.clone())),
            _ => None,
        },
        TokenType::Duration | TokenType::String => match value {
            Value::String(_) => Some(("STRING", value.clone())),
            Value::Number(n) => Some(("FLOAT", Value::Number(n.clone()))),
            _ => None,
        },
        _ => None,
    }
}

fn float(value: f64) -> Option<Value> {
    Number::from_f64(value).map(Value::Number)
}
