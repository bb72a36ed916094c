//! Output formats.
//!
//! Every format renders the same [`ResolvedSet`], which is built once per
//! build from the merged token index:
//!
//! - [`Css`] and [`Scss`] write one variable per token
//! - [`TypeScript`] and [`JavaScript`] write an object keyed by dot-path
//! - [`Json`] writes the nested tree or a flat map
//! - [`Markdown`] writes one documentation table per top-level category
//! - [`Figma`] writes an importable variable-collection document

mod css;
mod figma;
mod json;
mod markdown;
mod script;

pub use css::{css_value, Css, Scss};
pub use figma::Figma;
pub use json::{Json, JsonShape};
pub use markdown::Markdown;
pub use script::{JavaScript, ScriptValues, TypeScript};

use crate::ast::TokenType;
use crate::config::BuildConfig;
use crate::error::ResolverError;
use crate::lexer::references;
use crate::resolver::{is_context_value, ContextResolver, Resolver};
use crate::store::TokenIndex;
use indexmap::IndexMap;
use serde_json::Value;

pub(crate) const GENERATED_NOTICE: &str =
    "Do not edit directly, this file was generated from design tokens.";

/// A token after reference resolution, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToken {
    pub path: Vec<String>,
    /// The theme subtree this token belongs to, if any.
    pub theme: Option<String>,
    pub value: Value,
    /// The value as written in the source, references intact.
    pub original: Value,
    pub type_name: Option<String>,
    pub description: Option<String>,
    /// References that could not be resolved and remain in `value`.
    pub unresolved: Vec<String>,
}

impl ResolvedToken {
    pub fn name(&self) -> String {
        self.path.join(".")
    }

    /// The path used for variable names: the theme segment is dropped so a
    /// themed token overrides the base variable of the same name.
    pub fn variable_path(&self) -> &[String] {
        match (&self.theme, self.path.first()) {
            (Some(theme), Some(first)) if theme == first => &self.path[1..],
            _ => &self.path,
        }
    }

    pub fn token_type(&self) -> Option<TokenType> {
        self.type_name.as_deref().and_then(|t| t.parse().ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSet {
    /// Every token in the merged tree, in document order.
    pub tokens: Vec<ResolvedToken>,
    /// Context tokens whose value differs under a theme, keyed by theme.
    pub mode_overrides: IndexMap<String, Vec<ResolvedToken>>,
}

impl ResolvedSet {
    pub fn base(&self) -> impl Iterator<Item = &ResolvedToken> {
        self.tokens.iter().filter(|t| t.theme.is_none())
    }

    /// Tokens written under `theme`'s selector: the theme subtree plus any
    /// context tokens that resolve differently in that mode.
    pub fn themed<'s>(&'s self, theme: &'s str) -> impl Iterator<Item = &'s ResolvedToken> {
        self.tokens
            .iter()
            .filter(move |t| t.theme.as_deref() == Some(theme))
            .chain(self.mode_overrides.get(theme).into_iter().flatten())
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedToken> {
        self.tokens.iter().find(|t| t.name() == name)
    }

    pub fn unresolved_count(&self) -> usize {
        self.tokens.iter().filter(|t| !t.unresolved.is_empty()).count()
    }
}

/// Resolves every token in `index`. Tokens whose first path segment is one
/// of `themes` are tagged with that theme.
///
/// Unresolvable references stay in the output and are logged; only a cycle
/// fails the resolution.
pub fn resolve_tokens(index: &TokenIndex, themes: &[String]) -> Result<ResolvedSet, ResolverError> {
    let mut resolver = Resolver::new(index);
    let base_context = ContextResolver::new(None);
    let mut set = ResolvedSet::default();

    for (name, token) in index.iter() {
        let mut value = resolver.resolve_value(&token.value)?;
        if token.context {
            value = base_context.resolve(&mut resolver, &value)?;
        }
        let mut unresolved = references(&value);
        if token.context && is_context_value(&value) {
            unresolved.extend(value.as_str().map(str::to_string));
        }
        if !unresolved.is_empty() {
            log::warn!("`{name}` has unresolved references: {}", unresolved.join(", "));
        }
        let theme = token
            .path
            .first()
            .filter(|first| token.path.len() > 1 && themes.contains(first))
            .cloned();
        set.tokens.push(ResolvedToken {
            path: token.path.clone(),
            theme,
            value,
            original: token.value.clone(),
            type_name: token.type_name.clone(),
            description: token.description.clone(),
            unresolved,
        });
    }

    for theme in themes {
        let context = ContextResolver::new(Some(theme.as_str()));
        let mut overrides = Vec::new();
        for base in set.tokens.iter().filter(|t| t.theme.is_none()) {
            let Some(token) = index.get(&base.name()) else {
                continue;
            };
            if !token.context {
                continue;
            }
            let raw = resolver.resolve_value(&token.value)?;
            let value = context.resolve(&mut resolver, &raw)?;
            if value != base.value {
                overrides.push(ResolvedToken {
                    theme: Some(theme.clone()),
                    value,
                    unresolved: Vec::new(),
                    ..base.clone()
                });
            }
        }
        if !overrides.is_empty() {
            set.mode_overrides.insert(theme.clone(), overrides);
        }
    }

    Ok(set)
}

/// Settings shared by the formats.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub prefix: String,
    pub selector: String,
    pub themes: IndexMap<String, String>,
    pub output_references: bool,
    pub base_font_size: f64,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions::from_config(&BuildConfig::default())
    }
}

impl FormatOptions {
    pub fn from_config(config: &BuildConfig) -> Self {
        FormatOptions {
            prefix: config.prefix.clone(),
            selector: config.selector.clone(),
            themes: config.themes.clone(),
            output_references: config.output_references,
            base_font_size: config.base_font_size,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// `--prefix-path-segments`
    pub fn css_variable<S: AsRef<str>>(&self, path: &[S]) -> String {
        format!("--{}", crate::utils::dashed_name(&self.prefix, path))
    }
}

/// Pretty-printed JSON with a trailing newline.
///
/// Only maps with non-string keys fail to serialize, and no output
/// document has one.
pub(crate) fn pretty_json<T: serde::Serialize>(document: &T) -> String {
    let mut out = serde_json::to_string_pretty(document).expect("output documents have string keys");
    out.push('\n');
    out
}

/// An output format.
pub trait Format {
    fn render(&self, tokens: &ResolvedSet, options: &FormatOptions) -> String;
}
