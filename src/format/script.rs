use super::{css_value, Format, FormatOptions, ResolvedSet, ResolvedToken, GENERATED_NOTICE};
use serde_json::Value;
use std::fmt::Write;

/// What the exported object maps each dot-path to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptValues {
    /// The resolved token value.
    Literal,
    /// A `var(--prefix-path)` string pointing at the CSS custom property.
    CssVariable,
}

/// `export const tokens = { ... } as const;` plus a `TokenName` union of
/// every key.
pub struct TypeScript {
    pub values: ScriptValues,
}

impl TypeScript {
    pub fn literal() -> Self {
        TypeScript {
            values: ScriptValues::Literal,
        }
    }

    pub fn css_variables() -> Self {
        TypeScript {
            values: ScriptValues::CssVariable,
        }
    }
}

impl Format for TypeScript {
    fn render(&self, tokens: &ResolvedSet, options: &FormatOptions) -> String {
        let mut out = format!("/**\n * {GENERATED_NOTICE}\n */\n\n");
        out.push_str("export const tokens = {\n");
        write_entries(&mut out, tokens, options, self.values);
        out.push_str("} as const;\n\n");
        out.push_str("export type TokenName = keyof typeof tokens;\n");
        out
    }
}

/// An ES module exporting the resolved token object.
pub struct JavaScript;

impl Format for JavaScript {
    fn render(&self, tokens: &ResolvedSet, options: &FormatOptions) -> String {
        let mut out = format!("/**\n * {GENERATED_NOTICE}\n */\n\n");
        out.push_str("export const tokens = {\n");
        write_entries(&mut out, tokens, options, ScriptValues::Literal);
        out.push_str("};\n\nexport default tokens;\n");
        out
    }
}

fn write_entries(out: &mut String, tokens: &ResolvedSet, options: &FormatOptions, values: ScriptValues) {
    for token in &tokens.tokens {
        let Some(value) = entry_value(token, options, values) else {
            continue;
        };
        let key = Value::String(token.name()).to_string();
        let _ = writeln!(out, "  {key}: {value},");
    }
}

fn entry_value(token: &ResolvedToken, options: &FormatOptions, values: ScriptValues) -> Option<String> {
    match values {
        ScriptValues::Literal => serde_json::to_string(&token.value).ok(),
        ScriptValues::CssVariable => {
            css_value(token, None)?;
            let var = format!("var({})", options.css_variable(token.variable_path()));
            Some(Value::String(var).to_string())
        }
    }
}
