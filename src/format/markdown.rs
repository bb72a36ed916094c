use super::{css_value, Format, FormatOptions, ResolvedSet, ResolvedToken, GENERATED_NOTICE};
use indexmap::IndexMap;
use std::fmt::Write;

/// Token documentation: one table per top-level category.
pub struct Markdown;

impl Format for Markdown {
    fn render(&self, tokens: &ResolvedSet, options: &FormatOptions) -> String {
        let mut categories: IndexMap<&str, Vec<&ResolvedToken>> = IndexMap::new();
        for token in &tokens.tokens {
            let category = token.path.first().map_or("", String::as_str);
            categories.entry(category).or_default().push(token);
        }

        let mut out = format!("# Design Tokens\n\n> {GENERATED_NOTICE}\n");
        for (category, tokens) in categories {
            let _ = writeln!(out, "\n## {category}\n");
            out.push_str("| Token | Value | CSS Variable | Description |\n");
            out.push_str("| --- | --- | --- | --- |\n");
            for token in tokens {
                let value = css_value(token, None).unwrap_or_else(|| token.value.to_string());
                let _ = writeln!(
                    out,
                    "| `{}` | `{}` | `{}` | {} |",
                    escape(&token.name()),
                    escape(&value),
                    options.css_variable(token.variable_path()),
                    escape(token.description.as_deref().unwrap_or(""))
                );
            }
        }
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
