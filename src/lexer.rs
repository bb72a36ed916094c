use serde_json::Value;

/// A piece of a token value string, as produced by the [`Lexer`].
#[derive(Debug, PartialEq, Clone)]
pub enum Fragment {
    /// Plain text between references.
    Literal(String),
    /// A `{path.to.token}` placeholder. The associated `String` is the dot-path
    /// with surrounding whitespace trimmed.
    Reference(String),
}

/// How a value string refers to other tokens.
#[derive(Debug, PartialEq, Clone)]
pub enum ValueExpr {
    /// No references at all.
    Literal,
    /// The whole string is exactly one reference, e.g. `"{color.white}"`.
    /// Resolves to the target's value, which may be a non-string.
    Simple(String),
    /// References mixed with text or with each other, e.g. `"{a} {b}"` or
    /// `"{space.sm}px"`. Always resolves to a string.
    Compound(Vec<Fragment>),
}

/// Splits a value string into literal and reference fragments.
///
/// A `{` without a matching `}` is kept as literal text, as is an empty
/// `{}` pair.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    pub fn lex(&mut self) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        let mut literal = String::new();

        while let Some(fragment) = self.next_fragment() {
            match fragment {
                Fragment::Literal(text) => literal.push_str(&text),
                reference @ Fragment::Reference(_) => {
                    if !literal.is_empty() {
                        fragments.push(Fragment::Literal(std::mem::take(&mut literal)));
                    }
                    fragments.push(reference);
                }
            }
        }
        if !literal.is_empty() {
            fragments.push(Fragment::Literal(literal));
        }
        fragments
    }

    fn next_fragment(&mut self) -> Option<Fragment> {
        let rest = &self.input[self.position..];
        if rest.is_empty() {
            return None;
        }

        if let Some(body) = rest.strip_prefix('{') {
            // The closing brace must come before any other opening brace.
            let close = body.find('}');
            let reopen = body.find('{');
            if let Some(close) = close {
                if reopen.map_or(true, |open| open > close) {
                    let path = body[..close].trim();
                    if !path.is_empty() {
                        self.position += close + 2;
                        return Some(Fragment::Reference(path.to_string()));
                    }
                }
            }
            self.position += 1;
            return Some(Fragment::Literal("{".to_string()));
        }

        let end = rest.find('{').unwrap_or(rest.len());
        self.position += end;
        Some(Fragment::Literal(rest[..end].to_string()))
    }
}

/// Classifies a value string by its references.
pub fn parse_expr(input: &str) -> ValueExpr {
    let fragments = Lexer::new(input).lex();
    let has_reference = fragments
        .iter()
        .any(|f| matches!(f, Fragment::Reference(_)));
    if !has_reference {
        return ValueExpr::Literal;
    }
    match fragments.as_slice() {
        [Fragment::Reference(path)] => ValueExpr::Simple(path.clone()),
        _ => ValueExpr::Compound(fragments),
    }
}

/// True if the string contains at least one `{...}` reference.
pub fn is_reference(input: &str) -> bool {
    !matches!(parse_expr(input), ValueExpr::Literal)
}

/// Every reference path in `value`, looking inside arrays and objects, in
/// order of appearance.
pub fn references(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_references(value, &mut found);
    found
}

fn collect_references(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for fragment in Lexer::new(s).lex() {
                if let Fragment::Reference(path) = fragment {
                    found.push(path);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, found)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_reference() {
        assert_eq!(parse_expr("{color.white}"), ValueExpr::Simple("color.white".into()));
        assert_eq!(parse_expr("{ color.white }"), ValueExpr::Simple("color.white".into()));
    }

    #[test]
    fn test_compound_reference() {
        assert_eq!(
            parse_expr("{spacing.sm} {spacing.md}"),
            ValueExpr::Compound(vec![
                Fragment::Reference("spacing.sm".into()),
                Fragment::Literal(" ".into()),
                Fragment::Reference("spacing.md".into()),
            ])
        );
        assert_eq!(
            parse_expr("{a}px"),
            ValueExpr::Compound(vec![
                Fragment::Reference("a".into()),
                Fragment::Literal("px".into()),
            ])
        );
    }

    #[test]
    fn test_literals_and_stray_braces() {
        assert_eq!(parse_expr("#ffffff"), ValueExpr::Literal);
        assert_eq!(parse_expr("{}"), ValueExpr::Literal);
        assert_eq!(parse_expr("{unterminated"), ValueExpr::Literal);
        assert_eq!(
            Lexer::new("{{a}").lex(),
            vec![Fragment::Literal("{".into()), Fragment::Reference("a".into())]
        );
    }

    #[test]
    fn test_references_in_composite_values() {
        let value = json!({
            "color": "{color.black}",
            "offsetX": "0",
            "blur": "{size.blur} ",
            "layers": ["{a}", 2]
        });
        assert_eq!(references(&value), vec!["color.black", "size.blur", "a"]);
    }
}
