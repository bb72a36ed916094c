use pretty_assertions::assert_eq;
use serde_json::json;
use tokens_core::ast::{collect_tokens, TokenType};
use tokens_core::lexer::{parse_expr, references, Fragment, ValueExpr};
use tokens_core::parser::parse_str;
use tokens_core::store::SourceSet;
use tokens_core::utils::{dashed_name, Dimension};

#[test]
fn test_reference_forms() {
    assert_eq!(parse_expr("#fff"), ValueExpr::Literal);
    assert_eq!(parse_expr("{color.white}"), ValueExpr::Simple("color.white".into()));
    assert_eq!(
        parse_expr("{a} solid {b}"),
        ValueExpr::Compound(vec![
            Fragment::Reference("a".into()),
            Fragment::Literal(" solid ".into()),
            Fragment::Reference("b".into()),
        ])
    );
    assert_eq!(parse_expr("calc({} + 1px)"), ValueExpr::Literal);
}

#[test]
fn test_references_in_nested_values() {
    let value = json!({ "color": "{color.shadow}", "offsetX": ["{space.1}", "2px"] });
    assert_eq!(references(&value), vec!["color.shadow", "space.1"]);
}

#[test]
fn test_all_token_types_parse() {
    for token_type in TokenType::ALL {
        assert_eq!(token_type.as_str().parse::<TokenType>(), Ok(token_type));
    }
}

#[test]
fn test_merge_is_deep_and_keeps_order() {
    let sources = SourceSet::from_documents(&[
        ("a.json", r##"{ "color": { "$type": "color", "a": { "$value": "#111" }, "b": { "$value": "#222" } } }"##),
        ("b.json", r##"{ "color": { "$type": "color", "b": { "$value": "#333" }, "c": { "$value": "#444" } } }"##),
    ])
    .unwrap();
    let merged = sources.merged();
    let names: Vec<String> = collect_tokens(&merged).iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["color.a", "color.b", "color.c"]);
    assert_eq!(merged.get("color.b").unwrap().value, json!("#333"));
    assert_eq!(
        sources.files[0].root.get("color.b").unwrap().value,
        json!("#222")
    );
}

#[test]
fn test_metadata_keys_are_not_tokens() {
    let file = parse_str(
        r##"{ "$schema": "x", "color": { "$description": "d", "$extensions": {}, "red": { "$value": "#f00", "$type": "color" } } }"##,
        "t.json",
    )
    .unwrap();
    let tokens = collect_tokens(&file.root);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].path, vec!["color".to_string(), "red".to_string()]);
}

#[test]
fn test_variable_names() {
    assert_eq!(dashed_name("mantine", &["color", "primaryHover"]), "mantine-color-primary-hover");
    assert_eq!(dashed_name("", &["spacing", "md"]), "spacing-md");
}

#[test]
fn test_dimensions() {
    let rem: Dimension = "1.5rem".parse().unwrap();
    assert_eq!(rem.to_px(16.0), Some(24.0));
    assert_eq!(rem.to_string(), "1.5rem");
    assert!("wide".parse::<Dimension>().is_err());
}
