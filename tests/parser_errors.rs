use miette::Diagnostic;
use tokens_core::error::{LoadError, ValidationError};
use tokens_core::parser::{parse_str, Parser};

fn parse_err(source: &str) -> LoadError {
    match parse_str(source, "test.json") {
        Ok(_) => panic!("Expected a LoadError, but got Ok"),
        Err(err) => err,
    }
}

#[test]
fn test_invalid_json() {
    let err = parse_err("{ \"color\": ");
    assert!(matches!(err, LoadError::Parse { .. }));
    assert!(err.to_string().contains("test.json"));
}

#[test]
fn test_trailing_comma_span() {
    let source = "{\n  \"a\": { \"$value\": 1, }\n}";
    match parse_err(source) {
        LoadError::Parse { span, message, .. } => {
            let line_start = source.find('\n').unwrap() + 1;
            assert!(span.offset() >= line_start, "{message}");
            assert!(span.offset() < source.len());
        }
        other => panic!("Expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_parse_error_has_source_code() {
    let err = parse_err("[1, 2,]");
    assert!(err.source_code().is_some());
    assert!(err.labels().is_some());
    assert_eq!(
        err.code().map(|c| c.to_string()),
        Some("load::parse".to_string())
    );
}

#[test]
fn test_root_must_be_an_object() {
    for source in ["[]", "\"color\"", "42", "null"] {
        let err = parse_err(source);
        assert!(
            matches!(err, LoadError::Structure { .. }),
            "{source} should be a structure error"
        );
    }
}

#[test]
fn test_empty_document_is_fine() {
    let file = parse_str("{}", "empty.json").unwrap();
    assert!(file.root.is_empty());
    assert!(file.issues.is_empty());
}

#[test]
fn test_token_with_children() {
    let file = parse_str(
        r#"{ "a": { "$value": 1, "$type": "number", "b": { "$value": 2 } } }"#,
        "t.json",
    )
    .unwrap();
    assert_eq!(file.issues.len(), 1);
    assert_eq!(file.issues[0].token_path(), Some("a"));
    assert!(file.root.get("a").is_some());
    assert!(file.root.get("a.b").is_none());
}

#[test]
fn test_type_without_value() {
    let file = parse_str(r#"{ "a": { "$type": "color" } }"#, "t.json").unwrap();
    assert!(matches!(
        &file.issues[..],
        [ValidationError::Structure { path: Some(path), .. }] if path == "a"
    ));
}

#[test]
fn test_scalar_children_are_issues() {
    let file = parse_str(r##"{ "color": { "white": "#fff", "black": 0 } }"##, "t.json").unwrap();
    assert_eq!(file.issues.len(), 2);
}

#[test]
fn test_non_string_type() {
    let file = parse_str(r#"{ "a": { "$value": 1, "$type": 7 } }"#, "t.json").unwrap();
    assert_eq!(file.issues.len(), 1);
    assert_eq!(file.root.get("a").unwrap().type_name, None);
}

#[test]
fn test_context_flag() {
    let file = Parser::new(r#"{ "a": { "$value": "@b" } }"#, "contexts/a.json")
        .context(true)
        .parse_document()
        .unwrap();
    assert!(file.context);
    assert!(file.root.get("a").unwrap().context);
}
