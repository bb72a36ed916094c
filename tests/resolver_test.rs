use miette::Report;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokens_core::error::ResolverError;
use tokens_core::format::ResolvedSet;
use tokens_core::resolver::{ContextResolver, Resolver};
use tokens_core::store::TokenIndex;
use tokens_core::{analyze_documents, Analysis};

fn analyze_ok(documents: &[(&str, &str)]) -> Analysis {
    match analyze_documents(documents) {
        Ok(analysis) => analysis,
        Err(err) => panic!("{:?}", Report::new(err)),
    }
}

fn resolve_ok(source: &str) -> ResolvedSet {
    let analysis = analyze_ok(&[("tokens.json", source)]);
    match analysis.resolve(&["dark".to_string()]) {
        Ok(set) => set,
        Err(err) => panic!("{:?}", Report::new(err)),
    }
}

fn resolve_err(source: &str) -> ResolverError {
    let analysis = analyze_ok(&[("tokens.json", source)]);
    match analysis.resolve(&[]) {
        Ok(_) => panic!("Expected a ResolverError, but got Ok"),
        Err(err) => err,
    }
}

#[test]
fn test_reference_chain_resolves_to_final_value() {
    let set = resolve_ok(
        r#"{
            "a": { "$value": "{b}", "$type": "dimension" },
            "b": { "$value": "{c}", "$type": "dimension" },
            "c": { "$value": "1rem", "$type": "dimension" }
        }"#,
    );
    assert_eq!(set.get("a").unwrap().value, json!("1rem"));
    assert_eq!(set.get("b").unwrap().value, json!("1rem"));
    assert_eq!(set.get("a").unwrap().original, json!("{b}"));
    assert_eq!(set.unresolved_count(), 0);
}

#[test]
fn test_self_reference_is_a_cycle() {
    let err = resolve_err(r#"{ "d": { "$value": "{d}", "$type": "dimension" } }"#);
    assert_eq!(
        err,
        ResolverError::CircularReference {
            chain: vec!["d".to_string(), "d".to_string()]
        }
    );
}

#[test]
fn test_two_token_cycle_names_both() {
    let err = resolve_err(
        r#"{
            "x": { "$value": "{y}", "$type": "color" },
            "y": { "$value": "{x}", "$type": "color" }
        }"#,
    );
    let ResolverError::CircularReference { chain } = err else {
        panic!("Expected a circular reference");
    };
    assert!(chain.contains(&"x".to_string()));
    assert!(chain.contains(&"y".to_string()));
    assert_eq!(chain.first(), chain.last());
}

#[test]
fn test_compound_reference_substitutes_text() {
    let set = resolve_ok(
        r#"{
            "spacing": {
                "$type": "dimension",
                "sm": { "$value": "8px" },
                "md": { "$value": "16px" },
                "pair": { "$value": "{spacing.sm} {spacing.md}" }
            }
        }"#,
    );
    assert_eq!(set.get("spacing.pair").unwrap().value, json!("8px 16px"));
}

#[test]
fn test_simple_reference_keeps_target_type() {
    let set = resolve_ok(
        r#"{
            "weight": { "$type": "fontWeight", "base": { "$value": 600 }, "strong": { "$value": "{weight.base}" } },
            "family": { "$type": "fontFamily", "base": { "$value": ["Inter", "sans-serif"] }, "body": { "$value": "{family.base}" } }
        }"#,
    );
    assert_eq!(set.get("weight.strong").unwrap().value, json!(600));
    assert_eq!(set.get("family.body").unwrap().value, json!(["Inter", "sans-serif"]));
}

#[test]
fn test_unresolved_reference_is_kept_verbatim() {
    let set = resolve_ok(
        r#"{
            "color": {
                "$type": "color",
                "link": { "$value": "{palette.blue}" },
                "mixed": { "$value": "solid {palette.gray}" }
            }
        }"#,
    );
    let link = set.get("color.link").unwrap();
    assert_eq!(link.value, json!("{palette.blue}"));
    assert_eq!(link.unresolved, vec!["palette.blue".to_string()]);
    assert_eq!(set.get("color.mixed").unwrap().value, json!("solid {palette.gray}"));
    assert_eq!(set.unresolved_count(), 2);
}

#[test]
fn test_references_inside_composite_values() {
    let set = resolve_ok(
        r##"{
            "color": { "shadow": { "$value": "#00000033", "$type": "color" } },
            "shadow": {
                "card": {
                    "$type": "shadow",
                    "$value": [
                        { "offsetX": "0", "offsetY": "1px", "blur": "2px", "color": "{color.shadow}" }
                    ]
                }
            }
        }"##,
    );
    assert_eq!(
        set.get("shadow.card").unwrap().value,
        json!([{ "offsetX": "0", "offsetY": "1px", "blur": "2px", "color": "#00000033" }])
    );
}

#[test]
fn test_later_document_wins() {
    let analysis = analyze_ok(&[
        ("base.json", r##"{ "color": { "bg": { "$value": "#fff", "$type": "color" } } }"##),
        ("override.json", r##"{ "color": { "bg": { "$value": "#f8f9fa", "$type": "color" } } }"##),
    ]);
    let set = analysis.resolve(&[]).unwrap();
    assert_eq!(set.get("color.bg").unwrap().value, json!("#f8f9fa"));
}

#[test]
fn test_resolver_caches_across_calls() {
    let analysis = analyze_ok(&[(
        "tokens.json",
        r#"{ "a": { "$value": "{b}", "$type": "number" }, "b": { "$value": 2, "$type": "number" } }"#,
    )]);
    let index = TokenIndex::from_group(&analysis.tree);
    let mut resolver = Resolver::new(&index);
    assert_eq!(resolver.resolve_path("a").unwrap(), json!(2));
    assert_eq!(resolver.resolve_value(&json!("{a}")).unwrap(), json!(2));
    resolver.invalidate();
    assert_eq!(
        resolver.resolve_path("missing"),
        Err(ResolverError::UnknownToken {
            path: "missing".to_string()
        })
    );
}

#[test]
fn test_context_value_prefers_mode_token() {
    let analysis = analyze_ok(&[(
        "tokens.json",
        r##"{
            "color": { "$type": "color", "bg": { "$value": "#fff" }, "fg": { "$value": "#000" } },
            "dark": { "color": { "$type": "color", "bg": { "$value": "#1a1b1e" } } }
        }"##,
    )]);
    let mut resolver = Resolver::new(&analysis.index);
    let dark = ContextResolver::new(Some("dark"));
    let base = ContextResolver::new(None);

    assert_eq!(dark.resolve(&mut resolver, &json!("@color.bg")).unwrap(), json!("#1a1b1e"));
    assert_eq!(dark.resolve(&mut resolver, &json!("@color.fg")).unwrap(), json!("#000"));
    assert_eq!(base.resolve(&mut resolver, &json!("@color.bg")).unwrap(), json!("#fff"));
    assert_eq!(base.resolve(&mut resolver, &json!("@color.none")).unwrap(), json!("@color.none"));
    assert_eq!(base.resolve(&mut resolver, &json!("#123456")).unwrap(), json!("#123456"));
}

#[test]
fn test_context_tokens_get_mode_overrides() {
    let analysis = analyze_ok(&[
        (
            "tokens/colors.json",
            r##"{
                "color": { "$type": "color", "bg": { "$value": "#fff" }, "primary": { "$value": "#228be6" } },
                "dark": { "color": { "$type": "color", "bg": { "$value": "#1a1b1e" } } }
            }"##,
        ),
        (
            "tokens/contexts/card.json",
            r#"{ "card": { "bg": { "$value": "@color.bg" }, "accent": { "$value": "@color.primary" } } }"#,
        ),
    ]);
    let set = analysis.resolve(&["dark".to_string()]).unwrap();

    assert_eq!(set.get("card.bg").unwrap().value, json!("#fff"));
    let overrides = &set.mode_overrides["dark"];
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].name(), "card.bg");
    assert_eq!(overrides[0].value, json!("#1a1b1e"));
}
