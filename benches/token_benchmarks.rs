use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokens_core::analyze_documents;
use tokens_core::format::{resolve_tokens, Css, Figma, Format, FormatOptions, Json, TypeScript};
use tokens_core::lexer::Lexer;
use tokens_core::parser::parse_str;

// ============================================================================
// Test Data
// ============================================================================

const COLORS: &str = r##"{
    "color": {
        "$type": "color",
        "white": { "$value": "#ffffff" },
        "black": { "$value": "#000000" },
        "primary": { "$value": "{color.blue.6}" },
        "blue": {
            "6": { "$value": "#228be6" },
            "7": { "$value": "#1c7ed6" }
        }
    },
    "dark": {
        "color": { "$type": "color", "white": { "$value": "#1a1b1e" } }
    }
}"##;

/// A palette of `shades` colors per hue plus a chain of aliases onto it.
fn generate_tokens(shades: usize) -> String {
    let hues = ["red", "green", "blue", "gray", "violet"];
    let mut color = serde_json::Map::new();
    color.insert("$type".into(), "color".into());
    for hue in hues {
        let mut scale = serde_json::Map::new();
        for shade in 0..shades {
            let value = format!("#{:02x}{:02x}{:02x}", shade % 256, (shade * 7) % 256, (shade * 13) % 256);
            scale.insert(shade.to_string(), serde_json::json!({ "$value": value }));
        }
        color.insert(hue.into(), scale.into());
    }
    let mut alias = serde_json::Map::new();
    alias.insert("$type".into(), "color".into());
    for shade in 0..shades {
        let hue = hues[shade % hues.len()];
        alias.insert(
            format!("a{shade}"),
            serde_json::json!({ "$value": format!("{{color.{hue}.{shade}}}") }),
        );
    }
    serde_json::json!({ "color": color, "alias": alias }).to_string()
}

// ============================================================================
// Lexer and Parser
// ============================================================================

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    for input in ["#ffffff", "{color.white}", "{space.sm} {space.md} solid {color.border}"] {
        group.bench_with_input(BenchmarkId::from_parameter(input), input, |b, src| {
            b.iter(|| Lexer::new(black_box(src)).lex())
        });
    }
    group.finish();
}

fn bench_parser_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_scaling");
    for shades in [10, 100, 1000] {
        let source = generate_tokens(shades);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(shades), &source, |b, src| {
            b.iter(|| parse_str(black_box(src), "bench.json"))
        });
    }
    group.finish();
}

// ============================================================================
// Analysis and Resolution
// ============================================================================

fn bench_analysis_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis_scaling");
    for shades in [10, 100, 1000] {
        let source = generate_tokens(shades);
        group.throughput(Throughput::Elements((shades * 6) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(shades), &source, |b, src| {
            b.iter(|| analyze_documents(&[("bench.json", black_box(src.as_str()))]))
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_tokens");
    let themes = vec!["dark".to_string()];
    for shades in [10, 100, 1000] {
        let source = generate_tokens(shades);
        let analysis = match analyze_documents(&[("bench.json", source.as_str())]) {
            Ok(analysis) => analysis,
            Err(err) => panic!("{err}"),
        };
        group.bench_with_input(BenchmarkId::from_parameter(shades), &analysis, |b, analysis| {
            b.iter(|| resolve_tokens(black_box(&analysis.index), &themes))
        });
    }
    group.finish();
}

// ============================================================================
// Formats
// ============================================================================

fn bench_formats(c: &mut Criterion) {
    let mut group = c.benchmark_group("formats");
    let source = generate_tokens(100);
    let mut documents = vec![("bench.json", source.as_str())];
    documents.push(("colors.json", COLORS));
    let analysis = match analyze_documents(&documents) {
        Ok(analysis) => analysis,
        Err(err) => panic!("{err}"),
    };
    let set = match analysis.resolve(&["dark".to_string()]) {
        Ok(set) => set,
        Err(err) => panic!("{err}"),
    };
    let options = FormatOptions::default();

    let formats: [(&str, Box<dyn Format>); 4] = [
        ("css", Box::new(Css)),
        ("typescript", Box::new(TypeScript::literal())),
        ("json", Box::new(Json::nested())),
        ("figma", Box::new(Figma)),
    ];
    for (name, format) in &formats {
        group.bench_function(*name, |b| b.iter(|| format.render(black_box(&set), &options)));
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_lexer,
    bench_parser_scaling,
    bench_analysis_scaling,
    bench_resolve,
    bench_formats
);
criterion_main!(benches);
