use super::{pretty_json, Format, FormatOptions, ResolvedSet};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    /// The source tree shape, each token reduced to `{ "$value", "$type" }`.
    Nested,
    /// Dot-joined paths to resolved values.
    Flat,
}

pub struct Json {
    pub shape: JsonShape,
}

impl Json {
    pub fn nested() -> Self {
        Json {
            shape: JsonShape::Nested,
        }
    }

    pub fn flat() -> Self {
        Json {
            shape: JsonShape::Flat,
        }
    }

    pub fn to_value(&self, tokens: &ResolvedSet) -> Value {
        let mut root = Map::new();
        for token in &tokens.tokens {
            match self.shape {
                JsonShape::Flat => {
                    root.insert(token.name(), token.value.clone());
                }
                JsonShape::Nested => {
                    let mut leaf = Map::new();
                    leaf.insert("$value".to_string(), token.value.clone());
                    if let Some(type_name) = &token.type_name {
                        leaf.insert("$type".to_string(), Value::String(type_name.clone()));
                    }
                    insert_at(&mut root, &token.path, Value::Object(leaf));
                }
            }
        }
        Value::Object(root)
    }
}

fn insert_at(map: &mut Map<String, Value>, path: &[String], leaf: Value) {
    let Some((last, groups)) = path.split_last() else {
        return;
    };
    let mut current = map;
    for segment in groups {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), leaf);
}

impl Format for Json {
    fn render(&self, tokens: &ResolvedSet, _options: &FormatOptions) -> String {
        pretty_json(&self.to_value(tokens))
    }
}
