use crate::error::ResolverError;
use crate::lexer::{parse_expr, references, Fragment, ValueExpr};
use crate::store::TokenIndex;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Resolves `{path}` references against a [`TokenIndex`].
///
/// Resolved values are memoized per token path. The cache lives as long as
/// the resolver; call [`Resolver::invalidate`] after the index changes.
pub struct Resolver<'a> {
    index: &'a TokenIndex,
    // Resolved values by token path
    cache: HashMap<String, Value>,
    // Paths currently being resolved, to detect cycles
    resolving_stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a TokenIndex) -> Self {
        Resolver {
            index,
            cache: HashMap::new(),
            resolving_stack: Vec::new(),
        }
    }

    pub fn index(&self) -> &'a TokenIndex {
        self.index
    }

    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Fully resolves the token at `path`.
    pub fn resolve_path(&mut self, path: &str) -> Result<Value, ResolverError> {
        if let Some(value) = self.cache.get(path) {
            return Ok(value.clone());
        }
        if let Some(start) = self.resolving_stack.iter().position(|p| p == path) {
            let mut chain = self.resolving_stack[start..].to_vec();
            chain.push(path.to_string());
            return Err(ResolverError::CircularReference { chain });
        }
        let token = self
            .index
            .get(path)
            .ok_or_else(|| ResolverError::UnknownToken {
                path: path.to_string(),
            })?;

        self.resolving_stack.push(path.to_string());
        let resolved = self.resolve_value(&token.value);
        self.resolving_stack.pop();

        let resolved = resolved?;
        self.cache.insert(path.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// Resolves every reference inside `value`, including inside arrays and
    /// composite objects.
    ///
    /// A simple reference takes on the target's value as-is, whatever its
    /// JSON type. A compound reference always yields a string. References to
    /// unknown tokens are left in place as `{path}` text.
    pub fn resolve_value(&mut self, value: &Value) -> Result<Value, ResolverError> {
        match value {
            Value::String(s) => match parse_expr(s) {
                ValueExpr::Literal => Ok(value.clone()),
                ValueExpr::Simple(path) => {
                    if self.index.contains(&path) {
                        self.resolve_path(&path)
                    } else {
                        Ok(value.clone())
                    }
                }
                ValueExpr::Compound(fragments) => {
                    let mut out = String::new();
                    for fragment in fragments {
                        match fragment {
                            Fragment::Literal(text) => out.push_str(&text),
                            Fragment::Reference(path) if self.index.contains(&path) => {
                                let resolved = self.resolve_path(&path)?;
                                out.push_str(&value_to_text(&resolved));
                            }
                            Fragment::Reference(path) => {
                                out.push('{');
                                out.push_str(&path);
                                out.push('}');
                            }
                        }
                    }
                    Ok(Value::String(out))
                }
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut resolved = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    resolved.insert(key.clone(), self.resolve_value(item)?);
                }
                Ok(Value::Object(resolved))
            }
            _ => Ok(value.clone()),
        }
    }
}

/// Text form of a resolved value, as substituted into compound references.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Finds every reference cycle in the index without resolving anything.
///
/// This walks the whole reference graph, so cycles are found even among
/// tokens that no output format ends up reading. Each cycle is reported once,
/// rotated to start at its smallest path, e.g. `["a", "b", "a"]`.
pub fn find_cycles(index: &TokenIndex) -> Vec<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        path: &str,
        index: &TokenIndex,
        marks: &mut HashMap<String, Mark>,
        stack: &mut Vec<String>,
        cycles: &mut BTreeSet<Vec<String>>,
    ) {
        match marks.get(path) {
            Some(Mark::Done) => return,
            Some(Mark::Visiting) => {
                if let Some(start) = stack.iter().position(|p| p == path) {
                    cycles.insert(canonical_cycle(&stack[start..]));
                }
                return;
            }
            None => {}
        }
        let Some(token) = index.get(path) else {
            return;
        };
        marks.insert(path.to_string(), Mark::Visiting);
        stack.push(path.to_string());
        for target in references(&token.value) {
            if index.contains(&target) {
                visit(&target, index, marks, stack, cycles);
            }
        }
        stack.pop();
        marks.insert(path.to_string(), Mark::Done);
    }

    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    let mut cycles = BTreeSet::new();
    for (path, _) in index.iter() {
        visit(path, index, &mut marks, &mut stack, &mut cycles);
    }
    cycles.into_iter().collect()
}

fn canonical_cycle(members: &[String]) -> Vec<String> {
    let start = members
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map_or(0, |(i, _)| i);
    let mut chain: Vec<String> = members[start..]
        .iter()
        .chain(members[..start].iter())
        .cloned()
        .collect();
    if let Some(first) = chain.first().cloned() {
        chain.push(first);
    }
    chain
}

/// The second resolution pass, for `@path` values in context-mapping files.
///
/// Under an active mode `m`, `@a.b` resolves to the token `m.a.b` when it
/// exists and to `a.b` otherwise. Anything that does not resolve is returned
/// unchanged.
pub struct ContextResolver<'m> {
    mode: Option<&'m str>,
}

impl<'m> ContextResolver<'m> {
    pub fn new(mode: Option<&'m str>) -> Self {
        Self { mode }
    }

    pub fn resolve(
        &self,
        resolver: &mut Resolver<'_>,
        value: &Value,
    ) -> Result<Value, ResolverError> {
        let Some(target) = value.as_str().and_then(|s| s.strip_prefix('@')) else {
            return Ok(value.clone());
        };
        let index = resolver.index();
        let candidates = self
            .mode
            .map(|mode| format!("{mode}.{target}"))
            .into_iter()
            .chain(std::iter::once(target.to_string()));
        for candidate in candidates {
            if index.contains(&candidate) {
                return resolver.resolve_path(&candidate);
            }
        }
        Ok(value.clone())
    }
}

/// True for an unresolved `@path` context value.
pub fn is_context_value(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.starts_with('@'))
}
