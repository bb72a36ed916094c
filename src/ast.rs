use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// A node of a token tree: either a leaf token or a group of further nodes.
///
/// The distinction is made once, when the JSON is parsed: an object carrying a
/// `$value` is a token, every other object is a group.
#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Token(TokenData),
    Group(Group),
}

#[derive(Debug, PartialEq, Clone)]
pub struct TokenData {
    /// Key segments from the document root, e.g. `["color", "brand", "500"]`.
    pub path: Vec<String>,
    pub value: Value,
    /// The effective `$type`, either set on the token or inherited from a group.
    pub type_name: Option<String>,
    pub description: Option<String>,
    pub source: Arc<Path>,
    /// Set for tokens that come from a context-mapping file.
    pub context: bool,
}

impl TokenData {
    /// The dot-joined path, which is the token's primary key.
    pub fn name(&self) -> String {
        self.path.join(".")
    }

    pub fn token_type(&self) -> Option<TokenType> {
        self.type_name.as_deref().and_then(|t| t.parse().ok())
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Group {
    pub children: IndexMap<String, Node>,
    pub type_name: Option<String>,
    pub description: Option<String>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Deep-merges `other` into `self`. Groups merge key by key; anywhere else
    /// the node from `other` replaces what was there.
    pub fn merge_from(&mut self, other: &Group) {
        if other.type_name.is_some() {
            self.type_name.clone_from(&other.type_name);
        }
        if other.description.is_some() {
            self.description.clone_from(&other.description);
        }
        for (key, incoming) in &other.children {
            match (self.children.get_mut(key), incoming) {
                (Some(Node::Group(existing)), Node::Group(incoming)) => {
                    existing.merge_from(incoming);
                }
                (Some(existing), _) => {
                    if let (Node::Token(old), Node::Token(new)) = (&*existing, incoming) {
                        log::debug!(
                            "{} from {} overrides {}",
                            new.name(),
                            new.source.display(),
                            old.source.display()
                        );
                    } else {
                        log::warn!("`{key}` changes between token and group while merging");
                    }
                    *existing = incoming.clone();
                }
                (None, _) => {
                    self.children.insert(key.clone(), incoming.clone());
                }
            }
        }
    }

    /// Looks a token up by its dot-joined path.
    pub fn get(&self, dot_path: &str) -> Option<&TokenData> {
        let mut group = self;
        let mut segments = dot_path.split('.').peekable();
        while let Some(segment) = segments.next() {
            match group.children.get(segment)? {
                Node::Group(child) => group = child,
                Node::Token(token) if segments.peek().is_none() => return Some(token),
                Node::Token(_) => return None,
            }
        }
        None
    }
}

/// Visits every token under `group` in document order.
///
/// All tree walks go through here so metadata keys are handled the same way
/// everywhere; they never appear as children in the first place.
pub fn walk_tokens<'a, F>(group: &'a Group, visit: &mut F)
where
    F: FnMut(&'a TokenData),
{
    for node in group.children.values() {
        match node {
            Node::Token(token) => visit(token),
            Node::Group(child) => walk_tokens(child, visit),
        }
    }
}

/// Collects every token under `group` into a vector, in document order.
pub fn collect_tokens(group: &Group) -> Vec<&TokenData> {
    let mut tokens = Vec::new();
    walk_tokens(group, &mut |token| tokens.push(token));
    tokens
}

/// The `$type` values understood by the pipeline.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenType {
    Color,
    Dimension,
    FontFamily,
    FontWeight,
    FontSize,
    LineHeight,
    Duration,
    CubicBezier,
    Number,
    Shadow,
    Gradient,
    Typography,
    Border,
    Transition,
    String,
}

impl TokenType {
    pub const ALL: [TokenType; 15] = [
        TokenType::Color,
        TokenType::Dimension,
        TokenType::FontFamily,
        TokenType::FontWeight,
        TokenType::FontSize,
        TokenType::LineHeight,
        TokenType::Duration,
        TokenType::CubicBezier,
        TokenType::Number,
        TokenType::Shadow,
        TokenType::Gradient,
        TokenType::Typography,
        TokenType::Border,
        TokenType::Transition,
        TokenType::String,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Color => "color",
            TokenType::Dimension => "dimension",
            TokenType::FontFamily => "fontFamily",
            TokenType::FontWeight => "fontWeight",
            TokenType::FontSize => "fontSize",
            TokenType::LineHeight => "lineHeight",
            TokenType::Duration => "duration",
            TokenType::CubicBezier => "cubicBezier",
            TokenType::Number => "number",
            TokenType::Shadow => "shadow",
            TokenType::Gradient => "gradient",
            TokenType::Typography => "typography",
            TokenType::Border => "border",
            TokenType::Transition => "transition",
            TokenType::String => "string",
        }
    }
}

impl FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
