use crate::ast::{walk_tokens, Group, TokenData};
use crate::error::{LoadError, ValidationError};
use crate::parser::{Parser, SourceFile};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// The token source files of one build, in merge order.
#[derive(Debug, Default, Clone)]
pub struct SourceSet {
    pub files: Vec<SourceFile>,
    /// Files that could be read but were not usable token documents.
    pub issues: Vec<ValidationError>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `paths` in order, going through `cache`.
    ///
    /// A file whose root is not an object is recorded as an issue and skipped,
    /// so one bad file does not hide problems in the others. Unreadable files
    /// and malformed JSON abort the load.
    pub fn load(
        paths: &[PathBuf],
        cache: &mut SourceCache,
        contexts_dir: &str,
    ) -> Result<Self, LoadError> {
        let mut set = SourceSet::new();
        for path in paths {
            match cache.load(path, contexts_dir) {
                Ok(file) => set.files.push(file.clone()),
                Err(LoadError::Structure { path, message }) => {
                    set.issues.push(ValidationError::Structure {
                        file: path.display().to_string(),
                        path: None,
                        message,
                    });
                }
                Err(err) => return Err(err),
            }
        }
        log::debug!("loaded {} token file(s)", set.files.len());
        Ok(set)
    }

    /// Builds a set from in-memory documents given as `(name, json)` pairs.
    /// Names containing a `contexts` component are treated as context files.
    pub fn from_documents<S: AsRef<str>>(documents: &[(S, S)]) -> Result<Self, LoadError> {
        let mut set = SourceSet::new();
        for (name, text) in documents {
            let name = name.as_ref();
            let parsed = Parser::new(text.as_ref(), name)
                .context(is_context_path(Path::new(name), "contexts"))
                .parse_document();
            match parsed {
                Ok(file) => set.files.push(file),
                Err(LoadError::Structure { path, message }) => {
                    set.issues.push(ValidationError::Structure {
                        file: path.display().to_string(),
                        path: None,
                        message,
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(set)
    }

    /// Every structure issue found while loading and parsing.
    pub fn structure_issues(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues
            .iter()
            .chain(self.files.iter().flat_map(|f| f.issues.iter()))
    }

    /// Deep-merges every file into one tree; later files win. The per-file
    /// trees are left untouched.
    pub fn merged(&self) -> Group {
        let mut tree = Group::new();
        for file in &self.files {
            tree.merge_from(&file.root);
        }
        tree
    }
}

pub fn is_context_path(path: &Path, contexts_dir: &str) -> bool {
    path.components()
        .any(|c| c.as_os_str().to_str() == Some(contexts_dir))
}

/// Parsed source files keyed by path.
///
/// Entries stay valid until [`SourceCache::invalidate`] is called for their
/// path, which the watcher does for every changed file.
#[derive(Debug, Default)]
pub struct SourceCache {
    files: HashMap<PathBuf, SourceFile>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path, contexts_dir: &str) -> Result<&SourceFile, LoadError> {
        if !self.files.contains_key(path) {
            let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let file = Parser::new(&text, path)
                .context(is_context_path(path, contexts_dir))
                .parse_document()?;
            self.files.insert(path.to_path_buf(), file);
        }
        self.files.get(path).ok_or_else(|| LoadError::Read {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }

    pub fn invalidate(&mut self, path: &Path) {
        if self.files.remove(path).is_some() {
            log::debug!("invalidated {}", path.display());
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Flat lookup from dot-path to token, in document order.
#[derive(Debug, Default, Clone)]
pub struct TokenIndex {
    tokens: IndexMap<String, TokenData>,
}

impl TokenIndex {
    pub fn from_group(group: &Group) -> Self {
        let mut tokens = IndexMap::new();
        walk_tokens(group, &mut |token: &TokenData| {
            tokens.insert(token.name(), token.clone());
        });
        Self { tokens }
    }

    pub fn get(&self, path: &str) -> Option<&TokenData> {
        self.tokens.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.tokens.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenData)> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Expands glob patterns relative to `root` into a sorted, de-duplicated
/// file list, leaving out anything under `exclude`.
pub fn expand_patterns(
    root: &Path,
    patterns: &[String],
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>, LoadError> {
    let mut found = BTreeSet::new();
    for pattern in patterns {
        let full = root.join(pattern);
        let full = full.to_string_lossy();
        let entries = glob::glob(&full).map_err(|source| LoadError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    if exclude.is_some_and(|ex| path.starts_with(ex)) {
                        continue;
                    }
                    found.insert(path);
                }
                Ok(_) => {}
                Err(err) => log::warn!("skipping unreadable path: {err}"),
            }
        }
    }
    Ok(found.into_iter().collect())
}
