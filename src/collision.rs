use crate::ast::walk_tokens;
use crate::error::ValidationError;
use crate::store::SourceSet;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One file's definition of a colliding path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionEntry {
    pub value: Value,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub source_file: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionKind {
    /// Every file agrees on the value. Informational.
    SameValue,
    /// The files disagree. Fails the collision check.
    ValueConflict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collision {
    pub path: String,
    pub kind: CollisionKind,
    pub entries: Vec<CollisionEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollisionReport {
    /// Sorted by path.
    pub collisions: Vec<Collision>,
}

impl CollisionReport {
    pub fn conflicts(&self) -> impl Iterator<Item = &Collision> {
        self.collisions
            .iter()
            .filter(|c| c.kind == CollisionKind::ValueConflict)
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts().count()
    }

    pub fn has_conflicts(&self) -> bool {
        self.conflicts().next().is_some()
    }

    pub fn get(&self, path: &str) -> Option<&Collision> {
        self.collisions.iter().find(|c| c.path == path)
    }

    /// The value conflicts as validation errors, for the validation gate.
    pub fn to_issues(&self) -> Vec<ValidationError> {
        self.conflicts()
            .map(|c| ValidationError::ValueConflict {
                path: c.path.clone(),
                files: c.entries.iter().map(|e| e.source_file.clone()).collect(),
            })
            .collect()
    }
}

/// Finds token paths defined in more than one source file.
///
/// Only exact full paths count: two files adding different tokens to a
/// shared group do not collide.
pub fn detect_collisions(sources: &SourceSet) -> CollisionReport {
    let mut by_path: BTreeMap<String, Vec<CollisionEntry>> = BTreeMap::new();

    for file in &sources.files {
        let source_file = file.display_name();
        walk_tokens(&file.root, &mut |token| {
            by_path
                .entry(token.name())
                .or_default()
                .push(CollisionEntry {
                    value: token.value.clone(),
                    type_name: token.type_name.clone(),
                    source_file: source_file.clone(),
                    description: token.description.clone(),
                });
        });
    }

    let collisions: Vec<Collision> = by_path
        .into_iter()
        .filter(|(_, entries)| entries.len() > 1)
        .map(|(path, entries)| {
            let first = &entries[0].value;
            let kind = if entries.iter().all(|e| &e.value == first) {
                CollisionKind::SameValue
            } else {
                CollisionKind::ValueConflict
            };
            match kind {
                CollisionKind::SameValue => {
                    log::info!("`{path}` is defined {} times with the same value", entries.len())
                }
                CollisionKind::ValueConflict => {
                    log::warn!("`{path}` is defined with different values in {} files", entries.len())
                }
            }
            Collision {
                path,
                kind,
                entries,
            }
        })
        .collect();

    CollisionReport { collisions }
}
