use miette::{Diagnostic, NamedSource, Severity, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum TokenError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Validation failed with {errors} error(s)")]
    #[diagnostic(
        code(tokens::validation_failed),
        help("Run `tokens validate` to list every issue, or pass --skip-validation to build anyway.")
    )]
    ValidationFailed { errors: usize },

    #[error("{conflicts} token path(s) are defined with conflicting values")]
    #[diagnostic(
        code(tokens::collision_failed),
        help("Run `tokens collisions` to see which source files disagree.")
    )]
    CollisionFailed { conflicts: usize },

    #[error("Another build is already writing to {}", path.display())]
    #[diagnostic(
        code(tokens::build_locked),
        help("Wait for the other build to finish. If none is running, delete the lock file.")
    )]
    BuildLocked { path: PathBuf },

    #[error("Failed to write {}", path.display())]
    #[diagnostic(code(tokens::write_failed))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File watcher error")]
    #[diagnostic(code(tokens::watch))]
    Watch(#[from] notify::Error),

    #[error("Failed to install the interrupt handler")]
    #[diagnostic(code(tokens::interrupt))]
    Interrupt(#[from] ctrlc::Error),
}

#[derive(Error, Debug, Diagnostic)]
pub enum LoadError {
    #[error("Invalid JSON in {}: {message}", path.display())]
    #[diagnostic(
        code(load::parse),
        help("Token source files must be valid JSON documents.")
    )]
    Parse {
        path: PathBuf,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
    },

    #[error("{}: {message}", path.display())]
    #[diagnostic(
        code(load::structure),
        help("The root of a token file must be a JSON object of groups and tokens.")
    )]
    Structure { path: PathBuf, message: String },

    #[error("Failed to read {}", path.display())]
    #[diagnostic(code(load::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid source pattern `{pattern}`")]
    #[diagnostic(code(load::pattern))]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ResolverError {
    #[error("Circular reference: {}", chain.join(" -> "))]
    #[diagnostic(
        code(resolver::circular_reference),
        help("A token cannot reference itself, directly or through other tokens.")
    )]
    CircularReference { chain: Vec<String> },

    #[error("Unknown token `{path}`")]
    #[diagnostic(code(resolver::unknown_token))]
    UnknownToken { path: String },
}

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {}", path.display())]
    #[diagnostic(code(config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}", path.display())]
    #[diagnostic(
        code(config::parse),
        help("Config files are JSON objects with camelCase keys.")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single issue found while checking token sources.
///
/// Issues are accumulated rather than returned early, so one run reports the
/// complete set. Severity comes from the diagnostic: everything is an error
/// except [`ValidationError::ExternalReference`].
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{file}: {message}")]
    #[diagnostic(code(validate::structure))]
    Structure {
        file: String,
        path: Option<String>,
        message: String,
    },

    #[error("Token `{path}` has a $value but no $type ({file})")]
    #[diagnostic(
        code(validate::missing_type),
        help("Add a \"$type\" to the token or to one of its groups.")
    )]
    MissingType { path: String, file: String },

    #[error("Token `{path}` has unknown $type `{type_name}` ({file})")]
    #[diagnostic(code(validate::unknown_type))]
    UnknownType {
        path: String,
        file: String,
        type_name: String,
    },

    #[error("Token `{path}` has an invalid {type_name} value `{value}` ({file})")]
    #[diagnostic(code(validate::invalid_literal))]
    InvalidLiteral {
        path: String,
        file: String,
        type_name: String,
        value: String,
    },

    #[error("Token `{path}` references `{target}`, which does not exist ({file})")]
    #[diagnostic(code(validate::broken_reference))]
    BrokenReference {
        path: String,
        file: String,
        target: String,
    },

    #[error("Token `{path}` references `{target}`, which is not defined in these sources ({file})")]
    #[diagnostic(
        code(validate::external_reference),
        severity(Warning),
        help("Assumed to be provided by another collection or resolved downstream.")
    )]
    ExternalReference {
        path: String,
        file: String,
        target: String,
    },

    #[error("Circular reference: {}", chain.join(" -> "))]
    #[diagnostic(code(validate::circular_reference))]
    CircularReference { chain: Vec<String> },

    #[error("Token `{path}` is defined with conflicting values in {}", files.join(", "))]
    #[diagnostic(code(validate::value_conflict))]
    ValueConflict { path: String, files: Vec<String> },
}

impl ValidationError {
    pub fn is_error(&self) -> bool {
        !matches!(
            self.severity(),
            Some(Severity::Warning) | Some(Severity::Advice)
        )
    }

    /// The dot-path the issue is about, if it concerns a single token.
    pub fn token_path(&self) -> Option<&str> {
        match self {
            ValidationError::Structure { path, .. } => path.as_deref(),
            ValidationError::MissingType { path, .. }
            | ValidationError::UnknownType { path, .. }
            | ValidationError::InvalidLiteral { path, .. }
            | ValidationError::BrokenReference { path, .. }
            | ValidationError::ExternalReference { path, .. }
            | ValidationError::ValueConflict { path, .. } => Some(path),
            ValidationError::CircularReference { chain } => chain.first().map(String::as_str),
        }
    }
}
