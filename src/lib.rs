pub mod api;
pub mod ast;
pub mod collision;
pub mod config;
pub mod error;
pub mod format;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod store;
pub mod utils;
pub mod validator;
pub mod watch;

pub use api::{analyze, analyze_documents, Analysis, BuildOptions, BuildTarget, Project, ProjectAnalysis};
pub use error::TokenError;
