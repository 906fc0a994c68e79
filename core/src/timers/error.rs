//! Error types for timer definition loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors during timer definition loading
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read timer definitions from {}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse timer TOML in {}", path.display())]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read timer directory {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid timer definition '{id}' in {}: {reason}", path.display())]
    InvalidDefinition {
        path: PathBuf,
        id: String,
        reason: String,
    },
}
