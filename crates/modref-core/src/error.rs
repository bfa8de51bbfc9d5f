use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout modref-core.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Core error type for modref operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid restricted module pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Assignment to a stub standing in for a client module.
    #[error(
        "Cannot assign to \"{property}\" on a client module reference ({location}). \
         Client module references are read-only from a server module."
    )]
    ReadOnlyReference { location: String, property: String },

    /// A restricted module was reached from an importer that is not restricted.
    #[error("Cannot import {reason} from \"{importer}\". By react-server convention, .server.js files can only be imported from other .server.js files. That way nobody accidentally sends these to the client by indirectly importing it.")]
    BoundaryViolation {
        importer: String,
        specifier: String,
        resolved: Option<PathBuf>,
        reason: String,
    },

    /// A stashed pipeline continuation was used before the pipeline captured it.
    #[error("Expected {stage} to have been called before transformSource")]
    ContinuationNotCaptured { stage: &'static str },

    #[error("Expected the transformed source of {url} to be a string.")]
    NonTextualSource { url: String },

    #[error("Failed to parse {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Cannot find module '{specifier}' imported from {parent}")]
    ModuleNotFound { specifier: String, parent: String },

    #[error("Invalid module URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Build a boundary violation, naming the resolved path only when it
    /// adds information over the literal specifier.
    #[must_use]
    pub fn boundary_violation(
        importer: impl Into<String>,
        specifier: impl Into<String>,
        resolved: Option<PathBuf>,
    ) -> Self {
        let specifier = specifier.into();
        let reason = match &resolved {
            Some(path) => format!("\"{specifier}\" (which expands to \"{}\")", path.display()),
            None => format!("\"{specifier}\""),
        };
        Self::BoundaryViolation {
            importer: importer.into(),
            specifier,
            resolved,
            reason,
        }
    }
}
