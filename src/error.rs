//! Error types for the Artisan container.

use std::path::PathBuf;

use thiserror::Error;

/// Root error type for container operations.
#[derive(Error, Debug, Clone)]
pub enum ArtisanError {
    /// A provider was given the slug of an already registered module (or the reverse).
    #[error("`{0}` was provided as both a module and a provider")]
    ModuleOverwrite(String),

    /// Resolution found no module and no unloaded provider able to register it.
    #[error("tried to get module `{0}` but it was not registered")]
    ModuleNotFound(String),

    /// A live module was registered twice under the same slug.
    #[error("the module `{0}` was loaded twice")]
    ModuleExists(String),

    /// Two provider units declare the same slug.
    #[error("a provider is already registered as `{0}`")]
    ProviderExists(String),

    /// A resolved value was requested as a type it does not hold.
    #[error("`{name}` holds a value of type {found}, not {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Discovery or loading of provider units failed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Invalid container configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reported by a module factory or command handler
    #[error("{0}")]
    Other(String),
}

impl ArtisanError {
    /// Convenience constructor for factory and handler failures.
    pub fn other(message: impl Into<String>) -> Self {
        ArtisanError::Other(message.into())
    }
}

/// Errors raised while locating, discovering or loading provider units.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    /// Nothing exists at the registered location
    #[error("no provider unit or directory at `{}`", .0.display())]
    LocationNotFound(PathBuf),

    /// The loader has no unit for a discovered path
    #[error("no provider unit registered for `{}`", .0.display())]
    UnitNotFound(PathBuf),

    /// The discovery pattern could not be built
    #[error("invalid discovery pattern: {0}")]
    Pattern(String),

    /// IO error while scanning a directory
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

impl From<glob::PatternError> for SourceError {
    fn from(err: glob::PatternError) -> Self {
        SourceError::Pattern(err.to_string())
    }
}

impl From<glob::GlobError> for SourceError {
    fn from(err: glob::GlobError) -> Self {
        SourceError::Io(err.to_string())
    }
}

/// Result type alias for container operations.
pub type ArtisanResult<T> = Result<T, ArtisanError>;

/// Result type alias for unit source operations.
pub type SourceResult<T> = Result<T, SourceError>;
