//! Metadata store error types.

use thiserror::Error;

/// Why an existing cache database cannot be served from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Incompatibility {
    #[error(
        "ambiguous legacy schema: expected exactly one version record, found {found}. \
         The database was created by an incompatible earlier release; delete it and restart"
    )]
    AmbiguousVersionRecord { found: usize },

    #[error(
        "wrong upstream host: the database is bound to '{recorded}' but the configured \
         upstream is '{configured}'. Delete the database or restore the previous upstream"
    )]
    ServerAddressMismatch { recorded: String, configured: String },
}

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cache database is incompatible: {0}")]
    CacheIncompatible(Incompatibility),

    #[error("migration {unit} failed: {source}")]
    Migration {
        unit: String,
        #[source]
        source: Box<MetadataError>,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl MetadataError {
    /// Whether retrying the same startup could succeed without operator action.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::CacheIncompatible(_) | Self::Config(_) | Self::Internal(_) => false,
            Self::Migration { .. } | Self::Database(_) | Self::NotFound(_) => true,
        }
    }
}

impl From<std::io::Error> for MetadataError {
    fn from(e: std::io::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;
