use std::io;
use std::path::PathBuf;

/// Errors returned by similarity queries.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RankError {
    #[error("Song not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Song {0} has an all-zero feature vector")]
    DegenerateVector(String),
}

/// Errors raised while ingesting a catalog or artist table.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column `{0}`")]
    MissingColumn(String),

    #[error("Duplicate song id `{0}`")]
    DuplicateSongId(String),

    #[error("Row {row}: feature `{feature}` is not a finite number")]
    InvalidFeature { row: usize, feature: &'static str },
}

pub type RankResult<T> = Result<T, RankError>;
pub type CatalogResult<T> = Result<T, CatalogError>;
