//! Content-based song recommendations.
//!
//! A [`Catalog`] is loaded once (see [`load`]) and handed to a
//! [`SimilarityRanker`], which ranks songs by cosine distance between their
//! L2-normalized acoustic feature vectors.

pub mod artists;
pub mod catalog;
pub mod error;
pub mod features;
pub mod load;
pub mod models;
pub mod recommend;

pub use catalog::Catalog;
pub use error::{CatalogError, RankError};
pub use models::{Recommendation, Song, SongId};
pub use recommend::SimilarityRanker;
