use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Catalog-unique song identifier. Ordered bytewise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(String);

impl SongId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SongId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SongId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    pub features: FeatureVector,
}

impl Song {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, features: FeatureVector) -> Self {
        Self {
            id: SongId::new(id),
            name: name.into(),
            artists: Vec::new(),
            year: None,
            features,
        }
    }

    #[must_use]
    pub fn with_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artists = artists.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Artist names joined for display.
    #[must_use]
    pub fn artists_display(&self) -> String {
        self.artists.join(", ")
    }
}

/// One ranked candidate of a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub distance: f32,
    pub song_id: SongId,
    pub name: String,
    pub artists: Vec<String>,
    pub year: Option<i32>,
}

impl Recommendation {
    /// Format as TSV line: distance, id, name, artists, year.
    #[must_use]
    pub fn to_tsv(&self) -> String {
        let year = self.year.map_or_else(String::new, |y| y.to_string());
        format!(
            "{:.4}\t{}\t{}\t{}\t{}",
            self.distance,
            self.song_id,
            self.name,
            self.artists.join(", "),
            year,
        )
    }
}
