//! Canonical artist lookup and listening-profile resolution.
//!
//! Artist names are matched through a directory built once at ingestion
//! time. Repeated or unmatched names are reported back to the caller
//! instead of being dropped.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::Catalog;
use crate::error::RankError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistId(pub usize);

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistEntry {
    pub id: ArtistId,
    pub name: String,
    pub song_count: usize,
}

/// Problems found while building a directory. Rows are 1-based data rows.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestWarning {
    #[error("row {row}: artist `{name}` already listed at row {first_row}")]
    DuplicateArtist {
        name: String,
        first_row: usize,
        row: usize,
    },

    #[error("row {row}: empty artist name")]
    EmptyName { row: usize },
}

/// Lookup key for an artist name: trimmed, inner whitespace collapsed, lowercased.
#[must_use]
pub fn canonical_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Default)]
pub struct ArtistDirectory {
    entries: Vec<ArtistEntry>,
    by_key: HashMap<String, ArtistId>,
    // data row of each entry's first appearance
    rows: Vec<usize>,
}

impl ArtistDirectory {
    /// Build from a table of artist names, one per row.
    pub fn from_names<I, S>(names: I) -> (ArtistDirectory, Vec<IngestWarning>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dir = ArtistDirectory::default();
        let mut warnings = Vec::new();

        for (idx, name) in names.into_iter().enumerate() {
            let row = idx + 1;
            let display = name.as_ref().trim();
            let key = canonical_name(display);
            if key.is_empty() {
                warnings.push(IngestWarning::EmptyName { row });
                continue;
            }
            if let Some(&id) = dir.by_key.get(&key) {
                warnings.push(IngestWarning::DuplicateArtist {
                    name: display.to_string(),
                    first_row: dir.rows[id.0],
                    row,
                });
                continue;
            }
            dir.push(key, display, row);
        }

        for warning in &warnings {
            warn!("{warning}");
        }
        (dir, warnings)
    }

    /// Derive the directory from song artist lists, counting songs per artist.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> ArtistDirectory {
        let mut dir = ArtistDirectory::default();
        for (pos, song) in catalog.songs().iter().enumerate() {
            let mut seen: Vec<ArtistId> = Vec::with_capacity(song.artists.len());
            for artist in &song.artists {
                let key = canonical_name(artist);
                if key.is_empty() {
                    continue;
                }
                let existing = dir.by_key.get(&key).copied();
                let id = match existing {
                    Some(id) => id,
                    None => dir.push(key, artist.trim(), pos + 1),
                };
                if !seen.contains(&id) {
                    seen.push(id);
                    dir.entries[id.0].song_count += 1;
                }
            }
        }
        dir
    }

    fn push(&mut self, key: String, display: &str, row: usize) -> ArtistId {
        let id = ArtistId(self.entries.len());
        self.entries.push(ArtistEntry {
            id,
            name: display.to_string(),
            song_count: 0,
        });
        self.by_key.insert(key, id);
        self.rows.push(row);
        id
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ArtistEntry> {
        self.by_key
            .get(&canonical_name(name))
            .map(|id| &self.entries[id.0])
    }

    #[must_use]
    pub fn get(&self, id: ArtistId) -> Option<&ArtistEntry> {
        self.entries.get(id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Match a listening profile against the directory.
    ///
    /// Frequencies given twice for the same artist are summed. Matched
    /// artists are ordered by frequency, highest first, then by name.
    #[must_use]
    pub fn resolve(&self, listening: &[ListeningEntry]) -> ResolvedProfile {
        let mut freqs: HashMap<ArtistId, u64> = HashMap::new();
        let mut unmatched: Vec<String> = Vec::new();

        for entry in listening {
            match self.lookup(&entry.artist) {
                Some(artist) => *freqs.entry(artist.id).or_default() += u64::from(entry.freq),
                None => {
                    let name = entry.artist.trim().to_string();
                    if !unmatched.contains(&name) {
                        warn!(artist = %name, "artist not found in directory");
                        unmatched.push(name);
                    }
                }
            }
        }

        let mut matched: Vec<MatchedArtist> = freqs
            .into_iter()
            .map(|(id, freq)| MatchedArtist {
                id,
                name: self.entries[id.0].name.clone(),
                freq,
            })
            .collect();
        matched.sort_by(|a, b| b.freq.cmp(&a.freq).then_with(|| a.name.cmp(&b.name)));

        ResolvedProfile { matched, unmatched }
    }
}

/// How often a user listens to an artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningEntry {
    pub artist: String,
    pub freq: u32,
}

impl FromStr for ListeningEntry {
    type Err = RankError;

    /// Parses `ARTIST=FREQ`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((artist, freq)) = s.rsplit_once('=') else {
            return Err(RankError::InvalidArgument(format!(
                "expected ARTIST=FREQ, got `{s}`"
            )));
        };
        let artist = artist.trim();
        if artist.is_empty() {
            return Err(RankError::InvalidArgument(format!("missing artist in `{s}`")));
        }
        let freq = freq.trim().parse::<u32>().map_err(|_| {
            RankError::InvalidArgument(format!("frequency must be a non-negative integer in `{s}`"))
        })?;
        Ok(ListeningEntry {
            artist: artist.to_string(),
            freq,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedArtist {
    pub id: ArtistId,
    pub name: String,
    pub freq: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedProfile {
    pub matched: Vec<MatchedArtist>,
    pub unmatched: Vec<String>,
}
