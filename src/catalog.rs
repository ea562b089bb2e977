use std::collections::HashMap;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Song, SongId};

/// Read-only, id-indexed song collection. Iteration follows insertion order.
#[derive(Debug, Default)]
pub struct Catalog {
    songs: Vec<Song>,
    index: HashMap<SongId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate song ids.
    pub fn from_songs(songs: Vec<Song>) -> CatalogResult<Catalog> {
        let mut index = HashMap::with_capacity(songs.len());
        for (pos, song) in songs.iter().enumerate() {
            if index.insert(song.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateSongId(song.id.to_string()));
            }
        }
        Ok(Catalog { songs, index })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Song> {
        self.position(id).map(|pos| &self.songs[pos])
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[must_use]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
