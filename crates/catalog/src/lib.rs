pub mod config;
mod indexer;
mod query;
mod snapshot;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use common::{entry_id, Album, Artist, Entity, Index, Playlist, Record, Song};
use metadata::{extract, is_allowed_extension, MediaError};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::info;

pub use indexer::{browse_path, scan, IndexerOptions};
pub use query::{search, search_ids, Query};
pub use snapshot::{Patch, RebuildStats, Snapshot};

/// Songs returned by [`Catalog::get_highest`] when the caller has no preference.
pub const DEFAULT_HIGHEST: usize = 20;

/// Names of the playlists served by [`Catalog::static_playlists`].
pub const STATIC_PLAYLISTS: [&str; 3] = ["sample", "random", "genre"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Artist,
    Album,
    Song,
    Playlist,
}

impl FromStr for EntityKind {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "artist" | "artists" => Ok(EntityKind::Artist),
            "album" | "albums" => Ok(EntityKind::Album),
            "song" | "songs" => Ok(EntityKind::Song),
            "playlist" | "playlists" => Ok(EntityKind::Playlist),
            _ => Err(CatalogError::UnknownKind(value.to_string())),
        }
    }
}

/// Independent result buckets of [`Catalog::search_all`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct SearchResults {
    pub artist: Vec<Artist>,
    pub album: Vec<Album>,
    pub title: Vec<Song>,
}

/// In-memory music catalog.
///
/// Readers work on an immutable [`Snapshot`]. Rebuilds assemble a new
/// snapshot without holding the state lock and publish it in one swap.
pub struct Catalog {
    music_folders: Vec<PathBuf>,
    options: IndexerOptions,
    state: RwLock<Arc<Snapshot>>,
    rebuild_lock: Mutex<()>,
}

impl Catalog {
    pub fn new(music_folders: Vec<PathBuf>) -> Self {
        Self::with_options(music_folders, IndexerOptions::default())
    }

    pub fn with_options(music_folders: Vec<PathBuf>, options: IndexerOptions) -> Self {
        Self {
            music_folders,
            options,
            state: RwLock::new(Arc::new(Snapshot::default())),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn music_folders(&self) -> &[PathBuf] {
        &self.music_folders
    }

    pub fn folder_by_id(&self, folder_id: &str) -> Result<&Path, CatalogError> {
        self.music_folders
            .iter()
            .find(|folder| entry_id(folder) == folder_id)
            .map(PathBuf::as_path)
            .ok_or_else(|| CatalogError::UnknownFolder(folder_id.to_string()))
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.read().clone()
    }

    /// Discards the catalog and rebuilds it from the music folders.
    pub fn rebuild(&self) -> Index {
        let _guard = self.rebuild_lock.lock();
        self.rebuild_locked()
    }

    /// Rebuilds only if the catalog has never been loaded. Returns whether it did.
    ///
    /// Entries added with [`Catalog::add_entry`] before the first load do not
    /// count as loading and are replaced by the rebuilt catalog.
    pub fn ensure_loaded(&self) -> bool {
        if self.state.read().loaded {
            return false;
        }
        let _guard = self.rebuild_lock.lock();
        if self.state.read().loaded {
            return false;
        }
        self.rebuild_locked();
        true
    }

    fn rebuild_locked(&self) -> Index {
        let snapshot = scan(&self.music_folders, self.options);
        info!(
            "Catalog rebuilt: {} artists, {} albums, {} songs ({} skipped)",
            snapshot.stats.artists,
            snapshot.stats.albums,
            snapshot.stats.songs,
            snapshot.stats.skipped
        );
        let index = snapshot.index.clone();
        *self.state.write() = Arc::new(snapshot);
        index
    }

    pub fn reset(&self) {
        *self.state.write() = Arc::new(Snapshot::default());
    }

    pub fn index(&self) -> Index {
        self.state.read().index.clone()
    }

    pub fn stats(&self) -> RebuildStats {
        self.state.read().stats.clone()
    }

    fn write<R>(&self, apply: impl FnOnce(&mut Snapshot) -> R) -> R {
        let mut guard = self.state.write();
        apply(Arc::make_mut(&mut guard))
    }

    /// Adds a directory (artist, or album when `is_album`) or an audio file.
    pub fn add_entry(&self, path: &Path, is_album: bool) -> Result<String, CatalogError> {
        if path.is_dir() {
            let id = if is_album {
                let album = Album::from_dir(path)
                    .ok_or_else(|| CatalogError::InvalidName(path.display().to_string()))?;
                let id = album.id.clone();
                self.write(|s| s.insert_album(album));
                id
            } else {
                let artist = Artist::from_dir(path)
                    .ok_or_else(|| CatalogError::InvalidName(path.display().to_string()))?;
                let id = artist.id.clone();
                self.write(|s| s.insert_artist(artist));
                id
            };
            info!("Added directory {:?} as {}", path, id);
            return Ok(id);
        }

        if path.is_file() && is_allowed_extension(path) {
            let song = extract(path)?.ok_or_else(|| CatalogError::Untagged(path.to_path_buf()))?;
            let id = song.id.clone();
            self.write(|s| s.insert_song(song));
            info!("Added file {:?} as {}", path, id);
            return Ok(id);
        }

        Err(CatalogError::NotFoundOrDisallowed(path.to_path_buf()))
    }

    /// Merges `patch` into the song, artist or album with this id, searched in that order.
    pub fn update(&self, id: &str, patch: &Patch) -> Result<(), CatalogError> {
        self.write(|s| {
            if let Some(song) = s.songs.get_mut(id) {
                *song = snapshot::merge_record(&*song, patch)?;
                return Ok(());
            }
            if let Some(artist) = s.artists.get_mut(id) {
                *artist = snapshot::merge_record(&*artist, patch)?;
                return Ok(());
            }
            if let Some(album) = s.albums.get_mut(id) {
                *album = snapshot::merge_record(&*album, patch)?;
                return Ok(());
            }
            Err(CatalogError::NotFound(id.to_string()))
        })
    }

    /// Creates the playlist, or replaces the entries of an existing one with the same name.
    pub fn create_playlist(&self, name: &str, entries: Vec<String>) -> Result<String, CatalogError> {
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidName(name.to_string()));
        }
        let playlist = Playlist::new(name, entries);
        let id = playlist.id.clone();
        self.write(|s| match s.playlists.get_mut(&playlist.id) {
            Some(existing) => existing.entries = playlist.entries,
            None => {
                s.playlists.insert(playlist.id.clone(), playlist);
            }
        });
        Ok(id)
    }

    pub fn update_playlist(&self, id: &str, patch: &Patch) -> Result<(), CatalogError> {
        self.write(|s| match s.playlists.get_mut(id) {
            Some(playlist) => {
                *playlist = snapshot::merge_record(&*playlist, patch)?;
                Ok(())
            }
            None => Err(CatalogError::NotFound(id.to_string())),
        })
    }

    /// Fixed playlists for clients without advanced queries. They carry no entries.
    pub fn static_playlists(&self) -> Vec<Playlist> {
        STATIC_PLAYLISTS
            .iter()
            .map(|name| Playlist::new(name, Vec::new()))
            .collect()
    }

    pub fn static_playlist(&self, id: &str) -> Result<Playlist, CatalogError> {
        self.static_playlists()
            .into_iter()
            .find(|playlist| playlist.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Filesystem path of an artist, album or song.
    pub fn entry_path(&self, id: &str) -> Result<PathBuf, CatalogError> {
        let path = match self.get_entry(id)? {
            Entity::Artist(artist) => artist.path,
            Entity::Album(album) => album.path,
            Entity::Song(song) => song.path,
            Entity::Playlist(_) => return Err(CatalogError::NotFound(id.to_string())),
        };
        Ok(PathBuf::from(path))
    }

    /// Runtime-selected lookup: by id, by query, or everything of `kind`.
    pub fn get(
        &self,
        kind: EntityKind,
        id: Option<&str>,
        query: Option<&Query>,
    ) -> Result<Vec<Entity>, CatalogError> {
        let snapshot = self.snapshot();
        match kind {
            EntityKind::Artist => select(&snapshot.artists, id, query, Entity::Artist),
            EntityKind::Album => select(&snapshot.albums, id, query, Entity::Album),
            EntityKind::Song => select(&snapshot.songs, id, query, Entity::Song),
            EntityKind::Playlist => select(&snapshot.playlists, id, query, Entity::Playlist),
        }
    }

    pub fn get_artist(&self, id: &str) -> Option<Artist> {
        self.state.read().artists.get(id).cloned()
    }

    pub fn get_album(&self, id: &str) -> Option<Album> {
        self.state.read().albums.get(id).cloned()
    }

    pub fn get_song(&self, id: &str) -> Option<Song> {
        self.state.read().songs.get(id).cloned()
    }

    pub fn get_playlist(&self, id: &str) -> Option<Playlist> {
        self.state.read().playlists.get(id).cloned()
    }

    pub fn list_artists(&self) -> Vec<Artist> {
        self.state.read().artists.values().cloned().collect()
    }

    pub fn list_albums(&self) -> Vec<Album> {
        self.state.read().albums.values().cloned().collect()
    }

    pub fn list_songs(&self) -> Vec<Song> {
        self.state.read().songs.values().cloned().collect()
    }

    pub fn list_playlists(&self) -> Vec<Playlist> {
        self.state.read().playlists.values().cloned().collect()
    }

    pub fn search_artists(&self, query: &Query) -> Result<Vec<Artist>, CatalogError> {
        let snapshot = self.snapshot();
        Ok(search(&snapshot.artists, query)?.into_iter().cloned().collect())
    }

    pub fn search_albums(&self, query: &Query) -> Result<Vec<Album>, CatalogError> {
        let snapshot = self.snapshot();
        Ok(search(&snapshot.albums, query)?.into_iter().cloned().collect())
    }

    pub fn search_songs(&self, query: &Query) -> Result<Vec<Song>, CatalogError> {
        let snapshot = self.snapshot();
        Ok(search(&snapshot.songs, query)?.into_iter().cloned().collect())
    }

    pub fn songs_by_genre(&self, genre: &str) -> Result<Vec<Song>, CatalogError> {
        self.search_songs(&Query::field("genre", genre))
    }

    /// Looks an id up among artists, albums and songs.
    pub fn get_entry(&self, id: &str) -> Result<Entity, CatalogError> {
        let snapshot = self.snapshot();
        if let Some(artist) = snapshot.artists.get(id) {
            return Ok(Entity::Artist(artist.clone()));
        }
        if let Some(album) = snapshot.albums.get(id) {
            return Ok(Entity::Album(album.clone()));
        }
        if let Some(song) = snapshot.songs.get(id) {
            return Ok(Entity::Song(song.clone()));
        }
        Err(CatalogError::NotFound(id.to_string()))
    }

    /// Songs for the given ids, in order; unknown ids are skipped.
    pub fn get_song_list(&self, ids: &[String]) -> Vec<Song> {
        let snapshot = self.snapshot();
        ids.iter()
            .filter_map(|id| snapshot.songs.get(id).cloned())
            .collect()
    }

    /// Ids of the `limit` best rated songs, highest first. Unrated songs sort last.
    pub fn get_highest(&self, limit: usize) -> Vec<String> {
        let snapshot = self.snapshot();
        let mut rated: Vec<&Song> = snapshot.songs.values().collect();
        rated.sort_by(|a, b| b.user_rating.cmp(&a.user_rating));
        rated
            .into_iter()
            .take(limit)
            .map(|song| song.id.clone())
            .collect()
    }

    /// Artists by name, albums by title and songs by title, each matched separately.
    pub fn search_all(&self, text: &str) -> Result<SearchResults, CatalogError> {
        if text.is_empty() {
            return Err(CatalogError::EmptyQuery);
        }
        let snapshot = self.snapshot();
        Ok(SearchResults {
            artist: bucket(search(&snapshot.artists, &Query::field("name", text)))?,
            album: bucket(search(&snapshot.albums, &Query::field("title", text)))?,
            title: bucket(search(&snapshot.songs, &Query::field("title", text)))?,
        })
    }
}

fn select<T: Record + Clone>(
    store: &BTreeMap<String, T>,
    id: Option<&str>,
    query: Option<&Query>,
    wrap: fn(T) -> Entity,
) -> Result<Vec<Entity>, CatalogError> {
    if let Some(id) = id {
        return Ok(store.get(id).cloned().map(wrap).into_iter().collect());
    }
    if let Some(query) = query {
        return Ok(search(store, query)?
            .into_iter()
            .cloned()
            .map(wrap)
            .collect());
    }
    Ok(store.values().cloned().map(wrap).collect())
}

fn bucket<T: Clone>(found: Result<Vec<&T>, CatalogError>) -> Result<Vec<T>, CatalogError> {
    match found {
        Ok(items) => Ok(items.into_iter().cloned().collect()),
        Err(CatalogError::EmptyCatalog) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}

#[derive(Debug)]
pub enum CatalogError {
    NotFound(String),
    NotFoundOrDisallowed(PathBuf),
    InvalidName(String),
    Untagged(PathBuf),
    Media(MediaError),
    EmptyQuery,
    EmptyCatalog,
    InvalidQuery(String),
    InvalidPatch(String),
    UnknownKind(String),
    UnknownFolder(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound(id) => write!(f, "entry not found: {}", id),
            CatalogError::NotFoundOrDisallowed(path) => {
                write!(f, "path not found or bad extension: {}", path.display())
            }
            CatalogError::InvalidName(name) => write!(f, "invalid name: {:?}", name),
            CatalogError::Untagged(path) => write!(f, "media has no tags: {}", path.display()),
            CatalogError::Media(err) => write!(f, "media error: {}", err),
            CatalogError::EmptyQuery => write!(f, "query is required"),
            CatalogError::EmptyCatalog => write!(f, "nothing to search"),
            CatalogError::InvalidQuery(msg) => write!(f, "invalid query: {}", msg),
            CatalogError::InvalidPatch(msg) => write!(f, "invalid update: {}", msg),
            CatalogError::UnknownKind(kind) => write!(f, "unknown entity kind: {}", kind),
            CatalogError::UnknownFolder(id) => write!(f, "missing music folder with id: {}", id),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<MediaError> for CatalogError {
    fn from(err: MediaError) -> Self {
        CatalogError::Media(err)
    }
}
