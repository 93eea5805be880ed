mod ids;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use ids::{
    decode_text, entry_id, entry_id_for_name, file_name_text, os_text, path_text, ENTRY_ID_LEN,
};

/// Fields the engine does not interpret; serialized inline with the known ones.
pub type Extra = BTreeMap<String, Value>;

/// Field lookup by wire name, used by the query engine.
pub trait Record {
    fn id(&self) -> &str;
    fn field(&self, name: &str) -> Option<String>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_art: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Artist {
    /// Builds the artist for a directory; `None` when the directory has no usable name.
    pub fn from_dir(path: &Path) -> Option<Self> {
        let name = file_name_text(path)?;
        if name.trim().is_empty() {
            return None;
        }
        Some(Self {
            id: entry_id(path),
            name,
            path: path_text(path),
            is_dir: true,
            user_rating: None,
            cover_art: None,
            extra: Extra::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub name: String,
    pub title: String,
    pub album: String,
    pub artist: String,
    pub parent: String,
    pub path: String,
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u32>,
    pub cover_art: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Album {
    /// Builds the album for a directory. "Artist - Title" folder names keep only the title.
    pub fn from_dir(path: &Path) -> Option<Self> {
        let folder = file_name_text(path)?;
        let name = album_name(&folder);
        if name.is_empty() {
            return None;
        }
        let id = entry_id(path);
        let (parent, artist) = match path.parent() {
            Some(parent) => (
                entry_id(parent),
                file_name_text(parent).unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        Some(Self {
            id: id.clone(),
            name: name.clone(),
            title: name.clone(),
            album: name,
            artist,
            parent,
            path: path_text(path),
            is_dir: true,
            user_rating: None,
            cover_art: id,
            extra: Extra::new(),
        })
    }
}

fn album_name(folder: &str) -> String {
    let trimmed = folder.trim();
    match trimmed.find('-') {
        Some(idx) if idx > 0 => {
            let rest = trimmed[idx + 1..].trim_start();
            if rest.is_empty() {
                trimmed.to_string()
            } else {
                rest.to_string()
            }
        }
        _ => trimmed.to_string(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub parent: String,
    pub title: String,
    pub path: String,
    pub is_dir: bool,
    pub is_video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u32>,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub entries: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Playlist {
    pub fn new(name: &str, entries: Vec<String>) -> Self {
        Self {
            id: entry_id_for_name(name),
            name: name.to_string(),
            entries,
            extra: Extra::new(),
        }
    }
}

/// Any catalog record, for callers that select the kind at runtime.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Artist(Artist),
    Album(Album),
    Song(Song),
    Playlist(Playlist),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Artist(artist) => &artist.id,
            Entity::Album(album) => &album.id,
            Entity::Song(song) => &song.id,
            Entity::Playlist(playlist) => &playlist.id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub name: String,
}

/// Artists grouped by the uppercased first character of their name.
///
/// Entries inside a bucket keep insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index {
    buckets: BTreeMap<String, Vec<IndexEntry>>,
}

impl Index {
    pub fn bucket_key(name: &str) -> Option<String> {
        let first = name.chars().next()?;
        Some(first.to_uppercase().collect())
    }

    /// Appends an entry; returns the bucket it landed in, or `None` for an empty name.
    pub fn push(&mut self, id: &str, name: &str) -> Option<String> {
        let key = Self::bucket_key(name)?;
        self.buckets
            .entry(key.clone())
            .or_default()
            .push(IndexEntry {
                id: id.to_string(),
                name: name.to_string(),
            });
        Some(key)
    }

    pub fn bucket(&self, key: &str) -> &[IndexEntry] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[IndexEntry])> {
        self.buckets
            .iter()
            .map(|(key, entries)| (key.as_str(), entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Record for Artist {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "path" => Some(self.path.clone()),
            "isDir" => Some(self.is_dir.to_string()),
            "userRating" => self.user_rating.map(|v| v.to_string()),
            "coverArt" => self.cover_art.clone(),
            other => extra_field(&self.extra, other),
        }
    }
}

impl Record for Album {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "title" => Some(self.title.clone()),
            "album" => Some(self.album.clone()),
            "artist" => Some(self.artist.clone()),
            "parent" => Some(self.parent.clone()),
            "path" => Some(self.path.clone()),
            "isDir" => Some(self.is_dir.to_string()),
            "userRating" => self.user_rating.map(|v| v.to_string()),
            "coverArt" => Some(self.cover_art.clone()),
            other => extra_field(&self.extra, other),
        }
    }
}

impl Record for Song {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "parent" => Some(self.parent.clone()),
            "title" => Some(self.title.clone()),
            "path" => Some(self.path.clone()),
            "isDir" => Some(self.is_dir.to_string()),
            "isVideo" => Some(self.is_video.to_string()),
            "track" => self.track.map(|v| v.to_string()),
            "artist" => self.artist.clone(),
            "album" => self.album.clone(),
            "genre" => self.genre.clone(),
            "year" => self.year.map(|v| v.to_string()),
            "duration" => self.duration.map(|v| v.to_string()),
            "bitRate" => self.bit_rate.map(|v| v.to_string()),
            "suffix" => Some(self.suffix.clone()),
            "size" => Some(self.size.to_string()),
            "coverArt" => self.cover_art.clone(),
            "userRating" => self.user_rating.map(|v| v.to_string()),
            other => extra_field(&self.extra, other),
        }
    }
}

impl Record for Playlist {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            other => extra_field(&self.extra, other),
        }
    }
}

fn extra_field(extra: &Extra, name: &str) -> Option<String> {
    match extra.get(name)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
