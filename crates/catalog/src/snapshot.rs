use std::collections::BTreeMap;

use common::{Album, Artist, Index, Playlist, Song};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::CatalogError;

/// Field updates merged into a stored record.
pub type Patch = Map<String, Value>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildStats {
    pub artists: usize,
    pub albums: usize,
    pub songs: usize,
    pub skipped: usize,
}

/// One complete catalog state. Published whole; never observed half-built.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub artists: BTreeMap<String, Artist>,
    pub albums: BTreeMap<String, Album>,
    pub songs: BTreeMap<String, Song>,
    pub playlists: BTreeMap<String, Playlist>,
    pub index: Index,
    pub stats: RebuildStats,
    pub loaded: bool,
}

impl Snapshot {
    pub(crate) fn insert_artist(&mut self, artist: Artist) {
        self.artists.insert(artist.id.clone(), artist);
    }

    pub(crate) fn insert_album(&mut self, album: Album) {
        self.albums.insert(album.id.clone(), album);
    }

    /// Songs share their folder's cover art.
    pub(crate) fn insert_song(&mut self, mut song: Song) {
        if song.cover_art.is_none() {
            song.cover_art = Some(song.parent.clone());
        }
        self.songs.insert(song.id.clone(), song);
    }

    pub(crate) fn refresh_stats(&mut self) {
        self.stats.artists = self.artists.len();
        self.stats.albums = self.albums.len();
        self.stats.songs = self.songs.len();
    }
}

/// Overlays `patch` on `record`. Null values are ignored and `id` cannot change.
pub(crate) fn merge_record<T>(record: &T, patch: &Patch) -> Result<T, CatalogError>
where
    T: Serialize + DeserializeOwned,
{
    let mut value =
        serde_json::to_value(record).map_err(|err| CatalogError::InvalidPatch(err.to_string()))?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| CatalogError::InvalidPatch("record is not an object".to_string()))?;

    for (key, new_value) in patch {
        if new_value.is_null() {
            continue;
        }
        if key == "id" {
            if object.get("id") != Some(new_value) {
                return Err(CatalogError::InvalidPatch("id cannot be changed".to_string()));
            }
            continue;
        }
        object.insert(key.clone(), new_value.clone());
    }

    serde_json::from_value(value).map_err(|err| CatalogError::InvalidPatch(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn patch(value: Value) -> Patch {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn merge_sets_known_and_unknown_fields() {
        let artist = Artist::from_dir(Path::new("/music/ABBA")).unwrap();
        let merged = merge_record(
            &artist,
            &patch(json!({"userRating": 4, "starred": "2024-01-01", "coverArt": null})),
        )
        .unwrap();
        assert_eq!(merged.user_rating, Some(4));
        assert_eq!(merged.extra["starred"], "2024-01-01");
        assert_eq!(merged.name, "ABBA");
        assert_eq!(merged.cover_art, None);
    }

    #[test]
    fn merge_rejects_id_changes_and_bad_types() {
        let artist = Artist::from_dir(Path::new("/music/ABBA")).unwrap();
        let same_id = patch(json!({"id": artist.id.clone(), "name": "Abba"}));
        assert_eq!(merge_record(&artist, &same_id).unwrap().name, "Abba");

        let err = merge_record(&artist, &patch(json!({"id": "other"}))).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPatch(_)));
        let err = merge_record(&artist, &patch(json!({"userRating": "five"}))).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPatch(_)));
    }

    #[test]
    fn songs_inherit_cover_art_from_parent() {
        let mut snapshot = Snapshot::default();
        snapshot.insert_song(Song {
            id: "s1".to_string(),
            parent: "p1".to_string(),
            title: "Fernando".to_string(),
            ..Song::default()
        });
        assert_eq!(snapshot.songs["s1"].cover_art.as_deref(), Some("p1"));
    }
}
