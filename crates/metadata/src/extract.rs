use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use common::{entry_id, file_name_text, path_text, Song};
use lofty::file::FileType;
use lofty::prelude::{AudioFile, ItemKey, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Tag;
use serde_json::Value;
use tracing::{debug, warn};

use crate::filename::parse_filename;
use crate::MediaError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioFormat {
    Mpeg,
    OggVorbis,
    Mp4,
}

impl AudioFormat {
    pub const ALLOWED_EXTENSIONS: [&'static str; 3] = ["mp3", "ogg", "m4a"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mpeg),
            "ogg" => Some(AudioFormat::OggVorbis),
            "m4a" => Some(AudioFormat::Mp4),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy();
        Self::from_extension(&ext)
    }

    fn file_type(self) -> FileType {
        match self {
            AudioFormat::Mpeg => FileType::Mpeg,
            AudioFormat::OggVorbis => FileType::Vorbis,
            AudioFormat::Mp4 => FileType::Mp4,
        }
    }
}

pub fn is_allowed_extension(path: &Path) -> bool {
    AudioFormat::from_path(path).is_some()
}

/// Reads one audio file into a [`Song`].
///
/// Filename heuristics provide the baseline; embedded tags override them.
/// Returns `Ok(None)` for a readable stream that carries no tag at all.
pub fn extract(path: &Path) -> Result<Option<Song>, MediaError> {
    let format = AudioFormat::from_path(path)
        .ok_or_else(|| MediaError::UnsupportedExtension(path.to_path_buf()))?;

    let file_meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(MediaError::NotFound(path.to_path_buf()))
        }
        Err(err) => return Err(err.into()),
    };
    if !file_meta.is_file() {
        return Err(MediaError::NotAFile(path.to_path_buf()));
    }

    let tagged_file = Probe::open(path)?.set_file_type(format.file_type()).read()?;
    let tag = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(tag) => tag,
        None => {
            warn!("Media has no tag header: {:?}", path);
            return Ok(None);
        }
    };

    let file_name = file_name_text(path).unwrap_or_default();
    let guess = parse_filename(&file_name);

    let mut song = Song {
        id: entry_id(path),
        parent: path.parent().map(entry_id).unwrap_or_default(),
        title: guess.title.unwrap_or_else(|| file_name.clone()),
        path: path_text(path),
        is_dir: false,
        is_video: false,
        track: guess.track,
        artist: guess.artist,
        album: guess.album,
        year: guess.year,
        suffix: guess.suffix,
        size: file_meta.len(),
        ..Song::default()
    };

    overlay_tag(&mut song, tag);

    let properties = tagged_file.properties();
    if !properties.duration().is_zero() {
        let secs = properties.duration().as_secs();
        song.duration = Some(u32::try_from(secs).unwrap_or(u32::MAX));
    }
    song.bit_rate = properties
        .audio_bitrate()
        .or(properties.overall_bitrate())
        .filter(|rate| *rate > 0);

    debug!("Parsed tags for {:?}: {:?}", path, song);
    Ok(Some(song))
}

fn overlay_tag(song: &mut Song, tag: &Tag) {
    if let Some(title) = first_text(tag, &ItemKey::TrackTitle) {
        song.title = title;
    }
    if let Some(artist) =
        first_text(tag, &ItemKey::TrackArtist).or_else(|| first_text(tag, &ItemKey::AlbumArtist))
    {
        song.artist = Some(artist);
    }
    if let Some(album) = first_text(tag, &ItemKey::AlbumTitle) {
        song.album = Some(album);
    }
    if let Some(genre) = first_text(tag, &ItemKey::Genre) {
        song.genre = Some(genre);
    }
    if let Some(year) = first_text(tag, &ItemKey::Year)
        .or_else(|| first_text(tag, &ItemKey::RecordingDate))
        .and_then(|value| parse_year(&value))
    {
        song.year = Some(year);
    }
    if let Some(track) = first_text(tag, &ItemKey::TrackNumber).and_then(|value| parse_u16(&value)) {
        song.track = Some(track);
    }

    for item in tag.items() {
        if is_mapped_key(item.key()) {
            continue;
        }
        let text = match item.value().text() {
            Some(text) if !text.trim().is_empty() => text,
            _ => continue,
        };
        let key = match item.key().map_key(tag.tag_type(), true) {
            Some(key) => key.to_lowercase(),
            None => continue,
        };
        song.extra
            .entry(key)
            .or_insert_with(|| Value::String(text.trim().to_string()));
    }
}

fn first_text(tag: &Tag, key: &ItemKey) -> Option<String> {
    let value = tag.get_string(key)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn is_mapped_key(key: &ItemKey) -> bool {
    matches!(
        key,
        ItemKey::TrackTitle
            | ItemKey::TrackArtist
            | ItemKey::AlbumArtist
            | ItemKey::AlbumTitle
            | ItemKey::Genre
            | ItemKey::Year
            | ItemKey::RecordingDate
            | ItemKey::TrackNumber
    )
}

fn parse_u16(text: &str) -> Option<u16> {
    let head = text.split('/').next().unwrap_or(text).trim();
    head.parse().ok()
}

fn parse_year(text: &str) -> Option<i32> {
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            if digits.len() == 4 {
                break;
            }
        } else if !digits.is_empty() {
            break;
        }
    }
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}
