use std::path::{Path, PathBuf};

use common::{Album, Artist, Song};
use metadata::{extract, is_allowed_extension};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::snapshot::Snapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexerOptions {
    /// Descend below artist folders to pick up albums and songs.
    pub scan_files: bool,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self { scan_files: true }
    }
}

/// Builds a fresh catalog from the music folders.
///
/// Every immediate subdirectory of a root is an artist. With `scan_files`
/// set, deeper folders become albums and tagged audio files become songs.
/// Bad entries are logged and skipped; the walk always completes.
pub fn scan(roots: &[PathBuf], options: IndexerOptions) -> Snapshot {
    let mut snapshot = Snapshot::default();

    for root in roots {
        if !root.is_dir() {
            warn!("Music folder {:?} is not a directory; skipping", root);
            continue;
        }
        let artist_dirs = collect_artist_dirs(root, &mut snapshot.stats.skipped);
        info!("Found {} artist folders in {:?}", artist_dirs.len(), root);

        for dir in artist_dirs {
            let artist = match Artist::from_dir(&dir) {
                Some(artist) => artist,
                None => {
                    warn!("Skipping artist folder with unusable name: {:?}", dir);
                    snapshot.stats.skipped += 1;
                    continue;
                }
            };
            snapshot.index.push(&artist.id, &artist.name);
            snapshot.insert_artist(artist);

            if options.scan_files {
                ingest_tree(&mut snapshot, &dir);
            }
        }
    }

    snapshot.loaded = true;
    snapshot.refresh_stats();
    snapshot
}

/// Extracts every file below `dir` without touching any catalog.
pub fn browse_path(dir: &Path) -> Vec<Song> {
    let mut songs = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Failed to read below {:?}: {}", dir, err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match extract(entry.path()) {
            Ok(Some(song)) => songs.push(song),
            Ok(None) => {}
            Err(err) => debug!("Media not supported: {}", err),
        }
    }
    songs
}

/// Immediate subdirectories of `root`; unreadable entries are logged and counted.
fn collect_artist_dirs(root: &Path, skipped: &mut usize) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => {
                warn!("Skipping unreadable artist entry in {:?}: {}", root, err);
                *skipped += 1;
            }
        }
    }
    dirs
}

fn ingest_tree(snapshot: &mut Snapshot, artist_dir: &Path) {
    for entry in WalkDir::new(artist_dir)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Failed to read {:?}: {}", artist_dir, err);
                snapshot.stats.skipped += 1;
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().is_dir() {
            match Album::from_dir(path) {
                Some(album) => snapshot.insert_album(album),
                None => {
                    warn!("Skipping album folder with unusable name: {:?}", path);
                    snapshot.stats.skipped += 1;
                }
            }
            continue;
        }

        if !entry.file_type().is_file() || !is_allowed_extension(path) {
            continue;
        }

        match extract(path) {
            Ok(Some(song)) => snapshot.insert_song(song),
            Ok(None) => {
                debug!("No tags in {:?}; not indexed", path);
                snapshot.stats.skipped += 1;
            }
            Err(err) => {
                warn!("Failed to read tags for {:?}: {}", path, err);
                snapshot.stats.skipped += 1;
            }
        }
    }
}
