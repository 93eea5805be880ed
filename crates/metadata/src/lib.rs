mod extract;
mod filename;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

use std::path::PathBuf;

use lofty::error::LoftyError;

pub use extract::{extract, is_allowed_extension, AudioFormat};
pub use filename::{parse_filename, FilenameField, FilenameInfo};

/// A file the catalog cannot take as media.
#[derive(Debug)]
pub enum MediaError {
    NotFound(PathBuf),
    NotAFile(PathBuf),
    UnsupportedExtension(PathBuf),
    Io(std::io::Error),
    Malformed(LoftyError),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::NotFound(path) => write!(f, "file does not exist: {}", path.display()),
            MediaError::NotAFile(path) => write!(f, "not a regular file: {}", path.display()),
            MediaError::UnsupportedExtension(path) => {
                write!(f, "unsupported extension: {}", path.display())
            }
            MediaError::Io(err) => write!(f, "io error: {}", err),
            MediaError::Malformed(err) => write!(f, "unreadable media: {}", err),
        }
    }
}

impl std::error::Error for MediaError {}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::Io(err)
    }
}

impl From<LoftyError> for MediaError {
    fn from(err: LoftyError) -> Self {
        MediaError::Malformed(err)
    }
}
