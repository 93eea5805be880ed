use std::ffi::OsStr;
use std::path::Path;

/// Hex characters kept from the BLAKE3 digest (128 bits).
pub const ENTRY_ID_LEN: usize = 32;

/// Stable identifier for a filesystem entry.
///
/// The path is first decoded to canonical text (see [`path_text`]) and the
/// UTF-8 bytes of that text are hashed, so the same logical path yields the
/// same id on every machine regardless of how the filesystem encoded it.
pub fn entry_id(path: &Path) -> String {
    entry_id_for_name(&path_text(path))
}

/// Stable identifier for a free-form name, used for playlists.
pub fn entry_id_for_name(name: &str) -> String {
    let hex = blake3::hash(name.as_bytes()).to_hex();
    hex.as_str()[..ENTRY_ID_LEN].to_string()
}

pub fn path_text(path: &Path) -> String {
    os_text(path.as_os_str())
}

pub fn file_name_text(path: &Path) -> Option<String> {
    path.file_name().map(os_text)
}

#[cfg(unix)]
pub fn os_text(value: &OsStr) -> String {
    use std::os::unix::ffi::OsStrExt;
    decode_text(value.as_bytes())
}

#[cfg(not(unix))]
pub fn os_text(value: &OsStr) -> String {
    value.to_string_lossy().to_string()
}

/// Decodes raw bytes as UTF-8, falling back to Latin-1 which accepts any input.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_is_deterministic() {
        let first = entry_id(Path::new("/music/ABBA/Arrival/Money.mp3"));
        let second = entry_id(Path::new("/music/ABBA/Arrival/Money.mp3"));
        assert_eq!(first, second);
        assert_ne!(first, entry_id(Path::new("/music/ABBA/Arrival/Fernando.mp3")));
    }

    #[test]
    fn entry_id_is_printable_hex() {
        let id = entry_id(Path::new("/music/Led Zeppelin"));
        assert_eq!(id.len(), ENTRY_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn names_and_paths_share_a_hash_space() {
        assert_eq!(entry_id(Path::new("sample")), entry_id_for_name("sample"));
    }

    #[test]
    fn latin1_bytes_decode_like_utf8_text() {
        assert_eq!(decode_text(b"caf\xe9"), "café");
        assert_eq!(decode_text("café".as_bytes()), "café");
    }

    #[cfg(unix)]
    #[test]
    fn latin1_path_hashes_like_utf8_path() {
        use std::os::unix::ffi::OsStrExt;

        let latin1 = Path::new(OsStr::from_bytes(b"/music/Beyonc\xe9"));
        let utf8 = Path::new("/music/Beyoncé");
        assert_eq!(entry_id(latin1), entry_id(utf8));
        assert_eq!(path_text(latin1), "/music/Beyoncé");
    }
}
