use once_cell::sync::Lazy;
use regex::Regex;

static NOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((.+)\)").unwrap());

/// Numbers above this are years rather than track numbers.
const YEAR_FLOOR: i64 = 1900;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilenameField {
    Title,
    Track,
    Album,
    Artist,
    Year,
}

/// Best-effort metadata guessed from a bare file name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilenameInfo {
    pub title: Option<String>,
    pub track: Option<u16>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub suffix: String,
    /// Fields the name did not reveal.
    pub unresolved: Vec<FilenameField>,
}

/// Parses names shaped like `"03 - Title.mp3"` or `"Title (1999) - Album - Artist.mp3"`.
pub fn parse_filename(file_name: &str) -> FilenameInfo {
    let (stem, suffix) = match file_name.rsplit_once('.') {
        Some((stem, suffix)) => (stem, suffix),
        None => (file_name, ""),
    };

    let mut info = FilenameInfo {
        suffix: suffix.to_string(),
        ..FilenameInfo::default()
    };

    let mut text = stem.to_string();
    if let Some(caps) = NOTES.captures(stem) {
        if let Ok(year) = caps[1].trim().parse::<i32>() {
            info.year = Some(year);
            text = stem.replace(&caps[0], "").trim().to_string();
        }
    }

    let segments = text
        .split('-')
        .map(|part| part.trim_matches(|c| c == ' ' || c == '-'))
        .filter(|part| !part.is_empty());
    for segment in segments {
        if let Ok(number) = segment.parse::<i64>() {
            if number > YEAR_FLOOR {
                if info.year.is_none() {
                    info.year = i32::try_from(number).ok();
                }
            } else if let Ok(track) = u16::try_from(number) {
                info.track = Some(track);
            }
            continue;
        }
        if info.title.is_none() {
            info.title = Some(segment.to_string());
        } else if info.album.is_none() {
            info.album = Some(segment.to_string());
        } else if info.artist.is_none() {
            info.artist = Some(segment.to_string());
        }
    }

    if info.track.is_none() {
        if let Some((track, title)) = info.title.as_deref().and_then(split_leading_track) {
            info.track = Some(track);
            info.title = Some(title);
        }
    }

    info.unresolved = unresolved_fields(&info);
    info
}

fn split_leading_track(title: &str) -> Option<(u16, String)> {
    let (head, rest) = title.split_once(' ')?;
    let track = head.parse::<u16>().ok()?;
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    Some((track, rest.to_string()))
}

fn unresolved_fields(info: &FilenameInfo) -> Vec<FilenameField> {
    let mut out = Vec::new();
    if info.title.is_none() {
        out.push(FilenameField::Title);
    }
    if info.track.is_none() {
        out.push(FilenameField::Track);
    }
    if info.album.is_none() {
        out.push(FilenameField::Album);
    }
    if info.artist.is_none() {
        out.push(FilenameField::Artist);
    }
    if info.year.is_none() {
        out.push(FilenameField::Year);
    }
    out
}
