//! Synthetic audio files for tests.

use std::fs;
use std::io;
use std::path::Path;

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, stereo, no CRC, no padding.
const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
const FRAME_LEN: usize = 417;
const FRAME_COUNT: usize = 40;

pub fn mpeg_frames(count: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(count * FRAME_LEN);
    for _ in 0..count {
        let mut frame = vec![0u8; FRAME_LEN];
        frame[..4].copy_from_slice(&FRAME_HEADER);
        out.extend_from_slice(&frame);
    }
    out
}

/// ID3v2.3 tag with Latin-1 text frames, e.g. `("TIT2", "Fernando")`.
pub fn id3v23_tag(frames: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (frame_id, text) in frames {
        let mut data = vec![0u8];
        data.extend(text.chars().map(|c| c as u8));
        body.extend_from_slice(frame_id.as_bytes());
        body.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(&data);
    }

    let size = body.len() as u32;
    let mut out = b"ID3".to_vec();
    out.extend_from_slice(&[3, 0, 0]);
    out.extend_from_slice(&[
        ((size >> 21) & 0x7f) as u8,
        ((size >> 14) & 0x7f) as u8,
        ((size >> 7) & 0x7f) as u8,
        (size & 0x7f) as u8,
    ]);
    out.extend_from_slice(&body);
    out
}

pub fn write_tagged_mp3(path: &Path, frames: &[(&str, &str)]) -> io::Result<()> {
    let mut bytes = id3v23_tag(frames);
    bytes.extend_from_slice(&mpeg_frames(FRAME_COUNT));
    fs::write(path, bytes)
}

pub fn write_untagged_mp3(path: &Path) -> io::Result<()> {
    fs::write(path, mpeg_frames(FRAME_COUNT))
}
