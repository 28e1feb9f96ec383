//! Local music playback

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::PlaybackError;

/// Extensions the mixer can decode
const TRACK_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Process-wide audio mixer capability
#[async_trait(?Send)]
pub trait Mixer {
    /// Decode a track and keep it ready to play
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or decoded
    async fn load(&mut self, path: &Path) -> Result<(), PlaybackError>;

    /// Start the loaded track, replacing anything already playing
    ///
    /// # Errors
    ///
    /// Returns error if nothing is loaded or the device refuses the stream
    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Stop playback; a no-op when nothing is playing
    fn stop(&mut self);
}

/// Whether the file name ends in a playable extension (any case)
#[must_use]
pub fn is_track(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TRACK_EXTENSIONS.iter().any(|t| e.eq_ignore_ascii_case(t)))
}

/// First playable file in `dir`, in directory-listing order
///
/// # Errors
///
/// Returns error if the directory cannot be read
pub fn find_first_track(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if is_track(&path) && path.is_file() {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_track() {
        assert!(is_track(Path::new("song.mp3")));
        assert!(is_track(Path::new("SONG.WAV")));
        assert!(is_track(Path::new("dir/Mix.Mp3")));
        assert!(!is_track(Path::new("cover.jpg")));
        assert!(!is_track(Path::new("mp3")));
        assert!(!is_track(Path::new("notes.mp3.txt")));
    }

    #[test]
    fn test_find_first_track_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cover.jpg"), b"").unwrap();
        std::fs::create_dir(dir.path().join("folder.mp3")).unwrap();
        std::fs::write(dir.path().join("Track.MP3"), b"").unwrap();

        let found = find_first_track(dir.path()).unwrap();
        assert_eq!(found, Some(dir.path().join("Track.MP3")));
    }

    #[test]
    fn test_find_first_track_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();

        assert_eq!(find_first_track(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_find_first_track_missing_dir() {
        assert!(find_first_track(Path::new("/nonexistent/music")).is_err());
    }
}
