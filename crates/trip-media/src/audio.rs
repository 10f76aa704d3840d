//! Soundtrack selection and audio filter building.

use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;
use tracing::debug;

use crate::error::MediaResult;

/// Extensions accepted as soundtrack candidates.
pub const SOUNDTRACK_EXTENSIONS: [&str; 6] = ["mp3", "m4a", "aac", "ogg", "flac", "wav"];

/// Fade-out as a fraction of total duration.
const FADE_FRACTION: f64 = 0.08;
/// Fade-out bounds in seconds.
const FADE_MIN_SECS: f64 = 0.5;
const FADE_MAX_SECS: f64 = 5.0;

/// Pick one track uniformly at random from the pool directory.
///
/// Returns `None` when the directory is missing or holds no audio files.
pub async fn pick_soundtrack(pool_dir: &Path) -> MediaResult<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(pool_dir).await {
        Ok(entries) => entries,
        Err(_) => return Ok(None),
    };

    let mut tracks = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_audio = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SOUNDTRACK_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_audio && entry.file_type().await?.is_file() {
            tracks.push(path);
        }
    }

    if tracks.is_empty() {
        return Ok(None);
    }

    // Deterministic candidate order so the random pick is uniform over a
    // stable set regardless of directory iteration order.
    tracks.sort();

    let picked = tracks.choose(&mut rand::rng()).cloned();
    if let Some(ref track) = picked {
        debug!(track = %track.display(), pool = tracks.len(), "picked soundtrack");
    }
    Ok(picked)
}

/// Fade-out duration for a video of `total_secs`: ~8% of the total, bounded
/// to 0.5-5 seconds.
pub fn fade_out_secs(total_secs: f64) -> f64 {
    (total_secs * FADE_FRACTION).clamp(FADE_MIN_SECS, FADE_MAX_SECS)
}

/// Audio filter trimming the looped track to the video and fading it out.
pub fn audio_filter(total_secs: f64) -> String {
    let fade = fade_out_secs(total_secs);
    let fade_start = (total_secs - fade).max(0.0);
    format!(
        "atrim=duration={total_secs:.3},asetpts=PTS-STARTPTS,\
         afade=t=out:st={fade_start:.3}:d={fade:.3}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_bounds() {
        // 8% of 60s is 4.8s, inside the bounds
        assert!((fade_out_secs(60.0) - 4.8).abs() < 1e-9);
        // Short videos clamp up to half a second
        assert!((fade_out_secs(2.0) - 0.5).abs() < 1e-9);
        // Long videos clamp at five seconds
        assert!((fade_out_secs(600.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_audio_filter_shape() {
        let filter = audio_filter(100.0);
        assert!(filter.contains("atrim=duration=100.000"));
        assert!(filter.contains("afade=t=out:st=95.000:d=5.000"));
    }

    #[tokio::test]
    async fn test_pick_from_pool() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.mp3"), b"x").await.unwrap();
        tokio::fs::write(dir.path().join("b.flac"), b"x").await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"x").await.unwrap();

        let picked = pick_soundtrack(dir.path()).await.unwrap().unwrap();
        let ext = picked.extension().unwrap().to_str().unwrap();
        assert!(ext == "mp3" || ext == "flac");
    }

    #[tokio::test]
    async fn test_empty_pool() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"x").await.unwrap();
        assert!(pick_soundtrack(dir.path()).await.unwrap().is_none());
        assert!(pick_soundtrack(Path::new("/missing/dir")).await.unwrap().is_none());
    }
}
