//! Companion motion clip discovery and validation.
//!
//! Some cameras save a short clip next to a still with the same stem
//! (IMG_0042.jpg / IMG_0042.mp4). A still is only substituted when the
//! companion validates as a plausible container.

use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;
use tracing::debug;

/// Minimum plausible size for a motion clip.
pub const MOTION_MIN_BYTES: u64 = 10 * 1024;

/// Extensions probed for a companion clip, in order.
const MOTION_EXTENSIONS: [&str; 4] = ["mp4", "MP4", "mov", "MOV"];

/// Find a validated companion motion clip for a still image, if any.
pub async fn find_companion_clip(image: &Path) -> Option<PathBuf> {
    for ext in MOTION_EXTENSIONS {
        let candidate = image.with_extension(ext);
        if candidate == image {
            continue;
        }
        if validate_motion_clip(&candidate).await {
            debug!(clip = %candidate.display(), "companion motion clip found");
            return Some(candidate);
        }
    }
    None
}

/// Whether a path looks like a well-formed motion clip: it exists, is at
/// least [`MOTION_MIN_BYTES`], and carries an ISO-BMFF `ftyp` marker within
/// the first 64 bytes.
pub async fn validate_motion_clip(path: &Path) -> bool {
    let Ok(meta) = tokio::fs::metadata(path).await else {
        return false;
    };
    if !meta.is_file() || meta.len() < MOTION_MIN_BYTES {
        return false;
    }

    let Ok(mut file) = tokio::fs::File::open(path).await else {
        return false;
    };
    let mut head = [0u8; 64];
    let Ok(read) = file.read(&mut head).await else {
        return false;
    };

    has_container_signature(&head[..read])
}

fn has_container_signature(head: &[u8]) -> bool {
    head.windows(4).any(|w| w == b"ftyp")
}
