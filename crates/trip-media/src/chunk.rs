//! Resource-bounded chunking of segment plans.

use tracing::debug;

use trip_models::{RenderChunk, RenderSegment};

use crate::error::MediaResult;
use crate::probe::probe_image_dimensions;

/// Hard ceiling of segments per chunk.
pub const MAX_CHUNK_SEGMENTS: usize = 60;
/// Floor of segments per chunk.
pub const MIN_CHUNK_SEGMENTS: usize = 4;
/// Chunk cap when any still/stack input is large.
pub const LARGE_INPUT_CHUNK_SEGMENTS: usize = 10;
/// Pixel count above which an input counts as large (13 megapixels).
pub const LARGE_INPUT_PIXELS: u64 = 13_000_000;

/// Probe every still/stack input and report whether any exceeds the large
/// pixel threshold. Unreadable images count as small; the render itself
/// will surface a real decode problem.
pub async fn any_large_input(segments: &[RenderSegment]) -> MediaResult<bool> {
    for segment in segments {
        for path in segment.image_paths() {
            match probe_image_dimensions(path).await {
                Ok((w, h)) => {
                    if w as u64 * h as u64 > LARGE_INPUT_PIXELS {
                        debug!(path = %path.display(), width = w, height = h, "large input");
                        return Ok(true);
                    }
                }
                Err(err) => {
                    debug!(path = %path.display(), %err, "dimension probe failed");
                }
            }
        }
    }
    Ok(false)
}

/// Group segments into chunks sized to the renderer's resource budget.
///
/// Large inputs cap chunks at [`LARGE_INPUT_CHUNK_SEGMENTS`]; otherwise the
/// whole plan renders as one chunk, bounded by the hard ceiling and floor.
pub fn chunk_segments(segments: Vec<RenderSegment>, any_large: bool) -> Vec<RenderChunk> {
    if segments.is_empty() {
        return Vec::new();
    }

    let chunk_size = if any_large {
        LARGE_INPUT_CHUNK_SEGMENTS
    } else {
        segments.len().clamp(MIN_CHUNK_SEGMENTS, MAX_CHUNK_SEGMENTS)
    };

    segments
        .chunks(chunk_size)
        .map(|chunk| chunk.to_vec())
        .enumerate()
        .map(|(index, segments)| RenderChunk::new(index, segments))
        .collect()
}

/// Duration of one rendered chunk: hold-spaced segments plus the trailing
/// transition.
pub fn chunk_duration_secs(segment_count: usize, hold: f64, transition: f64) -> f64 {
    segment_count as f64 * hold + transition
}

/// Duration after pairwise crossfade merging: each merge overlaps one
/// transition, so `sum(chunks) - (n - 1) * transition`.
pub fn merged_duration_secs(chunk_durations: &[f64], transition: f64) -> f64 {
    if chunk_durations.is_empty() {
        return 0.0;
    }
    let sum: f64 = chunk_durations.iter().sum();
    sum - (chunk_durations.len() - 1) as f64 * transition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stills(n: usize) -> Vec<RenderSegment> {
        (0..n)
            .map(|i| RenderSegment::still(format!("/p/{i}.jpg")))
            .collect()
    }

    #[test]
    fn test_large_inputs_cap_chunks_at_ten() {
        let chunks = chunk_segments(stills(40), true);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() <= LARGE_INPUT_CHUNK_SEGMENTS));
        assert_eq!(chunks.iter().map(RenderChunk::len).sum::<usize>(), 40);
    }

    #[test]
    fn test_small_inputs_render_in_one_chunk() {
        let chunks = chunk_segments(stills(40), false);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 40);
    }

    #[test]
    fn test_hard_ceiling() {
        let chunks = chunk_segments(stills(100), false);
        assert!(chunks.iter().all(|c| c.len() <= MAX_CHUNK_SEGMENTS));
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_chunk_indices_sequential() {
        let chunks = chunk_segments(stills(25), true);
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_plan() {
        assert!(chunk_segments(Vec::new(), false).is_empty());
    }

    #[test]
    fn test_duration_algebra() {
        let hold = 3.0;
        let transition = 1.0;
        // 40 segments in 4 chunks of 10
        let durations: Vec<f64> = (0..4)
            .map(|_| chunk_duration_secs(10, hold, transition))
            .collect();
        let merged = merged_duration_secs(&durations, transition);
        let expected = durations.iter().sum::<f64>() - 3.0 * transition;
        assert!((merged - expected).abs() < 1e-9);
        // Which equals the single-chunk duration of the whole plan
        assert!((merged - chunk_duration_secs(40, hold, transition)).abs() < 1e-9);
    }
}
