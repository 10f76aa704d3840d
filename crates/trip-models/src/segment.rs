//! Render segments and chunks for video composition.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One planned piece of the highlight video, in display order.
///
/// A closed set: the planner and composer match exhaustively, so adding a
/// variant forces every consumer to handle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderSegment {
    /// One still image, any orientation, rendered with a Ken Burns pan
    Still { image: PathBuf },
    /// Three landscape images composited as a vertically sliding 3-row stack
    Stack { images: [PathBuf; 3] },
    /// A short clip substituted for a still when a companion motion clip
    /// exists and validates as well-formed
    Motion { video: PathBuf },
}

impl RenderSegment {
    pub fn still(image: impl Into<PathBuf>) -> Self {
        Self::Still {
            image: image.into(),
        }
    }

    pub fn stack(a: impl Into<PathBuf>, b: impl Into<PathBuf>, c: impl Into<PathBuf>) -> Self {
        Self::Stack {
            images: [a.into(), b.into(), c.into()],
        }
    }

    pub fn motion(video: impl Into<PathBuf>) -> Self {
        Self::Motion {
            video: video.into(),
        }
    }

    pub fn is_still(&self) -> bool {
        matches!(self, Self::Still { .. })
    }

    pub fn is_stack(&self) -> bool {
        matches!(self, Self::Stack { .. })
    }

    pub fn is_motion(&self) -> bool {
        matches!(self, Self::Motion { .. })
    }

    /// Source image paths of this segment, empty for motion clips.
    pub fn image_paths(&self) -> Vec<&Path> {
        match self {
            Self::Still { image } => vec![image.as_path()],
            Self::Stack { images } => images.iter().map(PathBuf::as_path).collect(),
            Self::Motion { .. } => Vec::new(),
        }
    }

    /// Number of renderer inputs this segment consumes.
    pub fn input_count(&self) -> usize {
        match self {
            Self::Still { .. } | Self::Motion { .. } => 1,
            Self::Stack { .. } => 3,
        }
    }
}

/// A contiguous sub-sequence of segments sized to a resource budget.
///
/// Chunks render independently and are merged pairwise with crossfades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderChunk {
    /// Zero-based position in the chunk sequence
    pub index: usize,
    pub segments: Vec<RenderSegment>,
}

impl RenderChunk {
    pub fn new(index: usize, segments: Vec<RenderSegment>) -> Self {
        Self { index, segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_counts() {
        assert_eq!(RenderSegment::still("a.jpg").input_count(), 1);
        assert_eq!(RenderSegment::stack("a.jpg", "b.jpg", "c.jpg").input_count(), 3);
        assert_eq!(RenderSegment::motion("a.mp4").input_count(), 1);
    }

    #[test]
    fn test_image_paths() {
        let stack = RenderSegment::stack("a.jpg", "b.jpg", "c.jpg");
        assert_eq!(stack.image_paths().len(), 3);
        assert!(RenderSegment::motion("a.mp4").image_paths().is_empty());
    }

    #[test]
    fn test_tagged_serialization() {
        let json = serde_json::to_string(&RenderSegment::still("a.jpg")).unwrap();
        assert!(json.contains("\"kind\":\"still\""));
    }
}
