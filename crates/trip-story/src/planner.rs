//! Render-segment planning.
//!
//! Converts a selected item list into a typed segment sequence: portrait
//! stills carry the narrative, landscape triples interleave as sliding
//! stacks, and validated companion clips replace stills as motion segments.

use std::path::PathBuf;

use tracing::debug;

use trip_models::RenderSegment;

use crate::motion::find_companion_clip;

/// Consecutive portrait stills before a landscape stack is interleaved.
const STILLS_PER_STACK: usize = 4;

/// Landscape images consumed by one stack.
const STACK_SIZE: usize = 3;

/// One selected image with its resolved local path and known dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryImage {
    pub path: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl StoryImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: None,
            height: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Landscape means width >= height. Unknown dimensions plan as stills,
    /// since a still accepts any orientation but a stack row does not.
    fn is_landscape(&self) -> bool {
        matches!((self.width, self.height), (Some(w), Some(h)) if w >= h)
    }
}

/// Build the segment sequence for a selected, chronologically ordered list.
///
/// One portrait still per iteration; after every four consecutive portrait
/// stills (or immediately once portraits are exhausted) a stack consumes the
/// next three unused landscapes, keeping landscape content interleaved
/// rather than batched. With no portraits at all but at least three
/// landscapes, a single stack is the minimum viable output.
pub fn plan_segments(images: &[StoryImage]) -> Vec<RenderSegment> {
    let portraits: Vec<&StoryImage> = images.iter().filter(|i| !i.is_landscape()).collect();
    let landscapes: Vec<&StoryImage> = images.iter().filter(|i| i.is_landscape()).collect();

    let mut segments = Vec::new();

    if portraits.is_empty() {
        if landscapes.len() >= STACK_SIZE {
            segments.push(stack_of(&landscapes[..STACK_SIZE]));
        }
        return segments;
    }

    let mut pi = 0;
    let mut li = 0;
    let mut consecutive_stills = 0;

    while pi < portraits.len() || landscapes.len() - li >= STACK_SIZE {
        if pi < portraits.len() {
            segments.push(RenderSegment::still(portraits[pi].path.clone()));
            pi += 1;
            consecutive_stills += 1;
            if consecutive_stills < STILLS_PER_STACK && pi < portraits.len() {
                continue;
            }
        }
        if landscapes.len() - li >= STACK_SIZE {
            segments.push(stack_of(&landscapes[li..li + STACK_SIZE]));
            li += STACK_SIZE;
            consecutive_stills = 0;
        } else if pi >= portraits.len() {
            break;
        }
    }

    debug!(
        stills = portraits.len(),
        stacks = li / STACK_SIZE,
        dropped_landscapes = landscapes.len() - li,
        "planned segment sequence"
    );

    segments
}

fn stack_of(images: &[&StoryImage]) -> RenderSegment {
    RenderSegment::stack(
        images[0].path.clone(),
        images[1].path.clone(),
        images[2].path.clone(),
    )
}

/// Replace stills that have a validated companion motion clip.
pub async fn substitute_motion_clips(segments: Vec<RenderSegment>) -> Vec<RenderSegment> {
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            RenderSegment::Still { ref image } => match find_companion_clip(image).await {
                Some(clip) => out.push(RenderSegment::motion(clip)),
                None => out.push(segment),
            },
            other => out.push(other),
        }
    }
    out
}

/// Guarantee the sequence ends on a still frame.
///
/// A stack ends mid-animation, so when the last segment is a stack the
/// nearest earlier still moves to the end (a motion segment, whose tail is
/// frozen on its last frame, is the fallback when no still exists).
pub fn ensure_still_ending(segments: &mut Vec<RenderSegment>) {
    let Some(last) = segments.last() else {
        return;
    };
    if !last.is_stack() {
        return;
    }

    let nearest = segments
        .iter()
        .rposition(RenderSegment::is_still)
        .or_else(|| segments.iter().rposition(RenderSegment::is_motion));

    if let Some(idx) = nearest {
        let moved = segments.remove(idx);
        segments.push(moved);
    }
}
