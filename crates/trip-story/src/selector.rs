//! Story item selection: burst de-duplication and sampling.

use tracing::debug;

use trip_models::MediaItem;

/// Knobs for story selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionOptions {
    /// Minimum gap between kept items during burst de-duplication, seconds
    pub min_gap_secs: i64,
    /// Maximum number of items in the output
    pub max_images: usize,
    /// Prefer items with detected faces during sampling
    pub face_boost: bool,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            min_gap_secs: 120,
            max_images: 36,
            face_boost: true,
        }
    }
}

/// Pick an ordered, de-duplicated, length-capped subset of a cluster's items.
///
/// Burst de-duplication keeps an item only when at least `min_gap_secs` have
/// elapsed since the last kept item (greedy, single pass). The survivors are
/// sampled down to `min(max_images, count)` either evenly or with a
/// face-boosted window search. If de-duplication somehow yields nothing, the
/// full cluster is sampled instead.
pub fn select_story_items(items: &[MediaItem], opts: &SelectionOptions) -> Vec<MediaItem> {
    let deduped = dedup_bursts(items, opts.min_gap_secs);

    let candidates: Vec<&MediaItem> = if deduped.is_empty() {
        debug!(
            min_gap_secs = opts.min_gap_secs,
            "burst de-duplication kept nothing, sampling full cluster"
        );
        items.iter().collect()
    } else {
        deduped
    };

    if candidates.is_empty() {
        return Vec::new();
    }

    let n = opts.max_images.min(candidates.len());
    if n == 0 {
        return Vec::new();
    }

    if opts.face_boost {
        sample_face_boosted(&candidates, n)
    } else {
        sample_even(&candidates, n)
    }
}

/// Greedy single-pass burst removal.
fn dedup_bursts(items: &[MediaItem], min_gap_secs: i64) -> Vec<&MediaItem> {
    let mut kept: Vec<&MediaItem> = Vec::new();
    for item in items {
        match kept.last() {
            Some(last) if (item.taken_at - last.taken_at).num_seconds() < min_gap_secs => {}
            _ => kept.push(item),
        }
    }
    kept
}

/// Evenly spaced target indices across `count` items.
fn even_targets(count: usize, n: usize) -> Vec<usize> {
    if n <= 1 {
        return vec![0];
    }
    (0..n).map(|i| i * (count - 1) / (n - 1)).collect()
}

fn sample_even(candidates: &[&MediaItem], n: usize) -> Vec<MediaItem> {
    even_targets(candidates.len(), n)
        .into_iter()
        .map(|idx| candidates[idx].clone())
        .collect()
}

/// Face-boosted sampling: around each even target, search a +-2 index window
/// and pick the highest-scoring item (1.0 base, +2.0 with faces; ties go to
/// the index closest to the target). Already-used indices are avoided while
/// an unused alternative exists in the window.
fn sample_face_boosted(candidates: &[&MediaItem], n: usize) -> Vec<MediaItem> {
    let count = candidates.len();
    let mut used = std::collections::BTreeSet::new();

    for target in even_targets(count, n) {
        let lo = target.saturating_sub(2);
        let hi = (target + 2).min(count - 1);
        let window: Vec<usize> = (lo..=hi).collect();

        let unused: Vec<usize> = window
            .iter()
            .copied()
            .filter(|i| !used.contains(i))
            .collect();
        let pool = if unused.is_empty() { window } else { unused };

        let best = pool
            .into_iter()
            .max_by(|&a, &b| {
                score(candidates[a])
                    .partial_cmp(&score(candidates[b]))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| distance(b, target).cmp(&distance(a, target)))
                    .then_with(|| b.cmp(&a))
            })
            .expect("window is never empty");
        used.insert(best);
    }

    used.into_iter().map(|idx| candidates[idx].clone()).collect()
}

fn score(item: &MediaItem) -> f64 {
    if item.has_faces == Some(true) {
        3.0
    } else {
        1.0
    }
}

fn distance(idx: usize, target: usize) -> usize {
    idx.abs_diff(target)
}
