//! Rendering one journey into a highlight video.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use trip_media::{
    ComposeObserver, ComposeOutcome, ComposeRequest, ComposerConfig, OutputTarget, VideoComposer,
};
use trip_models::{sort_chronological, JobId};
use trip_story::{
    ensure_still_ending, plan_segments, select_story_items, substitute_motion_clips, StoryImage,
};
use trip_stores::{AlbumStore, BoundaryStore, FacePresence, FileStorage, ImageIndex};

use crate::config::JourneyConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Result of a render job.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub album_id: String,
    pub name: String,
    pub compose: ComposeOutcome,
}

/// Renders a tracked journey: select, plan, compose.
pub struct RenderService {
    index: Arc<dyn ImageIndex>,
    faces: Arc<dyn FacePresence>,
    albums: Arc<dyn AlbumStore>,
    boundaries: Arc<dyn BoundaryStore>,
    files: Arc<dyn FileStorage>,
    config: JourneyConfig,
}

impl RenderService {
    pub fn new(
        index: Arc<dyn ImageIndex>,
        faces: Arc<dyn FacePresence>,
        albums: Arc<dyn AlbumStore>,
        boundaries: Arc<dyn BoundaryStore>,
        files: Arc<dyn FileStorage>,
        config: JourneyConfig,
    ) -> Self {
        Self {
            index,
            faces,
            albums,
            boundaries,
            files,
            config,
        }
    }

    /// Render the `journey_index`-th tracked journey of a user.
    ///
    /// With `explicit_output` the artifact lands at that path and is not
    /// stored in managed storage; otherwise it goes into the configured
    /// managed output folder.
    pub async fn render_journey(
        &self,
        user_id: &str,
        journey_index: usize,
        explicit_output: Option<PathBuf>,
        observer: &ComposeObserver,
    ) -> WorkerResult<RenderOutcome> {
        let job = JobLogger::new(&JobId::new(), "journey_render");
        job.log_start(&format!("user {user_id}, journey {journey_index}"));

        let (album_id, name) = self.lookup_journey(user_id, journey_index).await?;
        let images = self.collect_story_images(user_id, &album_id).await?;
        job.log_progress(&format!("{} items selected for '{name}'", images.len()));

        let mut segments = plan_segments(&images);
        segments = substitute_motion_clips(segments).await;
        ensure_still_ending(&mut segments);

        let output = match explicit_output {
            Some(path) => OutputTarget::Explicit(path),
            None => OutputTarget::Managed {
                dir: self
                    .files
                    .prepare_output_folder(user_id, &self.config.output_folder)
                    .await?,
                virtual_prefix: self.config.output_folder.clone(),
            },
        };

        let composer = VideoComposer::new(ComposerConfig {
            hold_secs: self.config.hold_secs,
            transition_secs: self.config.transition_secs,
            ..ComposerConfig::default()
        });
        let compose = composer
            .compose(
                ComposeRequest {
                    segments,
                    title: Some(name.clone()),
                    soundtrack_dir: self.config.soundtrack_dir.clone(),
                    output,
                },
                observer,
            )
            .await?;

        job.log_completion(&format!(
            "'{name}' rendered to {} ({:.1}s)",
            compose.path.display(),
            compose.duration_secs
        ));
        Ok(RenderOutcome {
            album_id,
            name,
            compose,
        })
    }

    /// Resolve a journey index to its tracked album id and display name.
    async fn lookup_journey(
        &self,
        user_id: &str,
        journey_index: usize,
    ) -> WorkerResult<(String, String)> {
        let album_ids = self.boundaries.album_ids(user_id).await?;
        let album_id = album_ids
            .get(journey_index)
            .cloned()
            .ok_or(WorkerError::ClusterNotFound {
                user_id: user_id.to_string(),
                index: journey_index,
            })?;

        let name = self
            .albums
            .list_albums(user_id)
            .await?
            .into_iter()
            .find(|a| a.id == album_id)
            .map(|a| a.name)
            .unwrap_or_else(|| format!("Journey {}", journey_index + 1));

        Ok((album_id, name))
    }

    /// Album members, story-selected and resolved to local paths.
    async fn collect_story_images(
        &self,
        user_id: &str,
        album_id: &str,
    ) -> WorkerResult<Vec<StoryImage>> {
        let member_ids = self.albums.album_members(user_id, album_id).await?;
        let mut items = self.index.items_by_ids(user_id, &member_ids).await?;
        sort_chronological(&mut items);

        if self.config.selection.face_boost {
            let face_map = self.faces.faces_present(user_id, &member_ids).await?;
            for item in &mut items {
                if item.has_faces.is_none() {
                    item.has_faces = face_map.get(&item.id).copied();
                }
            }
        }

        let selected = select_story_items(&items, &self.config.selection);

        let mut images = Vec::with_capacity(selected.len());
        for item in &selected {
            match self.files.resolve_local(user_id, &item.path).await {
                Ok(path) => {
                    let mut image = StoryImage::new(path);
                    if let (Some(w), Some(h)) = (item.width, item.height) {
                        image = image.with_dimensions(w, h);
                    }
                    images.push(image);
                }
                Err(err) => {
                    warn!(user_id, item_id = %item.id, %err, "item not resolvable, skipping");
                }
            }
        }
        Ok(images)
    }
}
