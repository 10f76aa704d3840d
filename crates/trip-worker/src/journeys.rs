//! The end-to-end clustering run.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};
use tracing::{info, warn};

use trip_cluster::{
    cluster_items_home_aware, detect_home, filter_after_boundary, interpolate_locations,
    latest_timestamp,
};
use trip_models::{
    sort_chronological, Cluster, ClusterBoundaryRecord, HomeLocation, JobId, MediaItem, RunMode,
};
use trip_stores::{
    get_typed, set_typed, AlbumStore, BoundaryStore, ConfigStore, ImageIndex, NewAlbum, Notifier,
    PlaceResolver,
};

use crate::config::{JourneyConfig, JourneySettings, DETECTED_HOME_KEY, SETTINGS_KEY};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::naming::{format_cluster_name, resolve_cluster_place};

/// Deep link attached to the end-of-run notification.
const JOURNEYS_DEEP_LINK: &str = "/albums";

/// Result of one per-user clustering run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items considered after boundary filtering
    pub items_considered: usize,
    /// Clusters produced by the clusterer
    pub clusters_found: usize,
    /// Clusters materialized into albums
    pub albums_created: usize,
    /// Clusters skipped by acceptance rules or album collisions
    pub clusters_skipped: usize,
}

/// Composes the clustering engine and collaborators into per-user runs.
pub struct JourneyEngine {
    index: Arc<dyn ImageIndex>,
    places: Arc<dyn PlaceResolver>,
    config_store: Arc<dyn ConfigStore>,
    albums: Arc<dyn AlbumStore>,
    boundaries: Arc<dyn BoundaryStore>,
    notifier: Arc<dyn Notifier>,
    config: JourneyConfig,
}

impl JourneyEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: Arc<dyn ImageIndex>,
        places: Arc<dyn PlaceResolver>,
        config_store: Arc<dyn ConfigStore>,
        albums: Arc<dyn AlbumStore>,
        boundaries: Arc<dyn BoundaryStore>,
        notifier: Arc<dyn Notifier>,
        config: JourneyConfig,
    ) -> Self {
        Self {
            index,
            places,
            config_store,
            albums,
            boundaries,
            notifier,
            config,
        }
    }

    /// Run journey discovery for every user, isolating failures per user.
    pub async fn run_batch(
        &self,
        user_ids: &[String],
        mode: RunMode,
    ) -> Vec<(String, WorkerResult<RunSummary>)> {
        let mut results = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let result = self.run_for_user(user_id, mode).await;
            match &result {
                Ok(summary) => info!(
                    %user_id,
                    albums = summary.albums_created,
                    "journey run finished"
                ),
                Err(err) if err.is_nothing_to_do() => {
                    info!(%user_id, "journey run found nothing to do")
                }
                Err(err) => warn!(%user_id, %err, "journey run failed"),
            }
            results.push((user_id.clone(), result));
        }
        results
    }

    /// One end-to-end clustering run for a user.
    pub async fn run_for_user(&self, user_id: &str, mode: RunMode) -> WorkerResult<RunSummary> {
        let job = JobLogger::new(&JobId::new(), "journey_discovery");
        job.log_start(&format!("user {user_id}, mode {}", mode.as_str()));

        let settings: JourneySettings = get_typed(self.config_store.as_ref(), user_id, SETTINGS_KEY)
            .await?
            .unwrap_or_default();
        let config = self.config.clone().with_overrides(&settings);

        let mut items = self
            .index
            .items_for_user(user_id, config.include_secondary_storage)
            .await?;
        if items.is_empty() {
            return Err(WorkerError::NoImagesFound(user_id.to_string()));
        }
        sort_chronological(&mut items);

        let boundary = match mode {
            RunMode::FromScratch => {
                self.wipe_tracked(user_id).await?;
                None
            }
            RunMode::Incremental => self.effective_boundary(user_id).await?,
        };

        // Home detection runs over the full library, not the filtered tail
        let home = self.resolve_home(user_id, &settings, &items, &config).await?;

        let items = filter_after_boundary(items, boundary);
        if items.is_empty() {
            job.log_completion("no items beyond the processed boundary");
            return Ok(RunSummary::default());
        }

        let items = interpolate_locations(&items, &config.interpolation);
        let clusters =
            cluster_items_home_aware(&items, home.as_ref(), &config.thresholds, None);

        let mut summary = RunSummary {
            items_considered: items.len(),
            clusters_found: clusters.len(),
            ..RunSummary::default()
        };

        let now = Utc::now().naive_utc();
        let mut ordinal = 0;
        for cluster in &clusters {
            if !self.accept_cluster(cluster, now, &config) {
                summary.clusters_skipped += 1;
                continue;
            }
            ordinal += 1;

            match self.materialize_cluster(user_id, cluster, ordinal).await {
                Ok(()) => summary.albums_created += 1,
                Err(WorkerError::Store(err)) if err.is_collision() => {
                    // Name collisions are logged and skipped, never retried
                    warn!(user_id, %err, "album name collision, skipping cluster");
                    summary.clusters_skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        if summary.albums_created > 0 {
            if let Err(err) = self
                .notifier
                .journeys_created(user_id, summary.albums_created, JOURNEYS_DEEP_LINK)
                .await
            {
                warn!(user_id, %err, "failed to post journey notification");
            }
        }

        job.log_completion(&format!(
            "{} clusters, {} albums created, {} skipped",
            summary.clusters_found, summary.albums_created, summary.clusters_skipped
        ));
        Ok(summary)
    }

    /// Acceptance rules for materializing a cluster.
    fn accept_cluster(&self, cluster: &Cluster, now: NaiveDateTime, config: &JourneyConfig) -> bool {
        if cluster.len() < config.min_cluster_size {
            return false;
        }
        if !cluster.has_geolocated_item() {
            return false;
        }
        if config.recent_cutoff_days > 0 {
            // A trip still in progress keeps collecting items; wait it out
            let cutoff = now - Duration::days(config.recent_cutoff_days);
            if cluster.end() > cutoff {
                return false;
            }
        }
        true
    }

    /// Create the album and persist the boundary for an accepted cluster.
    async fn materialize_cluster(
        &self,
        user_id: &str,
        cluster: &Cluster,
        ordinal: usize,
    ) -> WorkerResult<()> {
        let place = resolve_cluster_place(self.places.as_ref(), cluster).await;
        let name = format_cluster_name(place.as_deref(), ordinal, cluster.start(), cluster.end());

        let album_id = self
            .albums
            .create_album(
                user_id,
                NewAlbum {
                    name: name.clone(),
                    place: place.clone(),
                    item_ids: cluster.item_ids(),
                },
            )
            .await?;

        self.boundaries
            .upsert(ClusterBoundaryRecord::new(
                user_id,
                album_id.clone(),
                name.clone(),
                place,
                cluster.start(),
                cluster.end(),
            ))
            .await?;

        info!(user_id, %album_id, %name, items = cluster.len(), "journey album created");
        Ok(())
    }

    /// The incremental low-water mark for a user.
    ///
    /// Prefers the persisted maximum `end`; when records exist without a
    /// usable boundary (legacy rows), derives one from the latest timestamp
    /// among items of previously tracked albums.
    async fn effective_boundary(&self, user_id: &str) -> WorkerResult<Option<NaiveDateTime>> {
        if let Some(end) = self.boundaries.max_end(user_id).await? {
            return Ok(Some(end));
        }
        if !self.boundaries.has_any(user_id).await? {
            return Ok(None);
        }

        let mut derived: Option<NaiveDateTime> = None;
        for album_id in self.boundaries.album_ids(user_id).await? {
            let member_ids = match self.albums.album_members(user_id, &album_id).await {
                Ok(ids) => ids,
                Err(err) => {
                    warn!(user_id, %album_id, %err, "tracked album unreadable, ignoring");
                    continue;
                }
            };
            let items = self.index.items_by_ids(user_id, &member_ids).await?;
            derived = derived.max(latest_timestamp(&items));
        }
        Ok(derived)
    }

    /// Delete tracked albums and their boundary records.
    async fn wipe_tracked(&self, user_id: &str) -> WorkerResult<()> {
        for album_id in self.boundaries.album_ids(user_id).await? {
            if let Err(err) = self.albums.delete_album(user_id, &album_id).await {
                warn!(user_id, %album_id, %err, "failed to delete tracked album");
            }
        }
        self.boundaries.delete_all(user_id).await?;
        info!(user_id, "tracked journeys wiped for from-scratch run");
        Ok(())
    }

    /// Home precedence: explicitly supplied > previously stored > detected.
    async fn resolve_home(
        &self,
        user_id: &str,
        settings: &JourneySettings,
        items: &[MediaItem],
        config: &JourneyConfig,
    ) -> WorkerResult<Option<HomeLocation>> {
        if let Some(home) = &settings.home {
            return Ok(Some(home.clone()));
        }

        if let Some(stored) =
            get_typed::<HomeLocation>(self.config_store.as_ref(), user_id, DETECTED_HOME_KEY)
                .await?
        {
            return Ok(Some(stored));
        }

        let detected = detect_home(items, config.home_radius_km);
        if let Some(home) = &detected {
            // Persist so detection runs once per user
            set_typed(self.config_store.as_ref(), user_id, DETECTED_HOME_KEY, home).await?;
            info!(
                user_id,
                latitude = home.latitude,
                longitude = home.longitude,
                "detected and stored home location"
            );
        }
        Ok(detected)
    }
}
