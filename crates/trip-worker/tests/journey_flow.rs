//! End-to-end journey discovery over in-memory collaborators.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use trip_media::ComposeObserver;
use trip_models::{MediaItem, RunMode};
use trip_stores::{
    AlbumStore, BoundaryStore, ConfigStore, InMemoryAlbumStore, InMemoryBoundaryStore,
    InMemoryConfigStore, InMemoryFacePresence, InMemoryImageIndex, InMemoryPlaceResolver,
    LocalFileStorage, RecordingNotifier, ResolvedPlace,
};
use trip_worker::{JourneyConfig, JourneyEngine, RenderService, WorkerError, DETECTED_HOME_KEY};

const USER: &str = "user-1";

struct Fixture {
    index: Arc<InMemoryImageIndex>,
    config_store: Arc<InMemoryConfigStore>,
    albums: Arc<InMemoryAlbumStore>,
    boundaries: Arc<InMemoryBoundaryStore>,
    notifier: Arc<RecordingNotifier>,
    engine: JourneyEngine,
}

fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn geo(id: &str, t: NaiveDateTime, lat: f64, lon: f64) -> MediaItem {
    MediaItem::new(id, format!("photos/{id}.jpg"), t).with_location(lat, lon)
}

/// Eight scattered single shots around home in Berlin, two days apart so
/// the near thresholds never join them into a trip.
fn berlin_noise() -> Vec<MediaItem> {
    (0..8)
        .map(|i| {
            geo(
                &format!("berlin-{i}"),
                at(3, 1 + 2 * i, 12),
                52.51 + 0.002 * i as f64,
                13.40 + 0.004 * i as f64,
            )
        })
        .collect()
}

/// A three-day trip to Lisbon in early May.
fn lisbon_trip() -> Vec<MediaItem> {
    [
        ("lisbon-0", at(5, 2, 10)),
        ("lisbon-1", at(5, 2, 14)),
        ("lisbon-2", at(5, 3, 9)),
        ("lisbon-3", at(5, 3, 15)),
        ("lisbon-4", at(5, 4, 11)),
        ("lisbon-5", at(5, 4, 18)),
    ]
    .iter()
    .enumerate()
    .map(|(i, (id, t))| geo(id, *t, 38.72 + 0.001 * i as f64, -9.14))
    .collect()
}

/// A later three-day trip to Rome in June.
fn rome_trip() -> Vec<MediaItem> {
    [
        ("rome-0", at(6, 10, 9)),
        ("rome-1", at(6, 10, 16)),
        ("rome-2", at(6, 11, 10)),
        ("rome-3", at(6, 11, 17)),
        ("rome-4", at(6, 12, 9)),
        ("rome-5", at(6, 12, 13)),
    ]
    .iter()
    .enumerate()
    .map(|(i, (id, t))| geo(id, *t, 41.90 + 0.001 * i as f64, 12.49))
    .collect()
}

fn fixture() -> Fixture {
    let index = Arc::new(InMemoryImageIndex::new());
    let places = Arc::new(InMemoryPlaceResolver::new());
    let config_store = Arc::new(InMemoryConfigStore::new());
    let albums = Arc::new(InMemoryAlbumStore::new());
    let boundaries = Arc::new(InMemoryBoundaryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());

    places.insert_region(
        38.72,
        -9.14,
        0.5,
        vec![
            ResolvedPlace::new("pt-lisbon", 9, "Lisbon"),
            ResolvedPlace::new("pt-lisboa", 6, "Lisboa"),
            ResolvedPlace::new("pt", 2, "Portugal"),
        ],
    );
    places.insert_region(
        41.90,
        12.49,
        0.5,
        vec![
            ResolvedPlace::new("it-rome", 9, "Rome"),
            ResolvedPlace::new("it-lazio", 6, "Lazio"),
            ResolvedPlace::new("it", 2, "Italy"),
        ],
    );

    let engine = JourneyEngine::new(
        index.clone(),
        places.clone(),
        config_store.clone(),
        albums.clone(),
        boundaries.clone(),
        notifier.clone(),
        JourneyConfig::default(),
    );

    Fixture {
        index,
        config_store,
        albums,
        boundaries,
        notifier,
        engine,
    }
}

#[tokio::test]
async fn test_discovery_accepts_trips_and_skips_noise() {
    let f = fixture();
    f.index.insert_items(USER, berlin_noise());
    f.index.insert_items(USER, lisbon_trip());

    let summary = f.engine.run_for_user(USER, RunMode::Incremental).await.unwrap();

    // 8 near-home singles plus the Lisbon trip
    assert_eq!(summary.clusters_found, 9);
    assert_eq!(summary.albums_created, 1);
    assert_eq!(summary.clusters_skipped, 8);

    let albums = f.albums.list_albums(USER).await.unwrap();
    assert_eq!(albums.len(), 1);
    // The broadest shared administrative level names the journey
    assert_eq!(albums[0].name, "Portugal May 2024 (2-4)");

    // Boundary persisted at the trip's end
    assert_eq!(
        f.boundaries.max_end(USER).await.unwrap(),
        Some(at(5, 4, 18))
    );

    // One aggregated notification
    assert_eq!(f.notifier.posted(), vec![(USER.to_string(), 1, "/albums".to_string())]);

    // Home detection ran once and was persisted
    assert!(f
        .config_store
        .get_value(USER, DETECTED_HOME_KEY)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_rerun_without_new_items_is_a_noop() {
    let f = fixture();
    f.index.insert_items(USER, berlin_noise());
    f.index.insert_items(USER, lisbon_trip());

    f.engine.run_for_user(USER, RunMode::Incremental).await.unwrap();
    let second = f.engine.run_for_user(USER, RunMode::Incremental).await.unwrap();

    assert_eq!(second.items_considered, 0);
    assert_eq!(second.albums_created, 0);
    assert_eq!(f.albums.list_albums(USER).await.unwrap().len(), 1);
    assert_eq!(f.notifier.posted().len(), 1);
}

#[tokio::test]
async fn test_incremental_run_only_processes_new_items() {
    let f = fixture();
    f.index.insert_items(USER, berlin_noise());
    f.index.insert_items(USER, lisbon_trip());
    f.engine.run_for_user(USER, RunMode::Incremental).await.unwrap();

    f.index.insert_items(USER, rome_trip());
    let summary = f.engine.run_for_user(USER, RunMode::Incremental).await.unwrap();

    // Only the six Rome items lie beyond the boundary
    assert_eq!(summary.items_considered, 6);
    assert_eq!(summary.albums_created, 1);

    let names: Vec<String> = f
        .albums
        .list_albums(USER)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(
        names,
        vec!["Portugal May 2024 (2-4)", "Italy June 2024 (10-12)"]
    );
    assert_eq!(
        f.boundaries.max_end(USER).await.unwrap(),
        Some(at(6, 12, 13))
    );
}

#[tokio::test]
async fn test_from_scratch_wipes_and_rebuilds() {
    let f = fixture();
    f.index.insert_items(USER, berlin_noise());
    f.index.insert_items(USER, lisbon_trip());
    f.index.insert_items(USER, rome_trip());

    f.engine.run_for_user(USER, RunMode::Incremental).await.unwrap();
    let rebuilt = f.engine.run_for_user(USER, RunMode::FromScratch).await.unwrap();

    assert_eq!(rebuilt.albums_created, 2);
    let albums = f.albums.list_albums(USER).await.unwrap();
    assert_eq!(albums.len(), 2, "old tracked albums were deleted first");
    assert_eq!(f.boundaries.album_ids(USER).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_index_is_nothing_to_do() {
    let f = fixture();
    let err = f
        .engine
        .run_for_user("nobody", RunMode::Incremental)
        .await
        .unwrap_err();
    assert!(err.is_nothing_to_do());

    // Batch runs keep going past it
    let results = f
        .engine
        .run_batch(&["nobody".to_string()], RunMode::Incremental)
        .await;
    assert_eq!(results.len(), 1);
    assert!(results[0].1.as_ref().is_err());
}

#[tokio::test]
async fn test_render_unknown_journey_is_cluster_not_found() {
    let f = fixture();
    f.index.insert_items(USER, berlin_noise());
    f.index.insert_items(USER, lisbon_trip());
    f.engine.run_for_user(USER, RunMode::Incremental).await.unwrap();

    let storage_dir = tempfile::tempdir().unwrap();
    let service = RenderService::new(
        f.index.clone(),
        Arc::new(InMemoryFacePresence::new()),
        f.albums.clone(),
        f.boundaries.clone(),
        Arc::new(LocalFileStorage::new(storage_dir.path())),
        JourneyConfig::default(),
    );

    let err = service
        .render_journey(USER, 7, None, &ComposeObserver::silent())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkerError::ClusterNotFound { index: 7, .. }
    ));
}
