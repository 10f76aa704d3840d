//! In-memory collaborator implementations.
//!
//! These back the worker's integration tests and double as reference
//! implementations of the contracts. All state sits behind a mutex; locks
//! are held only for the duration of each call.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use trip_models::{ClusterBoundaryRecord, MediaItem};

use crate::albums::{AlbumStore, AlbumSummary, NewAlbum};
use crate::boundaries::BoundaryStore;
use crate::config::ConfigStore;
use crate::error::{StoreError, StoreResult};
use crate::faces::FacePresence;
use crate::files::FileStorage;
use crate::image_index::ImageIndex;
use crate::notify::Notifier;
use crate::places::{PlaceResolver, ResolvedPlace};

/// Image index over a fixed per-user item list.
#[derive(Debug, Default)]
pub struct InMemoryImageIndex {
    items: Mutex<HashMap<String, Vec<MediaItem>>>,
}

impl InMemoryImageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_items(&self, user_id: &str, items: Vec<MediaItem>) {
        self.items
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .extend(items);
    }
}

#[async_trait]
impl ImageIndex for InMemoryImageIndex {
    async fn items_for_user(
        &self,
        user_id: &str,
        _include_secondary: bool,
    ) -> StoreResult<Vec<MediaItem>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn items_by_ids(&self, user_id: &str, ids: &[String]) -> StoreResult<Vec<MediaItem>> {
        let guard = self.items.lock().unwrap();
        let Some(items) = guard.get(user_id) else {
            return Ok(Vec::new());
        };
        Ok(items.iter().filter(|i| ids.contains(&i.id)).cloned().collect())
    }
}

/// Face presence over a fixed id set.
#[derive(Debug, Default)]
pub struct InMemoryFacePresence {
    faces: Mutex<HashMap<String, bool>>,
}

impl InMemoryFacePresence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_faces(&self, item_id: &str, has_faces: bool) {
        self.faces
            .lock()
            .unwrap()
            .insert(item_id.to_string(), has_faces);
    }
}

#[async_trait]
impl FacePresence for InMemoryFacePresence {
    async fn faces_present(
        &self,
        _user_id: &str,
        ids: &[String],
    ) -> StoreResult<HashMap<String, bool>> {
        let guard = self.faces.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| guard.get(id).map(|v| (id.clone(), *v)))
            .collect())
    }
}

/// Place resolver over fixed circular regions.
#[derive(Debug, Default)]
pub struct InMemoryPlaceResolver {
    regions: Mutex<Vec<Region>>,
}

#[derive(Debug, Clone)]
struct Region {
    latitude: f64,
    longitude: f64,
    radius_deg: f64,
    places: Vec<ResolvedPlace>,
}

impl InMemoryPlaceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register places returned for any coordinate within `radius_deg`
    /// (a flat degree-space radius keeps test setup simple).
    pub fn insert_region(
        &self,
        latitude: f64,
        longitude: f64,
        radius_deg: f64,
        places: Vec<ResolvedPlace>,
    ) {
        self.regions.lock().unwrap().push(Region {
            latitude,
            longitude,
            radius_deg,
            places,
        });
    }
}

#[async_trait]
impl PlaceResolver for InMemoryPlaceResolver {
    async fn resolve(&self, latitude: f64, longitude: f64) -> StoreResult<Vec<ResolvedPlace>> {
        let guard = self.regions.lock().unwrap();
        for region in guard.iter() {
            let d_lat = latitude - region.latitude;
            let d_lon = longitude - region.longitude;
            if (d_lat * d_lat + d_lon * d_lon).sqrt() <= region.radius_deg {
                return Ok(region.places.clone());
            }
        }
        // Fail closed
        Ok(Vec::new())
    }
}

/// Config store over a per-(user, key) value map.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    values: Mutex<HashMap<(String, String), serde_json::Value>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get_value(&self, user_id: &str, key: &str) -> StoreResult<Option<serde_json::Value>> {
        Ok(self
            .values
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), key.to_string()))
            .cloned())
    }

    async fn set_value(
        &self,
        user_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> StoreResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert((user_id.to_string(), key.to_string()), value);
        Ok(())
    }
}

/// Album store with name-collision detection.
#[derive(Debug, Default)]
pub struct InMemoryAlbumStore {
    albums: Mutex<HashMap<String, Vec<StoredAlbum>>>,
    next_id: Mutex<u64>,
}

#[derive(Debug, Clone)]
struct StoredAlbum {
    id: String,
    name: String,
    item_ids: Vec<String>,
}

impl InMemoryAlbumStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlbumStore for InMemoryAlbumStore {
    async fn create_album(&self, user_id: &str, album: NewAlbum) -> StoreResult<String> {
        let mut guard = self.albums.lock().unwrap();
        let user_albums = guard.entry(user_id.to_string()).or_default();
        if user_albums.iter().any(|a| a.name == album.name) {
            return Err(StoreError::already_exists(album.name));
        }
        let mut id_guard = self.next_id.lock().unwrap();
        *id_guard += 1;
        let id = format!("album-{}", *id_guard);
        user_albums.push(StoredAlbum {
            id: id.clone(),
            name: album.name,
            item_ids: album.item_ids,
        });
        Ok(id)
    }

    async fn delete_album(&self, user_id: &str, album_id: &str) -> StoreResult<()> {
        let mut guard = self.albums.lock().unwrap();
        let Some(user_albums) = guard.get_mut(user_id) else {
            return Err(StoreError::not_found(album_id.to_string()));
        };
        let before = user_albums.len();
        user_albums.retain(|a| a.id != album_id);
        if user_albums.len() == before {
            return Err(StoreError::not_found(album_id.to_string()));
        }
        Ok(())
    }

    async fn list_albums(&self, user_id: &str) -> StoreResult<Vec<AlbumSummary>> {
        Ok(self
            .albums
            .lock()
            .unwrap()
            .get(user_id)
            .map(|albums| {
                albums
                    .iter()
                    .map(|a| AlbumSummary {
                        id: a.id.clone(),
                        name: a.name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn album_members(&self, user_id: &str, album_id: &str) -> StoreResult<Vec<String>> {
        self.albums
            .lock()
            .unwrap()
            .get(user_id)
            .and_then(|albums| albums.iter().find(|a| a.id == album_id))
            .map(|a| a.item_ids.clone())
            .ok_or_else(|| StoreError::not_found(album_id.to_string()))
    }
}

/// Boundary store over a per-user record list.
#[derive(Debug, Default)]
pub struct InMemoryBoundaryStore {
    records: Mutex<HashMap<String, Vec<ClusterBoundaryRecord>>>,
}

impl InMemoryBoundaryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoundaryStore for InMemoryBoundaryStore {
    async fn upsert(&self, record: ClusterBoundaryRecord) -> StoreResult<()> {
        let mut guard = self.records.lock().unwrap();
        let records = guard.entry(record.user_id.clone()).or_default();
        if let Some(existing) = records.iter_mut().find(|r| r.album_id == record.album_id) {
            *existing = record;
        } else {
            records.push(record);
        }
        Ok(())
    }

    async fn max_end(&self, user_id: &str) -> StoreResult<Option<NaiveDateTime>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(user_id)
            .and_then(|records| records.iter().map(|r| r.end).max()))
    }

    async fn has_any(&self, user_id: &str) -> StoreResult<bool> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(user_id)
            .is_some_and(|records| !records.is_empty()))
    }

    async fn album_ids(&self, user_id: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(user_id)
            .map(|records| records.iter().map(|r| r.album_id.clone()).collect())
            .unwrap_or_default())
    }

    async fn delete_all(&self, user_id: &str) -> StoreResult<()> {
        self.records.lock().unwrap().remove(user_id);
        Ok(())
    }
}

/// File storage rooted at a local directory.
#[derive(Debug)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn resolve_local(&self, user_id: &str, virtual_path: &str) -> StoreResult<PathBuf> {
        let path = self
            .root
            .join(user_id)
            .join(virtual_path.trim_start_matches('/'));
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::not_found(virtual_path.to_string()));
        }
        Ok(path)
    }

    async fn prepare_output_folder(&self, user_id: &str, folder: &str) -> StoreResult<PathBuf> {
        let path = self.root.join(user_id).join(folder);
        tokio::fs::create_dir_all(&path).await?;
        Ok(path)
    }
}

/// Notifier that records every posted notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    posted: Mutex<Vec<(String, usize, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posted(&self) -> Vec<(String, usize, String)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn journeys_created(
        &self,
        user_id: &str,
        count: usize,
        deep_link: &str,
    ) -> StoreResult<()> {
        self.posted
            .lock()
            .unwrap()
            .push((user_id.to_string(), count, deep_link.to_string()));
        Ok(())
    }
}
