//! Collaborator contracts consumed by the TripReel core.
//!
//! The core owns no wire protocol or on-disk format; it talks to its host
//! through the abstract contracts here:
//! - `ImageIndex` - media item queries
//! - `FacePresence` - face detection results
//! - `PlaceResolver` - reverse geocoding
//! - `ConfigStore` - per-user scalar/JSON settings
//! - `AlbumStore` - album lifecycle
//! - `BoundaryStore` - persisted cluster boundaries
//! - `FileStorage` - virtual path resolution and output placement
//! - `Notifier` - end-of-run notifications
//!
//! `memory` provides in-memory implementations backing worker tests.

pub mod albums;
pub mod boundaries;
pub mod config;
pub mod error;
pub mod faces;
pub mod files;
pub mod image_index;
pub mod memory;
pub mod notify;
pub mod places;

pub use albums::{AlbumStore, AlbumSummary, NewAlbum};
pub use boundaries::BoundaryStore;
pub use config::{get_typed, set_typed, ConfigStore};
pub use error::{StoreError, StoreResult};
pub use faces::FacePresence;
pub use files::FileStorage;
pub use image_index::ImageIndex;
pub use memory::{
    InMemoryAlbumStore, InMemoryBoundaryStore, InMemoryConfigStore, InMemoryFacePresence,
    InMemoryImageIndex, InMemoryPlaceResolver, LocalFileStorage, RecordingNotifier,
};
pub use notify::Notifier;
pub use places::{PlaceResolver, ResolvedPlace};
