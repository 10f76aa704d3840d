//! Journey clustering engine.
//!
//! This crate provides:
//! - Haversine distance (`geo`)
//! - Time/space-bounded location interpolation (`interpolate`)
//! - Flat and home-aware threshold clustering (`clusterer`)
//! - Densest-bucket home detection (`home`)
//! - Incremental boundary filtering (`incremental`)
//!
//! Everything here is synchronous, pure CPU-bound computation over in-memory
//! item lists; persistence and collaborators live in `trip-stores`.

pub mod clusterer;
pub mod geo;
pub mod home;
pub mod incremental;
pub mod interpolate;

pub use clusterer::{
    cluster_items, cluster_items_home_aware, SplitEvent, SplitObserver, SplitReason,
};
pub use geo::haversine_km;
pub use home::detect_home;
pub use incremental::{filter_after_boundary, latest_timestamp};
pub use interpolate::{interpolate_locations, InterpolationOptions};
