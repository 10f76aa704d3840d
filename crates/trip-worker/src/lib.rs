//! Journey discovery and render orchestration.
//!
//! The host application owns scheduling, request plumbing, and the concrete
//! collaborator implementations; this crate wires the clustering engine,
//! story pipeline, and composer into per-user runs:
//! - `JourneyEngine` - end-to-end clustering run per user
//! - `RenderService` - render one journey into a highlight video
//! - `JourneyConfig` - env-driven defaults with per-user overrides

pub mod config;
pub mod error;
pub mod journeys;
pub mod logging;
pub mod naming;
pub mod render;

pub use config::{JourneyConfig, JourneySettings, DETECTED_HOME_KEY, SETTINGS_KEY};
pub use error::{WorkerError, WorkerResult};
pub use journeys::{JourneyEngine, RunSummary};
pub use logging::JobLogger;
pub use render::{RenderOutcome, RenderService};
