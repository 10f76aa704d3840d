//! Worker error types.

use thiserror::Error;

use trip_media::MediaError;
use trip_stores::StoreError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Empty item index for the user; a non-fatal "nothing to do" in batch
    #[error("No images found for user {0}")]
    NoImagesFound(String),

    /// Requested journey index out of range; a 404-equivalent for callers
    #[error("Journey {index} not found for user {user_id}")]
    ClusterNotFound { user_id: String, index: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether this is the benign "nothing to do" outcome.
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, Self::NoImagesFound(_))
    }

    /// Whether the failure traces back to a missing renderer install.
    pub fn is_renderer_missing(&self) -> bool {
        matches!(self, Self::Media(media) if media.is_renderer_missing())
    }

    /// A hint suitable for surfacing to the user, when one applies.
    pub fn user_hint(&self) -> Option<&'static str> {
        if self.is_renderer_missing() {
            Some("FFmpeg does not appear to be installed; install it to render journey videos")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifiers() {
        assert!(WorkerError::NoImagesFound("u1".to_string()).is_nothing_to_do());
        assert!(!WorkerError::ClusterNotFound {
            user_id: "u1".to_string(),
            index: 9,
        }
        .is_nothing_to_do());

        let err = WorkerError::Media(MediaError::FfmpegNotFound);
        assert!(err.is_renderer_missing());
        assert!(err.user_hint().is_some());
        assert!(WorkerError::config_error("bad").user_hint().is_none());
    }
}
