//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Render failed: {message}")]
    RenderFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    ProbeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Nothing to render: the segment plan is empty")]
    EmptyPlan,

    #[error("Invalid image {path}: {message}")]
    InvalidImage { path: PathBuf, message: String },

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a render failure error.
    pub fn render_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::RenderFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this failure means the renderer itself is not installed.
    ///
    /// Pattern-matched from the captured diagnostic text so callers can
    /// surface a "renderer not installed" hint instead of a raw exit code.
    pub fn is_renderer_missing(&self) -> bool {
        match self {
            Self::FfmpegNotFound | Self::FfprobeNotFound => true,
            Self::RenderFailed {
                message, stderr, ..
            } => {
                let text = match stderr {
                    Some(stderr) => format!("{} {}", message, stderr).to_lowercase(),
                    None => message.to_lowercase(),
                };
                (text.contains("ffmpeg") || text.contains("ffprobe"))
                    && (text.contains("not found")
                        || text.contains("no such file")
                        || text.contains("command not found"))
            }
            _ => false,
        }
    }

    /// Captured renderer diagnostics, when any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::RenderFailed { stderr, .. } | Self::ProbeFailed { stderr, .. } => {
                stderr.as_deref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_missing_detection() {
        assert!(MediaError::FfmpegNotFound.is_renderer_missing());
        assert!(MediaError::render_failed(
            "spawn failed",
            Some("sh: ffmpeg: command not found".to_string()),
            Some(127),
        )
        .is_renderer_missing());
        assert!(!MediaError::render_failed(
            "encode failed",
            Some("Error while decoding stream".to_string()),
            Some(1),
        )
        .is_renderer_missing());
    }

    #[test]
    fn test_diagnostics_exposed() {
        let err = MediaError::render_failed("boom", Some("stderr tail".to_string()), Some(1));
        assert_eq!(err.diagnostics(), Some("stderr tail"));
        assert_eq!(MediaError::EmptyPlan.diagnostics(), None);
    }
}
