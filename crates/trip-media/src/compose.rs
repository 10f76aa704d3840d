//! Chunked video composition.
//!
//! Turns an ordered segment plan into one video file: segments render in
//! resource-bounded chunks, chunks merge pairwise with crossfades (a linear
//! reduce in append order), and an optional soundtrack is looped, trimmed,
//! faded, and muxed on top. Each composition owns a private temp directory
//! that is removed on success and failure alike.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::watch;
use tracing::{info, warn};

use trip_models::{RenderChunk, RenderSegment};

use crate::audio::{audio_filter, pick_soundtrack};
use crate::chunk::{any_large_input, chunk_duration_secs, chunk_segments};
use crate::command::{check_ffmpeg, FfmpegCommand, FfmpegRunner, InputSpec};
use crate::error::{MediaError, MediaResult};
use crate::filters::{segment_chain, segment_duration, title_chain, xfade_chain, FRAME_FPS};
use crate::fs_utils::move_file;
use crate::probe::get_duration;
use crate::progress::FfmpegProgress;

/// Encoding and pacing knobs for the composer.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Seconds each segment holds before the next crossfade
    pub hold_secs: f64,
    /// Crossfade duration between segments and between chunks
    pub transition_secs: f64,
    pub crf: u8,
    pub preset: String,
    pub audio_bitrate: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            hold_secs: 3.0,
            transition_secs: 1.0,
            crf: 21,
            preset: "medium".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// Where the final artifact lands.
#[derive(Debug, Clone)]
pub enum OutputTarget {
    /// Caller-supplied path; the result is not stored in managed storage
    Explicit(PathBuf),
    /// Managed storage folder with a collision-safe generated filename
    Managed {
        /// Local path of the prepared output folder
        dir: PathBuf,
        /// Virtual prefix reported back to the host (e.g. "Journeys")
        virtual_prefix: String,
    },
}

/// How the result was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageDisposition {
    Managed { virtual_path: String },
    Unmanaged,
}

/// One composition request.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub segments: Vec<RenderSegment>,
    /// Journey name overlaid as a fading title on the opening segment
    pub title: Option<String>,
    /// Pool directory for the optional background track
    pub soundtrack_dir: Option<PathBuf>,
    pub output: OutputTarget,
}

/// The finished artifact.
#[derive(Debug, Clone)]
pub struct ComposeOutcome {
    pub path: PathBuf,
    pub disposition: StorageDisposition,
    pub duration_secs: f64,
}

/// Progress and diagnostics side channel.
///
/// Diagnostic lines stream as the renderer emits them; neither callback is
/// required.
#[derive(Clone, Default)]
pub struct ComposeObserver {
    pub on_progress: Option<Arc<dyn Fn(FfmpegProgress) + Send + Sync>>,
    pub on_diagnostic: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl ComposeObserver {
    pub fn silent() -> Self {
        Self::default()
    }

    fn progress_fn(&self) -> impl Fn(FfmpegProgress) + Send + 'static {
        let cb = self.on_progress.clone();
        move |p| {
            if let Some(cb) = &cb {
                cb(p);
            }
        }
    }

    fn line_fn(&self) -> impl Fn(&str) + Send + 'static {
        let cb = self.on_diagnostic.clone();
        move |line| {
            if let Some(cb) = &cb {
                cb(line);
            }
        }
    }
}

/// Chunked composer driving the external renderer.
pub struct VideoComposer {
    config: ComposerConfig,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl VideoComposer {
    pub fn new(config: ComposerConfig) -> Self {
        Self {
            config,
            cancel_rx: None,
        }
    }

    /// Set cancellation signal, forwarded to every renderer invocation.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    fn runner(&self) -> FfmpegRunner {
        match &self.cancel_rx {
            Some(rx) => FfmpegRunner::new().with_cancel(rx.clone()),
            None => FfmpegRunner::new(),
        }
    }

    /// Compose a segment plan into one video file.
    pub async fn compose(
        &self,
        request: ComposeRequest,
        observer: &ComposeObserver,
    ) -> MediaResult<ComposeOutcome> {
        if request.segments.is_empty() {
            return Err(MediaError::EmptyPlan);
        }
        check_ffmpeg()?;

        // Private working directory, removed on every exit path
        let work_dir = tempfile::tempdir()?;

        let result = self
            .compose_in(work_dir.path(), &request, observer)
            .await;

        if result.is_err() {
            counter!("tripreel_render_failures_total").increment(1);
        }
        result
    }

    async fn compose_in(
        &self,
        work_dir: &Path,
        request: &ComposeRequest,
        observer: &ComposeObserver,
    ) -> MediaResult<ComposeOutcome> {
        let hold = self.config.hold_secs;
        let transition = self.config.transition_secs;

        let any_large = any_large_input(&request.segments).await?;
        let chunks = chunk_segments(request.segments.clone(), any_large);
        info!(
            segments = request.segments.len(),
            chunks = chunks.len(),
            any_large,
            "composing journey video"
        );

        // Render each chunk to its own clip
        let mut rendered: Vec<(PathBuf, f64)> = Vec::with_capacity(chunks.len());
        let mut segment_offset = 0;
        for chunk in &chunks {
            let clip = work_dir.join(format!("chunk_{:03}.mp4", chunk.index));
            let title = (chunk.index == 0).then_some(request.title.as_deref()).flatten();

            let motion_durations = self.probe_motion_durations(chunk).await;
            let cmd = self.build_chunk_command(chunk, segment_offset, title, &motion_durations, &clip);
            self.runner()
                .run_observed(&cmd, observer.progress_fn(), observer.line_fn())
                .await?;

            counter!("tripreel_chunks_rendered_total").increment(1);
            rendered.push((clip, chunk_duration_secs(chunk.len(), hold, transition)));
            segment_offset += chunk.len();
        }

        // Pairwise crossfade merge, left to right
        let (merged, duration_secs) = self.merge_chunks(work_dir, rendered, observer).await?;

        // Optional soundtrack
        let soundtrack = match &request.soundtrack_dir {
            Some(dir) => pick_soundtrack(dir).await?,
            None => None,
        };
        let final_clip = match soundtrack {
            Some(track) => {
                self.mux_audio(work_dir, &merged, &track, duration_secs, observer)
                    .await?
            }
            None => merged,
        };

        let (path, disposition) = place_output(&final_clip, &request.output, request.title.as_deref()).await?;

        Ok(ComposeOutcome {
            path,
            disposition,
            duration_secs,
        })
    }

    async fn probe_motion_durations(&self, chunk: &RenderChunk) -> Vec<Option<f64>> {
        let mut durations = Vec::with_capacity(chunk.segments.len());
        for segment in &chunk.segments {
            match segment {
                RenderSegment::Motion { video } => {
                    durations.push(get_duration(video).await.ok());
                }
                _ => durations.push(None),
            }
        }
        durations
    }

    /// Build the renderer invocation for one chunk.
    fn build_chunk_command(
        &self,
        chunk: &RenderChunk,
        segment_offset: usize,
        title: Option<&str>,
        motion_durations: &[Option<f64>],
        output: &Path,
    ) -> FfmpegCommand {
        let hold = self.config.hold_secs;
        let transition = self.config.transition_secs;
        let total = segment_duration(hold, transition);

        let mut cmd = FfmpegCommand::new(output);
        let mut graph: Vec<String> = Vec::new();
        let mut labels: Vec<String> = Vec::new();
        let mut input_idx = 0;

        for (i, segment) in chunk.segments.iter().enumerate() {
            match segment {
                RenderSegment::Still { image } => {
                    cmd = cmd.input(InputSpec::new(image));
                }
                RenderSegment::Stack { images } => {
                    for image in images {
                        cmd = cmd.input(InputSpec::new(image).looped_image(total));
                    }
                }
                RenderSegment::Motion { video } => {
                    cmd = cmd.input(InputSpec::new(video));
                }
            }

            let label = format!("seg{i}");
            graph.push(segment_chain(
                segment,
                input_idx,
                segment_offset + i,
                motion_durations.get(i).copied().flatten(),
                hold,
                transition,
                &label,
            ));
            labels.push(label);
            input_idx += segment.input_count();
        }

        // Title overlay on the very first segment of the very first chunk
        if let Some(title) = title {
            graph.push(title_chain("seg0", "seg0t", title, hold));
            labels[0] = "seg0t".to_string();
        }

        let (xfade, final_label) = xfade_chain(&labels, hold, transition);
        let mut filter = graph.join(";");
        if !xfade.is_empty() {
            filter.push(';');
            filter.push_str(&xfade);
        }

        cmd.filter_complex(filter)
            .map(format!("[{final_label}]"))
            .video_codec("libx264")
            .preset(&self.config.preset)
            .crf(self.config.crf)
            .fps(FRAME_FPS)
            .pix_fmt("yuv420p")
            .no_audio()
    }

    /// Merge chunk clips left to right, deleting intermediates as we go.
    ///
    /// Each merge crossfades the tail of the accumulated clip into the head
    /// of the next, so the duration carried forward is
    /// `left + right - transition`.
    async fn merge_chunks(
        &self,
        work_dir: &Path,
        rendered: Vec<(PathBuf, f64)>,
        observer: &ComposeObserver,
    ) -> MediaResult<(PathBuf, f64)> {
        let transition = self.config.transition_secs;
        let mut iter = rendered.into_iter();
        let (mut acc_path, mut acc_duration) =
            iter.next().ok_or(MediaError::EmptyPlan)?;

        for (k, (next_path, next_duration)) in iter.enumerate() {
            let merged = work_dir.join(format!("merge_{k:03}.mp4"));
            let offset = (acc_duration - transition).max(0.0);

            let cmd = FfmpegCommand::new(&merged)
                .input(InputSpec::new(&acc_path))
                .input(InputSpec::new(&next_path))
                .filter_complex(format!(
                    "[0:v][1:v]xfade=transition=fade:duration={transition:.3}:offset={offset:.3}[v]"
                ))
                .map("[v]")
                .video_codec("libx264")
                .preset(&self.config.preset)
                .crf(self.config.crf)
                .pix_fmt("yuv420p")
                .no_audio();

            self.runner()
                .run_observed(&cmd, observer.progress_fn(), observer.line_fn())
                .await?;

            let _ = tokio::fs::remove_file(&acc_path).await;
            let _ = tokio::fs::remove_file(&next_path).await;

            acc_path = merged;
            acc_duration = acc_duration + next_duration - transition;
        }

        Ok((acc_path, acc_duration))
    }

    /// Mux the soundtrack under the merged video.
    ///
    /// The track loops if shorter than the video, trims to the final
    /// duration, and fades out; the video stream is copied and leads.
    async fn mux_audio(
        &self,
        work_dir: &Path,
        video: &Path,
        track: &Path,
        duration_secs: f64,
        observer: &ComposeObserver,
    ) -> MediaResult<PathBuf> {
        let output = work_dir.join("with_audio.mp4");

        let cmd = FfmpegCommand::new(&output)
            .input(InputSpec::new(video))
            .input(InputSpec::new(track).arg("-stream_loop").arg("-1"))
            .filter_complex(format!("[1:a]{}[a]", audio_filter(duration_secs)))
            .map("0:v")
            .map("[a]")
            .video_codec("copy")
            .audio_codec("aac")
            .audio_bitrate(&self.config.audio_bitrate)
            .shortest();

        self.runner()
            .run_observed(&cmd, observer.progress_fn(), observer.line_fn())
            .await?;

        let _ = tokio::fs::remove_file(video).await;
        Ok(output)
    }
}

/// Move the finished clip to its destination.
async fn place_output(
    produced: &Path,
    target: &OutputTarget,
    title: Option<&str>,
) -> MediaResult<(PathBuf, StorageDisposition)> {
    match target {
        OutputTarget::Explicit(path) => {
            move_file(produced, path).await?;
            info!(path = %path.display(), "output written to explicit path, not stored in managed storage");
            Ok((path.clone(), StorageDisposition::Unmanaged))
        }
        OutputTarget::Managed { dir, virtual_prefix } => {
            let base = format!(
                "{}_{}",
                sanitize_name(title.unwrap_or("journey")),
                chrono::Utc::now().format("%Y%m%d_%H%M%S")
            );
            let file_name = collision_safe_name(dir, &base).await;
            let dst = dir.join(&file_name);
            move_file(produced, &dst).await?;

            let virtual_path = format!("{}/{}", virtual_prefix.trim_end_matches('/'), file_name);
            info!(path = %dst.display(), %virtual_path, "output stored in managed storage");
            Ok((dst, StorageDisposition::Managed { virtual_path }))
        }
    }
}

/// Reduce a journey name to a safe filename stem.
fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_sep = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "journey".to_string()
    } else {
        trimmed.to_string()
    }
}

/// First free `{base}.mp4`, `{base}_2.mp4`, ... in the folder.
async fn collision_safe_name(dir: &Path, base: &str) -> String {
    let candidate = format!("{base}.mp4");
    if !dir.join(&candidate).exists() {
        return candidate;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{base}_{counter}.mp4");
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        counter += 1;
        if counter > 1000 {
            warn!(base, "collision counter exhausted, using uuid suffix");
            return format!("{base}_{}.mp4", uuid::Uuid::new_v4());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> VideoComposer {
        VideoComposer::new(ComposerConfig::default())
    }

    fn chunk_of(segments: Vec<RenderSegment>) -> RenderChunk {
        RenderChunk::new(0, segments)
    }

    #[test]
    fn test_chunk_command_graph() {
        let chunk = chunk_of(vec![
            RenderSegment::still("/p/a.jpg"),
            RenderSegment::stack("/p/l0.jpg", "/p/l1.jpg", "/p/l2.jpg"),
            RenderSegment::still("/p/b.jpg"),
        ]);
        let durations = vec![None, None, None];
        let cmd = composer().build_chunk_command(
            &chunk,
            0,
            None,
            &durations,
            Path::new("/tmp/chunk_000.mp4"),
        );
        let args = cmd.build_args();

        // 1 + 3 + 1 inputs
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 5);

        let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(filter.contains("zoompan"));
        assert!(filter.contains("vstack=inputs=3"));
        // The second still uses input index 4 (after the stack's three)
        assert!(filter.contains("[4:v]"));
        assert!(filter.contains("xfade"));
        assert!(args.contains(&"[vout]".to_string()));
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_title_only_on_first_chunk() {
        let chunk = chunk_of(vec![
            RenderSegment::still("/p/a.jpg"),
            RenderSegment::still("/p/b.jpg"),
        ]);
        let durations = vec![None, None];

        let with_title = composer().build_chunk_command(
            &chunk,
            0,
            Some("Rome May 2023 (12-15)"),
            &durations,
            Path::new("/tmp/c.mp4"),
        );
        let filter_pos = |args: &[String]| {
            args.iter().position(|a| a == "-filter_complex").unwrap() + 1
        };
        let args = with_title.build_args();
        let filter = &args[filter_pos(&args)];
        assert!(filter.contains("drawtext"));
        assert!(filter.contains("[seg0t]"));

        let without = composer().build_chunk_command(
            &chunk,
            2,
            None,
            &durations,
            Path::new("/tmp/c.mp4"),
        );
        let args = without.build_args();
        assert!(!args[filter_pos(&args)].contains("drawtext"));
    }

    #[test]
    fn test_pan_direction_continues_across_chunks() {
        let chunk = chunk_of(vec![RenderSegment::still("/p/a.jpg")]);
        let durations = vec![None];

        let first = composer()
            .build_chunk_command(&chunk, 0, None, &durations, Path::new("/tmp/c.mp4"))
            .build_args();
        let second = composer()
            .build_chunk_command(&chunk, 1, None, &durations, Path::new("/tmp/c.mp4"))
            .build_args();
        // Offsets 0 and 1 produce different pan directions
        assert_ne!(first, second);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(
            sanitize_name("Lisbon April 2024 (2-6)"),
            "Lisbon_April_2024_2-6"
        );
        assert_eq!(sanitize_name("***"), "journey");
        assert_eq!(sanitize_name("a  b"), "a_b");
    }

    #[tokio::test]
    async fn test_collision_safe_name() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(collision_safe_name(dir.path(), "trip").await, "trip.mp4");

        tokio::fs::write(dir.path().join("trip.mp4"), b"x").await.unwrap();
        assert_eq!(collision_safe_name(dir.path(), "trip").await, "trip_2.mp4");

        tokio::fs::write(dir.path().join("trip_2.mp4"), b"x").await.unwrap();
        assert_eq!(collision_safe_name(dir.path(), "trip").await, "trip_3.mp4");
    }

    #[tokio::test]
    async fn test_place_output_explicit_is_unmanaged() {
        let dir = tempfile::tempdir().unwrap();
        let produced = dir.path().join("render.mp4");
        tokio::fs::write(&produced, b"video").await.unwrap();
        let target = OutputTarget::Explicit(dir.path().join("out.mp4"));

        let (path, disposition) = place_output(&produced, &target, Some("Trip")).await.unwrap();
        assert_eq!(disposition, StorageDisposition::Unmanaged);
        assert!(path.exists());
        assert!(!produced.exists());
    }

    #[tokio::test]
    async fn test_place_output_managed_reports_virtual_path() {
        let dir = tempfile::tempdir().unwrap();
        let produced = dir.path().join("render.mp4");
        tokio::fs::write(&produced, b"video").await.unwrap();
        let out_dir = dir.path().join("managed");
        tokio::fs::create_dir_all(&out_dir).await.unwrap();

        let target = OutputTarget::Managed {
            dir: out_dir.clone(),
            virtual_prefix: "Journeys".to_string(),
        };
        let (path, disposition) = place_output(&produced, &target, Some("Rome May 2023"))
            .await
            .unwrap();
        assert!(path.starts_with(&out_dir));
        match disposition {
            StorageDisposition::Managed { virtual_path } => {
                assert!(virtual_path.starts_with("Journeys/Rome_May_2023_"));
                assert!(virtual_path.ends_with(".mp4"));
            }
            StorageDisposition::Unmanaged => panic!("expected managed disposition"),
        }
    }

    #[tokio::test]
    async fn test_empty_plan_rejected() {
        let request = ComposeRequest {
            segments: Vec::new(),
            title: None,
            soundtrack_dir: None,
            output: OutputTarget::Explicit(PathBuf::from("/tmp/out.mp4")),
        };
        let err = composer()
            .compose(request, &ComposeObserver::silent())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EmptyPlan));
    }
}
