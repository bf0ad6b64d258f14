//! Local file frame source.
//!
//! This module provides `FileSource` for ingesting frames from local video files.
//! The file source is responsible for:
//! - Reading frames from a local video file (no network access)
//! - Decoding video frames in-memory to RGB24
//! - Stamping each frame with its media time
//!
//! `stub://<name>` paths produce a finite synthetic stream instead.

use anyhow::{anyhow, Result};

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use crate::frame::Frame;

const STUB_SCHEME: &str = "stub://";
const DEFAULT_STUB_FRAMES: u64 = 300;

/// Configuration for a local file source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Local file path (e.g., "/var/lib/sentry/lobby.mp4") or `stub://name`.
    pub path: String,
    /// Frame rate used when the container does not report one, and for
    /// synthetic streams.
    pub target_fps: u32,
    /// Synthetic frame width.
    pub width: u32,
    /// Synthetic frame height.
    pub height: u32,
    /// Stop after this many frames. Synthetic streams default to 300.
    pub max_frames: Option<u64>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            target_fps: 30,
            width: 640,
            height: 480,
            max_frames: None,
        }
    }
}

/// Local file frame source.
pub struct FileSource {
    backend: FileBackend,
}

enum FileBackend {
    Synthetic(SyntheticFileSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        if config.target_fps == 0 {
            return Err(anyhow!("target_fps must be >= 1"));
        }
        if is_stub_path(&config.path) {
            Ok(Self {
                backend: FileBackend::Synthetic(SyntheticFileSource::new(config)),
            })
        } else {
            #[cfg(feature = "ingest-file-ffmpeg")]
            {
                Ok(Self {
                    backend: FileBackend::Ffmpeg(FfmpegFileSource::new(config)?),
                })
            }
            #[cfg(not(feature = "ingest-file-ffmpeg"))]
            {
                Err(anyhow!(
                    "video decoding requires the ingest-file-ffmpeg feature ({})",
                    config.path
                ))
            }
        }
    }

    /// Connect to the file source.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.connect(),
        }
    }

    /// Decode the next frame, or `None` at end of stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => Ok(source.next_frame()),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.next_frame(),
        }
    }

    /// Frame count announced by the container, when known.
    pub fn total_frames(&self) -> Option<u64> {
        match &self.backend {
            FileBackend::Synthetic(source) => Some(source.total_frames()),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.total_frames(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> FileStats {
        match &self.backend {
            FileBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.stats(),
        }
    }
}

/// Statistics for a file source.
#[derive(Clone, Debug)]
pub struct FileStats {
    pub frames_captured: u64,
    pub path: String,
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticFileSource {
    config: FileConfig,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticFileSource {
    fn new(config: FileConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            scene_state: 0,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("FileSource: connected to {} (synthetic)", self.config.path);
        Ok(())
    }

    fn total_frames(&self) -> u64 {
        self.config.max_frames.unwrap_or(DEFAULT_STUB_FRAMES)
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if self.frame_count >= self.total_frames() {
            return None;
        }
        let index = self.frame_count;
        self.frame_count += 1;

        let pixels = self.generate_synthetic_pixels(index);
        let timestamp_secs = index as f64 / f64::from(self.config.target_fps);
        Some(Frame::new(
            pixels,
            self.config.width,
            self.config.height,
            index,
            timestamp_secs,
        ))
    }

    fn generate_synthetic_pixels(&mut self, index: u64) -> Vec<u8> {
        let pixel_count = (self.config.width as usize) * (self.config.height as usize) * 3;
        if index % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + index + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }

    fn stats(&self) -> FileStats {
        FileStats {
            frames_captured: self.frame_count,
            path: self.config.path.clone(),
        }
    }
}

/// True for synthetic `stub://` sources, which have no file on disk.
pub fn is_stub_path(path: &str) -> bool {
    path.starts_with(STUB_SCHEME)
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if is_stub_path(path) {
        return true;
    }
    !path.contains("://")
}
