//! Frame ingestion sources.
//!
//! - Local video files (feature: ingest-file-ffmpeg)
//! - Synthetic `stub://` streams (testing, demos)
//!
//! Sources produce [`Frame`](crate::frame::Frame) values in stream order and
//! signal end of stream with `Ok(None)`.

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;

pub use file::{is_stub_path, FileConfig, FileSource, FileStats};
