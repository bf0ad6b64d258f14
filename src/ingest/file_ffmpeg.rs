//! Local file frame source using FFmpeg.
//!
//! Frames are decoded in-memory, converted to RGB24 and stamped with their
//! media time derived from the stream frame rate.

use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;

use super::file::{FileConfig, FileStats};
use crate::frame::Frame;

pub(crate) struct FfmpegFileSource {
    config: FileConfig,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    fps: f64,
    announced_frames: Option<u64>,
    frame_count: u64,
    eof_sent: bool,
}

impl FfmpegFileSource {
    pub(crate) fn new(config: FileConfig) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&config.path)
            .with_context(|| format!("failed to open video '{}' with ffmpeg", config.path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow::anyhow!("file has no video track"))?;
        let stream_index = input_stream.index();

        let rate = f64::from(input_stream.avg_frame_rate());
        let fps = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            f64::from(config.target_fps)
        };
        let announced_frames = u64::try_from(input_stream.frames())
            .ok()
            .filter(|frames| *frames > 0);

        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        Ok(Self {
            config,
            input,
            stream_index,
            decoder,
            scaler,
            fps,
            announced_frames,
            frame_count: 0,
            eof_sent: false,
        })
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        log::info!(
            "FileSource: connected to {} (ffmpeg, {:.2} fps)",
            self.config.path,
            self.fps
        );
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.limit_reached() {
            return Ok(None);
        }

        let mut decoded = ffmpeg::frame::Video::empty();

        if !self.eof_sent {
            // A single packet may decode to several frames.
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.emit(&decoded).map(Some);
            }
            let mut got_frame = false;
            for (stream, packet) in self.input.packets() {
                if stream.index() != self.stream_index {
                    continue;
                }

                self.decoder
                    .send_packet(&packet)
                    .context("send packet to ffmpeg decoder")?;

                if self.decoder.receive_frame(&mut decoded).is_ok() {
                    got_frame = true;
                    break;
                }
            }
            if got_frame {
                return self.emit(&decoded).map(Some);
            }
            self.decoder.send_eof().context("flush ffmpeg decoder")?;
            self.eof_sent = true;
        }

        // Drain frames still buffered in the decoder.
        if self.decoder.receive_frame(&mut decoded).is_ok() {
            return self.emit(&decoded).map(Some);
        }
        Ok(None)
    }

    pub(crate) fn total_frames(&self) -> Option<u64> {
        match (self.announced_frames, self.config.max_frames) {
            (Some(a), Some(m)) => Some(a.min(m)),
            (a, m) => a.or(m),
        }
    }

    pub(crate) fn stats(&self) -> FileStats {
        FileStats {
            frames_captured: self.frame_count,
            path: self.config.path.clone(),
        }
    }

    fn limit_reached(&self) -> bool {
        self.config
            .max_frames
            .is_some_and(|max| self.frame_count >= max)
    }

    fn emit(&mut self, decoded: &ffmpeg::frame::Video) -> Result<Frame> {
        let mut rgb_frame = ffmpeg::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb_frame)
            .context("scale frame to RGB")?;
        let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;

        let index = self.frame_count;
        self.frame_count += 1;
        Ok(Frame::new(
            pixels,
            width,
            height,
            index,
            index as f64 / self.fps,
        ))
    }
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0) as usize;
    let data = frame.data(0);

    if stride == row_bytes {
        let bytes = data
            .get(..row_bytes * height as usize)
            .context("ffmpeg frame is shorter than its dimensions")?;
        return Ok((bytes.to_vec(), width, height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok((pixels, width, height))
}
