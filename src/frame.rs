//! Decoded video frames.
//!
//! A `Frame` owns tightly packed RGB24 pixels plus its position in the
//! stream. Frames are handed to the detector and dropped; nothing in the
//! crate stores them.

/// One decoded RGB24 frame.
pub struct Frame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Zero-based position in the stream.
    pub index: u64,
    /// Media time of the frame in seconds (`index / fps`).
    pub timestamp_secs: f64,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, index: u64, timestamp_secs: f64) -> Self {
        Self {
            pixels,
            width,
            height,
            index,
            timestamp_secs,
        }
    }

    /// Blank frame of the given size, mostly for tests.
    pub fn blank(width: u32, height: u32, index: u64, timestamp_secs: f64) -> Self {
        let len = (width as usize) * (height as usize) * 3;
        Self::new(vec![0u8; len], width, height, index, timestamp_secs)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Raw byte length.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("index", &self.index)
            .field("timestamp_secs", &self.timestamp_secs)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_frame_has_rgb_size() {
        let frame = Frame::blank(4, 3, 7, 0.5);
        assert_eq!(frame.byte_len(), 36);
        assert_eq!(frame.index, 7);
        assert!(frame.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn debug_omits_pixels() {
        let frame = Frame::blank(2, 2, 0, 0.0);
        let dbg = format!("{:?}", frame);
        assert!(dbg.contains("bytes: 12"));
    }
}
