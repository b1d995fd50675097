//! Read-only view over decoded image data.
//!
//! The decoding collaborator (the `image` crate in the CLI and benches)
//! hands us rows of 4-byte pixels in BLUE|GREEN|RED|ALPHA order. The alpha
//! byte is carried in the layout but never read.

use crate::{HistError, HistResult};

/// Bytes per pixel in the decoded interleaved layout.
pub const BYTES_PER_PIXEL: usize = 4;

/// Byte offset of the blue channel within a pixel.
pub const CHANNEL_BLUE: usize = 0;
/// Byte offset of the green channel within a pixel.
pub const CHANNEL_GREEN: usize = 1;
/// Byte offset of the red channel within a pixel.
pub const CHANNEL_RED: usize = 2;

/// A borrowed, validated view of decoded BGRA pixel data.
///
/// Construction checks the buffer-length invariant once, so every
/// accumulator downstream can index without bounds surprises.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    bytes: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> PixelBuffer<'a> {
    /// Wrap `bytes` as a `width` x `height` BGRA image.
    ///
    /// Returns `InvalidDimensions` for a zero width or height and
    /// `BufferTooSmall` when `bytes` cannot hold `width * height` pixels.
    pub fn new(bytes: &'a [u8], width: u32, height: u32) -> HistResult<Self> {
        if width == 0 || height == 0 {
            return Err(HistError::InvalidDimensions);
        }
        let needed = width as usize * height as usize * BYTES_PER_PIXEL;
        if bytes.len() < needed {
            return Err(HistError::BufferTooSmall);
        }
        Ok(Self {
            bytes,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels in the image.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Exactly the pixel data: `width * height * 4` bytes, trailing slack
    /// (if the caller's buffer was larger) excluded.
    pub fn pixel_bytes(&self) -> &'a [u8] {
        &self.bytes[..self.pixel_count() * BYTES_PER_PIXEL]
    }

    fn channel(&self, x: u32, y: u32, offset: usize) -> u8 {
        let base = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.bytes[base + offset]
    }

    /// Red channel value at `(x, y)`. Panics if out of bounds.
    pub fn red(&self, x: u32, y: u32) -> u8 {
        self.channel(x, y, CHANNEL_RED)
    }

    /// Green channel value at `(x, y)`. Panics if out of bounds.
    pub fn green(&self, x: u32, y: u32) -> u8 {
        self.channel(x, y, CHANNEL_GREEN)
    }

    /// Blue channel value at `(x, y)`. Panics if out of bounds.
    pub fn blue(&self, x: u32, y: u32) -> u8 {
        self.channel(x, y, CHANNEL_BLUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        let bytes = [0u8; 16];
        assert_eq!(
            PixelBuffer::new(&bytes, 0, 2).unwrap_err(),
            HistError::InvalidDimensions
        );
        assert_eq!(
            PixelBuffer::new(&bytes, 2, 0).unwrap_err(),
            HistError::InvalidDimensions
        );
    }

    #[test]
    fn test_rejects_short_buffer() {
        let bytes = [0u8; 15];
        assert_eq!(
            PixelBuffer::new(&bytes, 2, 2).unwrap_err(),
            HistError::BufferTooSmall
        );
    }

    #[test]
    fn test_channel_accessors_follow_bgra_order() {
        // One pixel: B=10, G=20, R=30, A=255
        let bytes = [10u8, 20, 30, 255];
        let px = PixelBuffer::new(&bytes, 1, 1).unwrap();
        assert_eq!(px.blue(0, 0), 10);
        assert_eq!(px.green(0, 0), 20);
        assert_eq!(px.red(0, 0), 30);
    }

    #[test]
    fn test_pixel_bytes_trims_slack() {
        let bytes = [0u8; 20];
        let px = PixelBuffer::new(&bytes, 2, 2).unwrap();
        assert_eq!(px.pixel_bytes().len(), 16);
        assert_eq!(px.pixel_count(), 4);
    }
}
