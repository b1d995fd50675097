//! Histogram record and the sequential reference accumulator.
//!
//! `Histogram` is the shared result type for every accumulation path; the
//! OpenCL backend produces the same record from its flat device buffer.

use crate::pixels::{PixelBuffer, BYTES_PER_PIXEL, CHANNEL_BLUE, CHANNEL_GREEN, CHANNEL_RED};

use std::io::{self, Write};

/// Number of intensity bins per channel.
pub const BINS: usize = 256;

/// Per-channel bin counts for one image.
///
/// Field order matches the flat device result buffer: R, then G, then B,
/// 256 `u32` counters each. Equality is pairwise over all 768 counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    /// Count of each red intensity value (index = intensity).
    pub r: [u32; BINS],
    /// Count of each green intensity value.
    pub g: [u32; BINS],
    /// Count of each blue intensity value.
    pub b: [u32; BINS],
}

impl Histogram {
    /// Create a new, zeroed histogram.
    pub fn new() -> Self {
        Self {
            r: [0u32; BINS],
            g: [0u32; BINS],
            b: [0u32; BINS],
        }
    }

    /// Sequential reference accumulator: one row-major pass over the image,
    /// incrementing one bin per channel per pixel.
    pub fn compute(pixels: &PixelBuffer) -> Self {
        let mut h = Self::new();
        for px in pixels.pixel_bytes().chunks_exact(BYTES_PER_PIXEL) {
            h.b[px[CHANNEL_BLUE] as usize] += 1;
            h.g[px[CHANNEL_GREEN] as usize] += 1;
            h.r[px[CHANNEL_RED] as usize] += 1;
        }
        h
    }

    /// Build a histogram from the flat `[R | G | B]` counter layout the
    /// device result buffer uses.
    pub fn from_flat(counts: &[u32; 3 * BINS]) -> Self {
        let mut h = Self::new();
        h.r.copy_from_slice(&counts[..BINS]);
        h.g.copy_from_slice(&counts[BINS..2 * BINS]);
        h.b.copy_from_slice(&counts[2 * BINS..]);
        h
    }

    /// Per-channel totals. Each must equal `width * height` for a
    /// correctly accumulated image (every pixel contributes exactly one
    /// count per channel).
    pub fn channel_sums(&self) -> (u64, u64, u64) {
        let sum = |bins: &[u32; BINS]| bins.iter().map(|&c| c as u64).sum();
        (sum(&self.r), sum(&self.g), sum(&self.b))
    }

    /// Write the non-zero bins as `<value><channel letter>\t<count>` lines,
    /// blue/green/red per intensity value.
    pub fn write_sparse<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Colour\tNo. Pixels")?;
        for i in 0..BINS {
            if self.b[i] > 0 {
                writeln!(out, "{}B\t{}", i, self.b[i])?;
            }
            if self.g[i] > 0 {
                writeln!(out, "{}G\t{}", i, self.g[i])?;
            }
            if self.r[i] > 0 {
                writeln!(out, "{}R\t{}", i, self.r[i])?;
            }
        }
        Ok(())
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}
