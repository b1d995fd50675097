/// Validation tests for the histogram implementations.
///
/// These tests verify:
/// 1. **Conservation** - each channel's 256 bins sum to `width * height`
/// 2. **Known records** - degenerate, uniform, and ramp images produce
///    exactly the expected bin counts
/// 3. **Partition soundness** - padded extents are the smallest whole
///    multiple of the group edge covering the (clamped) image
/// 4. **Edge cases** - single-pixel images, extents below the clamp floors
#[cfg(test)]
mod tests {
    use crate::histogram::Histogram;
    use crate::partition::WorkPartition;
    use crate::pixels::PixelBuffer;

    // ---------------------------------------------------------------
    // Helpers: synthetic BGRA images
    // ---------------------------------------------------------------

    /// Fill a `width` x `height` image from a per-pixel (r, g, b) function.
    fn make_bgra(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> (u8, u8, u8)) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let (r, g, b) = f(x, y);
                bytes.extend_from_slice(&[b, g, r, 255]);
            }
        }
        bytes
    }

    /// Deterministic pseudo-random image (xorshift32).
    fn noise_bgra(width: u32, height: u32) -> Vec<u8> {
        let mut state = 0x9e3779b9u32;
        make_bgra(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            (r, g, b)
        })
    }

    // ---------------------------------------------------------------
    // Conservation
    // ---------------------------------------------------------------

    #[test]
    fn test_conservation_on_noise_image() {
        let bytes = noise_bgra(317, 141); // awkward, non-round dimensions
        let px = PixelBuffer::new(&bytes, 317, 141).unwrap();
        let h = Histogram::compute(&px);
        let n = 317u64 * 141;
        assert_eq!(h.channel_sums(), (n, n, n));
    }

    // ---------------------------------------------------------------
    // Known records
    // ---------------------------------------------------------------

    #[test]
    fn test_degenerate_single_pixel() {
        let bytes = make_bgra(1, 1, |_, _| (17, 34, 51));
        let px = PixelBuffer::new(&bytes, 1, 1).unwrap();
        let h = Histogram::compute(&px);
        assert_eq!(h.r[17], 1);
        assert_eq!(h.g[34], 1);
        assert_eq!(h.b[51], 1);
        assert_eq!(h.channel_sums(), (1, 1, 1));
    }

    #[test]
    fn test_uniform_image() {
        let (w, h) = (100u32, 37u32);
        let bytes = make_bgra(w, h, |_, _| (200, 100, 50));
        let px = PixelBuffer::new(&bytes, w, h).unwrap();
        let hist = Histogram::compute(&px);
        let n = (w * h) as u32;
        assert_eq!(hist.r[200], n);
        assert_eq!(hist.g[100], n);
        assert_eq!(hist.b[50], n);
        // Every other bin is zero.
        assert_eq!(hist.r.iter().filter(|&&c| c > 0).count(), 1);
        assert_eq!(hist.g.iter().filter(|&&c| c > 0).count(), 1);
        assert_eq!(hist.b.iter().filter(|&&c| c > 0).count(), 1);
    }

    #[test]
    fn test_monochrome_ramp() {
        // 256x1 image, red = column index, green/blue fixed at 0.
        let bytes = make_bgra(256, 1, |x, _| (x as u8, 0, 0));
        let px = PixelBuffer::new(&bytes, 256, 1).unwrap();
        let h = Histogram::compute(&px);
        for i in 0..256 {
            assert_eq!(h.r[i], 1, "R bin {}", i);
        }
        assert_eq!(h.g[0], 256);
        assert_eq!(h.b[0], 256);
    }

    // ---------------------------------------------------------------
    // Partition soundness
    // ---------------------------------------------------------------

    #[test]
    fn test_partition_invariant_over_sweep() {
        for &(w, h) in &[(1u32, 1u32), (640, 480), (1919, 1079), (8000, 8000)] {
            for &wg in &[4usize, 8, 16, 32] {
                let p = WorkPartition::for_image(w, h, wg);
                assert_eq!(p.global[0], p.groups[0] * p.local[0]);
                assert_eq!(p.global[1], p.groups[1] * p.local[1]);
                assert!(p.global[0] >= h as usize);
                assert!(p.global[1] >= w as usize);
                assert_eq!(p.total_items(), p.global[0] * p.global[1]);
                assert_eq!(p.group_count(), p.groups[0] * p.groups[1]);
            }
        }
    }

    #[test]
    fn test_partition_padding_never_counted_by_reference() {
        // The reference accumulator walks pixels, not work-items: its sums
        // must equal the pixel count even when the partition over-provisions
        // heavily.
        let (w, h) = (5u32, 2u32);
        let bytes = noise_bgra(w, h);
        let px = PixelBuffer::new(&bytes, w, h).unwrap();
        let p = WorkPartition::for_image(w, h, 16);
        assert!(p.total_items() > px.pixel_count());
        let hist = Histogram::compute(&px);
        let n = (w * h) as u64;
        assert_eq!(hist.channel_sums(), (n, n, n));
    }
}
