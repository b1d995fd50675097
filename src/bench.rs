//! Benchmark driver: equivalence-gated CPU vs GPU timing.
//!
//! One host thread drives everything; each accumulator call blocks until
//! its result is on the host. A configuration's timings are only reported
//! when the parallel record matches the sequential reference bin-for-bin —
//! a mismatch yields [`PerfSample::INVALID`], never a speedup number.

#[cfg(feature = "opencl")]
use crate::histogram::Histogram;
#[cfg(feature = "opencl")]
use crate::opencl::OpenClEngine;
#[cfg(feature = "opencl")]
use crate::pixels::PixelBuffer;
#[cfg(feature = "opencl")]
use crate::HistResult;
#[cfg(feature = "opencl")]
use std::time::Instant;

/// Which accumulation path a measurement exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorKind {
    /// Single-threaded row-major CPU pass (the reference).
    Sequential,
    /// OpenCL two-level reduction.
    Parallel,
}

/// Mean wall-clock times and speedup for one (image, group_dim)
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfSample {
    /// Mean sequential time per run, seconds.
    pub t_cpu: f64,
    /// Mean parallel time per run, seconds.
    pub t_gpu: f64,
    /// `t_cpu / t_gpu`.
    pub speedup: f64,
}

impl PerfSample {
    /// Sentinel reported when the parallel result disagreed with the
    /// sequential reference.
    pub const INVALID: PerfSample = PerfSample {
        t_cpu: 0.0,
        t_gpu: 0.0,
        speedup: 0.0,
    };

    /// Whether this sample carries real timings (false for the mismatch
    /// sentinel).
    pub fn is_valid(&self) -> bool {
        self.t_cpu > 0.0 && self.t_gpu > 0.0
    }
}

/// Run one accumulator `samples` times, returning the final record and the
/// mean seconds per run (total elapsed on a monotonic clock, divided by N).
#[cfg(feature = "opencl")]
fn run(
    kind: AccumulatorKind,
    engine: &mut OpenClEngine,
    pixels: &PixelBuffer,
    group_dim: usize,
    samples: u32,
) -> HistResult<(Histogram, f64)> {
    debug_assert!(samples > 0);
    let start = Instant::now();
    let mut record = Histogram::new();
    for _ in 0..samples {
        record = match kind {
            AccumulatorKind::Sequential => Histogram::compute(pixels),
            AccumulatorKind::Parallel => engine.histogram(pixels, group_dim)?,
        };
    }
    let mean = start.elapsed().as_secs_f64() / samples as f64;
    Ok((record, mean))
}

/// Measure mean CPU and GPU histogram times for one image and workgroup
/// size, `samples_cpu` / `samples_gpu` runs per path.
///
/// Fatal device errors propagate as `Err`; a clean run whose parallel
/// record disagrees with the sequential reference returns
/// `Ok(PerfSample::INVALID)`.
#[cfg(feature = "opencl")]
pub fn measure(
    engine: &mut OpenClEngine,
    pixels: &PixelBuffer,
    group_dim: usize,
    samples_cpu: u32,
    samples_gpu: u32,
) -> HistResult<PerfSample> {
    let (reference, t_cpu) = run(
        AccumulatorKind::Sequential,
        engine,
        pixels,
        group_dim,
        samples_cpu,
    )?;
    let (parallel, t_gpu) = run(
        AccumulatorKind::Parallel,
        engine,
        pixels,
        group_dim,
        samples_gpu,
    )?;

    if reference != parallel {
        return Ok(PerfSample::INVALID);
    }

    Ok(PerfSample {
        t_cpu,
        t_gpu,
        speedup: t_cpu / t_gpu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel_is_not_valid() {
        assert!(!PerfSample::INVALID.is_valid());
    }

    #[test]
    fn test_real_sample_is_valid() {
        let s = PerfSample {
            t_cpu: 0.5,
            t_gpu: 0.1,
            speedup: 5.0,
        };
        assert!(s.is_valid());
    }

    #[test]
    fn test_zeroed_gpu_time_is_invalid() {
        let s = PerfSample {
            t_cpu: 0.5,
            t_gpu: 0.0,
            speedup: 0.0,
        };
        assert!(!s.is_valid());
    }
}
