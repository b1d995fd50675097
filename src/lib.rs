//! rgbhist: per-channel (R/G/B) pixel-intensity histograms computed two
//! ways — a sequential CPU reference pass and an OpenCL two-level
//! reduction — plus a benchmark driver that verifies the two agree
//! bin-for-bin before reporting a speedup.
//!
//! The GPU backend lives behind the `opencl` feature:
//! ```bash
//! cargo build --features opencl
//! ```

pub mod bench;
pub mod histogram;
pub mod partition;
pub mod pixels;

#[cfg(feature = "opencl")]
pub mod opencl;

#[cfg(test)]
mod validation;

/// Error types for rgbhist operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistError {
    /// Pixel buffer is shorter than `width * height * 4`.
    BufferTooSmall,
    /// Width or height is zero.
    InvalidDimensions,
    /// No OpenCL platform or device is available.
    NoDevice,
    /// Kernel compilation failed; carries the device build log.
    BuildFailed(String),
    /// An OpenCL call failed after setup (allocation, dispatch, transfer).
    DeviceFailure,
}

impl std::fmt::Display for HistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "pixel buffer too small for image dimensions"),
            Self::InvalidDimensions => write!(f, "image dimensions must be positive"),
            Self::NoDevice => write!(f, "no OpenCL device available"),
            Self::BuildFailed(log) => write!(f, "kernel build failed:\n{log}"),
            Self::DeviceFailure => write!(f, "OpenCL device operation failed"),
        }
    }
}

impl std::error::Error for HistError {}

pub type HistResult<T> = Result<T, HistError>;
