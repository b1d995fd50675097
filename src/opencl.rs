//! OpenCL backend: the parallel histogram accumulator.
//!
//! Partitions the image across 2-D workgroups; each group privatizes the
//! 768 counters into `__local` memory, accumulates with atomic adds, and
//! merges into the global result buffer once all its pixels are counted.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │  Host (CPU)  │────▶│  OpenCL Device    │────▶│  Host (CPU)  │
//! │ BGRA pixels  │     │ local histograms  │     │ 768 counters │
//! │              │     │ + atomic merge    │     │  → Histogram │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Feature Gate
//!
//! This module is only available when compiled with the `opencl` feature:
//! ```bash
//! cargo build --features opencl
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use rgbhist::opencl::OpenClEngine;
//! use rgbhist::pixels::PixelBuffer;
//!
//! let mut engine = OpenClEngine::new()?;
//! println!("Using device: {}", engine.device_name());
//!
//! let bytes = vec![0u8; 64 * 64 * 4];
//! let pixels = PixelBuffer::new(&bytes, 64, 64)?;
//! let hist = engine.histogram(&pixels, 16)?;
//! # Ok(())
//! # }
//! ```

use crate::histogram::{Histogram, BINS};
use crate::partition::WorkPartition;
use crate::pixels::PixelBuffer;
use crate::{HistError, HistResult};

use opencl3::command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE};
use opencl3::context::Context;
use opencl3::device::{get_all_devices, Device, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_GPU};
use opencl3::event::Event;
use opencl3::kernel::{ExecuteKernel, Kernel};
use opencl3::memory::{Buffer, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE};
use opencl3::program::Program;
use opencl3::types::{cl_device_type, cl_uint, CL_BLOCKING};

use std::ptr;


/// Embedded OpenCL kernel source: two-level local/global histogram
/// reduction, one work-item per pixel.
const HISTOGRAM_KERNEL_SOURCE: &str = include_str!("../kernels/histogram.cl");

/// Flat counter count in the device result buffer (R, G, B banks of 256).
const FLAT_BINS: usize = 3 * BINS;

/// Environment variable that enables per-dispatch timing on `new()`.
const PROFILE_ENV: &str = "RGBHIST_GPU_PROFILE";

/// Information about a discovered OpenCL device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Human-readable device name (e.g. "NVIDIA GeForce RTX 3080").
    pub name: String,
    /// Device vendor string.
    pub vendor: String,
    /// Whether this is a GPU device (vs CPU or accelerator).
    pub is_gpu: bool,
    /// Maximum work-group size supported by the device.
    pub max_work_group_size: usize,
    /// Global memory size in bytes.
    pub global_mem_size: u64,
}

/// Probe all available OpenCL devices without creating an engine.
///
/// Returns an empty vec if no OpenCL runtime is installed or no devices
/// are found (never errors).
pub fn probe_devices() -> Vec<DeviceInfo> {
    let device_ids = match get_all_devices(CL_DEVICE_TYPE_ALL) {
        Ok(ids) => ids,
        Err(_) => return Vec::new(),
    };

    device_ids
        .into_iter()
        .map(|id| {
            let dev = Device::new(id);
            let name = dev.name().unwrap_or_default();
            let vendor = dev.vendor().unwrap_or_default();
            let dev_type: cl_device_type = dev.dev_type().unwrap_or(0);
            let is_gpu = (dev_type & CL_DEVICE_TYPE_GPU) != 0;
            let max_wg = dev.max_work_group_size().unwrap_or(1);
            let global_mem = dev.global_mem_size().unwrap_or(0);
            DeviceInfo {
                name: name.trim().to_string(),
                vendor: vendor.trim().to_string(),
                is_gpu,
                max_work_group_size: max_wg,
                global_mem_size: global_mem,
            }
        })
        .collect()
}

/// Return the number of available OpenCL devices.
///
/// Lightweight probe: no contexts, no kernel compilation. Returns 0 if
/// OpenCL is not available.
pub fn device_count() -> usize {
    get_all_devices(CL_DEVICE_TYPE_ALL)
        .map(|ids| ids.len())
        .unwrap_or(0)
}

/// OpenCL compute engine — the compute handle for the parallel accumulator.
///
/// Owns the device, context, command queue, compiled histogram kernel, and
/// the persistent 768-counter result buffer. Create one engine at startup
/// and reuse it across calls; all handles are released when the engine is
/// dropped. The per-call image buffer is the only allocation made per
/// dispatch.
///
/// Note: `Debug` is implemented manually because the OpenCL handle types
/// from `opencl3` don't implement `Debug`.
pub struct OpenClEngine {
    _device: Device,
    context: Context,
    queue: CommandQueue,
    /// Compiled two-level reduction kernel.
    kernel_histogram: Kernel,
    /// Persistent device result buffer, zeroed before every dispatch.
    hist_buf: Buffer<cl_uint>,
    /// Device name for diagnostics.
    device_name: String,
    /// Maximum work-group size.
    max_work_group_size: usize,
    /// Whether the selected device is a CPU (vs GPU/accelerator).
    is_cpu: bool,
    /// Whether profiling is enabled (CL_QUEUE_PROFILING_ENABLE).
    profiling: bool,
}

// SAFETY: OpenCL 1.2+ guarantees thread safety for context, command queue,
// kernel, and memory objects. The raw pointers in opencl3 types are opaque
// handles to the OpenCL runtime, which serializes access internally. Host
// orchestration is single-threaded here; `histogram` takes `&mut self`, so
// concurrent dispatches need external synchronization anyway.
unsafe impl Send for OpenClEngine {}
unsafe impl Sync for OpenClEngine {}

impl std::fmt::Debug for OpenClEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenClEngine")
            .field("device_name", &self.device_name)
            .field("max_work_group_size", &self.max_work_group_size)
            .finish_non_exhaustive()
    }
}

impl OpenClEngine {
    /// Create a new engine, selecting the best available GPU device.
    ///
    /// Prefers GPU devices over CPU/accelerator. Falls back to the first
    /// available device if no GPU is found. Profiling is enabled when the
    /// `RGBHIST_GPU_PROFILE` environment variable is set.
    ///
    /// Returns `NoDevice` if no OpenCL devices are available and
    /// `BuildFailed` (carrying the build log) if kernel compilation fails.
    pub fn new() -> HistResult<Self> {
        let profiling = std::env::var_os(PROFILE_ENV).is_some();
        Self::create(true, profiling)
    }

    /// Create a new engine with explicit GPU preference.
    ///
    /// If `prefer_gpu` is true, selects the first GPU device (falling back
    /// to any device). If false, selects the first available device
    /// regardless of type.
    pub fn with_device_preference(prefer_gpu: bool) -> HistResult<Self> {
        Self::create(prefer_gpu, false)
    }

    /// Create a new engine with profiling enabled.
    ///
    /// When profiling is on, `CL_QUEUE_PROFILING_ENABLE` is set on the
    /// command queue and every dispatch prints upload/kernel/readback
    /// timing via `eprintln!`.
    pub fn with_profiling(profiling: bool) -> HistResult<Self> {
        Self::create(true, profiling)
    }

    /// Internal constructor shared by all public constructors.
    fn create(prefer_gpu: bool, profiling: bool) -> HistResult<Self> {
        // Discover devices
        let all_ids = get_all_devices(CL_DEVICE_TYPE_ALL).map_err(|_| HistError::NoDevice)?;

        if all_ids.is_empty() {
            return Err(HistError::NoDevice);
        }

        // Select device: prefer GPU if requested
        let selected_id = if prefer_gpu {
            let gpu_ids = get_all_devices(CL_DEVICE_TYPE_GPU).unwrap_or_default();
            if gpu_ids.is_empty() {
                all_ids[0]
            } else {
                gpu_ids[0]
            }
        } else {
            all_ids[0]
        };

        let device = Device::new(selected_id);
        let device_name = device.name().unwrap_or_default().trim().to_string();
        let max_work_group_size = device.max_work_group_size().unwrap_or(1);
        let dev_type: cl_device_type = device.dev_type().unwrap_or(0);
        let is_cpu = (dev_type & CL_DEVICE_TYPE_GPU) == 0;

        let context = Context::from_device(&device).map_err(|_| HistError::NoDevice)?;

        // Use the OpenCL 1.2 API (create_default) instead of the 2.0
        // create_default_with_properties, because macOS only supports
        // OpenCL 1.2.
        let queue_props = if profiling {
            CL_QUEUE_PROFILING_ENABLE
        } else {
            0
        };
        #[allow(deprecated)]
        let queue = CommandQueue::create_default(&context, queue_props)
            .map_err(|_| HistError::DeviceFailure)?;

        // Compile the histogram kernel; surface the build log on failure
        // so a broken kernel is diagnosable rather than silently wrong.
        let program =
            Program::create_and_build_from_source(&context, HISTOGRAM_KERNEL_SOURCE, "-Werror")
                .map_err(HistError::BuildFailed)?;

        let kernel_histogram =
            Kernel::create(&program, "calc_histogram").map_err(|_| HistError::DeviceFailure)?;

        // Persistent result buffer: allocated once, zeroed per dispatch.
        let hist_buf = unsafe {
            Buffer::<cl_uint>::create(&context, CL_MEM_READ_WRITE, FLAT_BINS, ptr::null_mut())
                .map_err(|_| HistError::DeviceFailure)?
        };

        Ok(Self {
            _device: device,
            context,
            queue,
            kernel_histogram,
            hist_buf,
            device_name,
            max_work_group_size,
            is_cpu,
            profiling,
        })
    }

    /// Name of the selected device.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Maximum work-group size of the selected device.
    pub fn max_work_group_size(&self) -> usize {
        self.max_work_group_size
    }

    /// Whether the selected device is a CPU rather than a GPU/accelerator.
    pub fn is_cpu_device(&self) -> bool {
        self.is_cpu
    }

    /// Whether profiling is enabled on this engine.
    pub fn profiling(&self) -> bool {
        self.profiling
    }

    /// Extract elapsed time in milliseconds from a completed OpenCL event.
    ///
    /// Requires the command queue to have been created with
    /// `CL_QUEUE_PROFILING_ENABLE`. Returns `None` if profiling is
    /// disabled or the event doesn't have timing data.
    pub fn event_elapsed_ms(event: &Event) -> Option<f64> {
        let start = event.profiling_command_start().ok()?;
        let end = event.profiling_command_end().ok()?;
        Some((end - start) as f64 / 1_000_000.0)
    }

    /// Log timing for a completed event when profiling is enabled.
    fn profile_event(&self, label: &str, event: &Event) {
        if self.profiling {
            if let Some(ms) = Self::event_elapsed_ms(event) {
                eprintln!("[rgbhist-gpu] {label}: {ms:.3} ms");
            }
        }
    }

    /// Compute the per-channel histogram of `pixels` on the device.
    ///
    /// One work-item per pixel, square workgroups of `group_dim` items per
    /// edge (see [`WorkPartition`]). The call blocks until the device has
    /// finished and the 768 counters have been read back. No stale counts
    /// survive between calls: the result buffer is zeroed before every
    /// dispatch.
    pub fn histogram(&mut self, pixels: &PixelBuffer, group_dim: usize) -> HistResult<Histogram> {
        let partition = WorkPartition::for_image(pixels.width(), pixels.height(), group_dim);
        let data = pixels.pixel_bytes();

        // Per-call image buffer, read-only on device, released on drop.
        let mut img_buf = unsafe {
            Buffer::<u8>::create(&self.context, CL_MEM_READ_ONLY, data.len(), ptr::null_mut())
                .map_err(|_| HistError::DeviceFailure)?
        };

        let write_event = unsafe {
            self.queue
                .enqueue_write_buffer(&mut img_buf, CL_BLOCKING, 0, data, &[])
                .map_err(|_| HistError::DeviceFailure)?
        };
        write_event.wait().map_err(|_| HistError::DeviceFailure)?;
        self.profile_event("image upload", &write_event);

        // Zero the persistent result buffer; stale counts from a prior run
        // must never leak into a new computation.
        let zeros = [0u32; FLAT_BINS];
        let zero_event = unsafe {
            self.queue
                .enqueue_write_buffer(&mut self.hist_buf, CL_BLOCKING, 0, &zeros, &[])
                .map_err(|_| HistError::DeviceFailure)?
        };
        zero_event.wait().map_err(|_| HistError::DeviceFailure)?;

        // Dispatch: axis 0 = rows, axis 1 = columns.
        let height_arg = pixels.height() as cl_uint;
        let width_arg = pixels.width() as cl_uint;
        let kernel_event = unsafe {
            ExecuteKernel::new(&self.kernel_histogram)
                .set_arg(&img_buf)
                .set_arg(&self.hist_buf)
                .set_arg(&height_arg)
                .set_arg(&width_arg)
                .set_global_work_sizes(&partition.global)
                .set_local_work_sizes(&partition.local)
                .enqueue_nd_range(&self.queue)
                .map_err(|_| HistError::DeviceFailure)?
        };
        kernel_event.wait().map_err(|_| HistError::DeviceFailure)?;
        self.profile_event("calc_histogram", &kernel_event);

        // Blocking readback: synchronous barrier for the whole call.
        let mut counts = [0u32; FLAT_BINS];
        let read_event = unsafe {
            self.queue
                .enqueue_read_buffer(&self.hist_buf, CL_BLOCKING, 0, &mut counts, &[])
                .map_err(|_| HistError::DeviceFailure)?
        };
        read_event.wait().map_err(|_| HistError::DeviceFailure)?;
        self.profile_event("histogram readback", &read_event);

        Ok(Histogram::from_flat(&counts))
    }
}
