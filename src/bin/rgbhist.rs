/// rgbhist – RGB histogram tool and CPU-vs-OpenCL benchmark.
///
///   rgbhist image.jpg              → print non-zero histogram bins (CPU)
///   rgbhist -g image.jpg           → compute on the OpenCL device instead
///   rgbhist -b img1.jpg img2.jpg   → workgroup-size sweep benchmark table
///   rgbhist --probe                → list OpenCL devices
use std::env;
use std::io;
use std::process::ExitCode;

use rgbhist::histogram::Histogram;
use rgbhist::pixels::PixelBuffer;

#[cfg(feature = "opencl")]
use rgbhist::bench::measure;
#[cfg(feature = "opencl")]
use rgbhist::opencl::{self, OpenClEngine};

/// Workgroup edge sizes swept by benchmark mode.
#[cfg(feature = "opencl")]
const BENCH_GROUP_DIMS: &[usize] = &[4, 8, 16, 32];

fn usage() {
    eprintln!("rgbhist - per-channel image histogram (CPU and OpenCL)");
    eprintln!();
    eprintln!("Usage: rgbhist [OPTIONS] [FILE]...");
    eprintln!();
    eprintln!("Options:");
    #[cfg(feature = "opencl")]
    eprintln!("  -g, --gpu          Compute the histogram on the OpenCL device");
    eprintln!("  -b, --bench        Benchmark mode: sweep workgroup sizes over FILEs");
    eprintln!("  -w, --wgsize N     Workgroup edge size for -g (default: 16)");
    #[cfg(feature = "opencl")]
    eprintln!("      --probe        List OpenCL devices and exit");
    eprintln!("  -h, --help         Show this help");
    eprintln!();
    eprintln!("Histogram mode prints non-zero bins as '<value><channel>\\t<count>'.");
    eprintln!("Benchmark mode reports mean GPU time per image and the CPU/GPU");
    eprintln!("speedup per workgroup size; a row of zeros marks a run whose GPU");
    eprintln!("result disagreed with the CPU reference.");
    #[cfg(not(feature = "opencl"))]
    {
        eprintln!();
        eprintln!("(built without the 'opencl' feature: GPU modes unavailable)");
    }
}

#[derive(Debug, Default)]
struct Opts {
    gpu: bool,
    bench: bool,
    probe: bool,
    wgsize: usize,
    files: Vec<String>,
}

fn parse_args() -> Result<Opts, String> {
    let mut opts = Opts {
        wgsize: 16,
        ..Default::default()
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-g" | "--gpu" => opts.gpu = true,
            "-b" | "--bench" => opts.bench = true,
            "--probe" => opts.probe = true,
            "-w" | "--wgsize" => {
                let val = args.next().ok_or("missing value for --wgsize")?;
                opts.wgsize = val
                    .parse()
                    .map_err(|_| format!("invalid workgroup size: {val}"))?;
                if opts.wgsize == 0 {
                    return Err("workgroup size must be positive".into());
                }
            }
            "-h" | "--help" => {
                usage();
                std::process::exit(0);
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {other}"));
            }
            file => opts.files.push(file.to_string()),
        }
    }
    Ok(opts)
}

/// Decode an image file into the BGRA layout the accumulators consume.
fn load_bgra(path: &str) -> Result<(u32, u32, Vec<u8>), String> {
    let img = image::open(path).map_err(|e| format!("{path}: {e}"))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut bytes = Vec::with_capacity(width as usize * height as usize * 4);
    for px in rgba.pixels() {
        let [r, g, b, a] = px.0;
        bytes.extend_from_slice(&[b, g, r, a]);
    }
    Ok((width, height, bytes))
}

/// Short column label for a benchmark table: file stem or full path.
#[cfg(feature = "opencl")]
fn column_label(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn run_histogram(opts: &Opts) -> Result<(), String> {
    let path = opts
        .files
        .first()
        .ok_or("no input file (try --help)")?
        .as_str();
    let (width, height, bytes) = load_bgra(path)?;
    let pixels = PixelBuffer::new(&bytes, width, height).map_err(|e| e.to_string())?;

    let hist = if opts.gpu {
        gpu_histogram(&pixels, opts.wgsize)?
    } else {
        Histogram::compute(&pixels)
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    hist.write_sparse(&mut out).map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(feature = "opencl")]
fn gpu_histogram(pixels: &PixelBuffer, wgsize: usize) -> Result<Histogram, String> {
    let mut engine = OpenClEngine::new().map_err(|e| e.to_string())?;
    eprintln!("device: {}", engine.device_name());
    engine.histogram(pixels, wgsize).map_err(|e| e.to_string())
}

#[cfg(not(feature = "opencl"))]
fn gpu_histogram(_pixels: &PixelBuffer, _wgsize: usize) -> Result<Histogram, String> {
    Err("GPU mode requires building with --features opencl".into())
}

#[cfg(feature = "opencl")]
fn run_bench(opts: &Opts) -> Result<(), String> {
    use std::io::Write;

    if opts.files.is_empty() {
        return Err("benchmark mode needs at least one image file".into());
    }

    let mut engine = OpenClEngine::new().map_err(|e| e.to_string())?;
    eprintln!("device: {}", engine.device_name());

    // Decode every image once, up front.
    let mut images = Vec::new();
    for path in &opts.files {
        images.push((column_label(path), load_bgra(path)?));
    }

    print!("{:>7} ", "WG size");
    for (label, _) in &images {
        print!("{label:>12} ");
    }
    println!("speedup");

    for &group_dim in BENCH_GROUP_DIMS {
        print!("{group_dim:>7} ");
        io::stdout().flush().ok();

        let mut speedups = Vec::new();
        for (_, (width, height, bytes)) in &images {
            let pixels = PixelBuffer::new(bytes, *width, *height).map_err(|e| e.to_string())?;
            let sample =
                measure(&mut engine, &pixels, group_dim, 1, 2).map_err(|e| e.to_string())?;
            print!("{:>12.6} ", sample.t_gpu);
            io::stdout().flush().ok();
            speedups.push(sample.speedup);
        }

        let row: Vec<String> = speedups.iter().map(|s| format!("{s:.3}")).collect();
        println!("{}", row.join(","));
    }

    Ok(())
}

#[cfg(not(feature = "opencl"))]
fn run_bench(_opts: &Opts) -> Result<(), String> {
    Err("--bench requires building with --features opencl".into())
}

#[cfg(feature = "opencl")]
fn run_probe() -> Result<(), String> {
    let devices = opencl::probe_devices();
    if devices.is_empty() {
        return Err("no OpenCL devices found".into());
    }
    for (i, dev) in devices.iter().enumerate() {
        let kind = if dev.is_gpu { "GPU" } else { "CPU/other" };
        println!(
            "[{}] {} ({}) - {}, max workgroup {}, {} MiB global",
            i,
            dev.name,
            dev.vendor,
            kind,
            dev.max_work_group_size,
            dev.global_mem_size / (1024 * 1024)
        );
    }
    Ok(())
}

#[cfg(not(feature = "opencl"))]
fn run_probe() -> Result<(), String> {
    Err("--probe requires building with --features opencl".into())
}

fn main() -> ExitCode {
    let opts = match parse_args() {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("rgbhist: {msg}");
            usage();
            return ExitCode::FAILURE;
        }
    };

    let result = if opts.probe {
        run_probe()
    } else if opts.bench {
        run_bench(&opts)
    } else {
        run_histogram(&opts)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("rgbhist: {msg}");
            ExitCode::FAILURE
        }
    }
}
