use clap::{Args, Parser, Subcommand};
use image_resizer::bridge::{Bridge, BridgeError, ErrorResponse, Request};
use image_resizer::config::ResizerConfig;
use image_resizer::source::{ImageDataType, ImageSource};
use image_resizer::store::{StoreOptions, store_image};
use image_resizer::{Encoding, Filter, Quality, RustBackend, SizingOptions, config, imaging, output};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "image-resizer")]
#[command(about = "Resize, measure, and store JPEG/PNG images")]
#[command(long_about = "\
Resize, measure, and store JPEG/PNG images

Inputs are local paths or file:// URIs. Sizing rules:

  --width only           height derived from the aspect ratio
  --height only          width derived from the aspect ratio
  --width and --height   fit inside the box (or stretch with --stretch)

Run 'image-resizer gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Path to a config.toml (stock defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every processing step to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ResizeArgs {
    /// Source image (path or file:// URI)
    input: String,
    /// Where to write the resized image
    #[arg(short, long)]
    output: PathBuf,
    /// Target width in pixels
    #[arg(long)]
    width: Option<u32>,
    /// Target height in pixels
    #[arg(long)]
    height: Option<u32>,
    /// JPEG quality, 0.0-1.0
    #[arg(long)]
    quality: Option<f32>,
    /// Output encoding (jpg or png); inferred from the output extension when omitted
    #[arg(long)]
    format: Option<Encoding>,
    /// Stretch to exactly width x height instead of fitting inside
    #[arg(long)]
    stretch: bool,
    /// Resampling filter (bilinear, catmull_rom, lanczos3)
    #[arg(long)]
    filter: Option<Filter>,
}

#[derive(Args)]
struct StoreArgs {
    /// Source image (path or file:// URI)
    input: String,
    /// File name to write; the format extension is appended when missing
    #[arg(long)]
    filename: String,
    /// Target directory (created if missing)
    #[arg(long)]
    directory: Option<PathBuf>,
    /// Output encoding (jpg or png)
    #[arg(long)]
    format: Option<Encoding>,
    /// JPEG quality, 0.0-1.0
    #[arg(long)]
    quality: Option<f32>,
}

#[derive(Subcommand)]
enum Command {
    /// Resize an image under width/height constraints
    Resize(ResizeArgs),
    /// Print an image's dimensions
    Size {
        /// Source image (path or file:// URI)
        input: String,
    },
    /// Re-encode an image into a directory
    Store(StoreArgs),
    /// Read one JSON request from stdin and print the JSON response
    Bridge,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config;

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Resize(args) => {
            let (config, backend) = setup(config_path.as_deref())?;
            let raw = ImageSource::new(args.input.clone(), ImageDataType::UrlImage).read_bytes()?;
            let source = imaging::image_size(&backend, &raw)?;
            let options = SizingOptions {
                target_width: args.width,
                target_height: args.height,
                quality: args.quality.unwrap_or(config.resize.quality),
                encoding: args
                    .format
                    .or_else(|| Encoding::from_path(&args.output))
                    .unwrap_or(config.resize.format),
                preserve_aspect_ratio: !args.stretch && config.resize.preserve_aspect_ratio,
                filter: args.filter.unwrap_or(config.resize.filter),
            };
            let result = imaging::resize(&backend, &raw, &options)?;
            std::fs::write(&args.output, &result.bytes)?;
            output::print_resize_output(
                &args.input,
                &args.output.display().to_string(),
                source,
                &result,
            );
        }
        Command::Size { input } => {
            let (_, backend) = setup(config_path.as_deref())?;
            let raw = ImageSource::new(input, ImageDataType::UrlImage).read_bytes()?;
            output::print_size_output(imaging::image_size(&backend, &raw)?);
        }
        Command::Store(args) => {
            let (config, backend) = setup(config_path.as_deref())?;
            let raw = ImageSource::new(args.input, ImageDataType::UrlImage).read_bytes()?;
            let quality = args.quality.unwrap_or(config.store.quality);
            let options = StoreOptions {
                directory: args
                    .directory
                    .unwrap_or_else(|| PathBuf::from(&config.store.directory)),
                filename: args.filename,
                encoding: args.format.unwrap_or(config.store.format),
                quality: Quality::new(quality)
                    .ok_or_else(|| format!("quality {quality} is outside [0, 1]"))?,
            };
            let stored = store_image(&backend, &raw, &options)?;
            output::print_store_output(&stored);
        }
        Command::Bridge => {
            let (config, backend) = setup(config_path.as_deref())?;
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            let bridge = Bridge::with_backend(backend)
                .with_filter(config.resize.filter)
                .with_default_directory(&config.store.directory);

            // Same path a plugin host takes: run on a worker, wait for the completion.
            let completion = match Request::from_json(&input) {
                Ok(request) => bridge
                    .submit(request)
                    .recv()
                    .unwrap_or(Err(BridgeError::Disconnected)),
                Err(e) => Err(e),
            };
            match completion {
                Ok(response) => println!("{}", serde_json::to_string(&response)?),
                Err(e) => {
                    println!("{}", serde_json::to_string(&ErrorResponse::from(&e))?);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Load the config and build a backend honouring its limits.
fn setup(path: Option<&Path>) -> Result<(ResizerConfig, RustBackend), config::ConfigError> {
    let config = config::load_config(path)?;
    let backend = RustBackend::with_limits(config.limits.to_limits());
    Ok((config, backend))
}

/// Install the stderr subscriber. `RUST_LOG` wins unless `--verbose` is set.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
