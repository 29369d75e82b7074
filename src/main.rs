use std::fs;

use clap::{Parser, Subcommand};
use rawfb::{
    configuration::Configuration,
    display::{self, Frame, PixelFormat},
    FrameBufferDevice,
};
use simple_logger::SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// rawfb config file [default: ./rawfb.yaml, if present]
    #[arg(short, long)]
    config: Option<String>,

    /// Framebuffer device, overriding the config file
    #[arg(short, long)]
    device: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the device's name and geometry
    Info,
    /// Scale a PNG to the display and show it
    Image {
        /// PNG file to display
        file: String,
    },
    /// Show alternating 0x00 / 0x80 pixels
    Pattern,
    /// Zero the whole frame
    Clear,
    /// Power the display down
    Blank,
    /// Power the display back up
    Unblank,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Framebuffer(#[from] rawfb::Error),
    #[error("unable to read image {path}: {source}")]
    ReadImage {
        path: String,
        source: std::io::Error,
    },
    #[error("unable to decode image {path}: {source}")]
    DecodeImage {
        path: String,
        source: png::DecodingError,
    },
}

fn main() {
    let args = Args::parse();

    let configuration = match Configuration::load(args.config.as_deref()) {
        Ok(configuration) => configuration,
        Err(e) => {
            eprintln!("Unable to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = SimpleLogger::new()
        .with_level(configuration.log.level_filter())
        .init()
    {
        eprintln!("Unable to initialize logger: {}", e);
    }

    let device = args
        .device
        .unwrap_or_else(|| configuration.device.path.clone());

    if let Err(e) = run(&device, configuration.device.autoprobe, args.command) {
        log::error!("Error during use of fb => {}: {}", device, e);
        std::process::exit(1);
    }
}

fn run(device: &str, autoprobe: bool, command: Command) -> Result<(), CliError> {
    let fb = FrameBufferDevice::new(device, autoprobe)?;

    match command {
        Command::Info => print_info(&fb),
        Command::Image { file } => {
            print_info(&fb);

            let format = match PixelFormat::for_depth(fb.pixel_depth()) {
                Some(format) => format,
                None => {
                    println!(
                        "Unsure which pixel format to use for {}bpp",
                        fb.pixel_depth()
                    );
                    return Ok(());
                }
            };

            println!("Clearing display...");
            fb.clear()?;

            println!("Loading image from {}...", file);
            let data = fs::read(&file).map_err(|source| CliError::ReadImage {
                path: file.clone(),
                source,
            })?;
            let frame = Frame::from_png(&data).map_err(|source| CliError::DecodeImage {
                path: file.clone(),
                source,
            })?;
            let pixels = frame
                .resize(fb.pixel_width(), fb.pixel_height())
                .encode(format);

            println!("Writing image to framebuffer...");
            fb.write_raw(&pixels)?;
        }
        Command::Pattern => {
            print_info(&fb);
            println!("Clearing display...");
            fb.clear()?;

            println!("Writing test pattern...");
            fb.write_raw(&display::test_pattern(
                fb.pixel_width(),
                fb.pixel_height(),
                fb.pixel_depth(),
            ))?;
        }
        Command::Clear => {
            fb.clear()?;
        }
        Command::Blank => fb.blank()?,
        Command::Unblank => fb.unblank()?,
    }

    fb.close();
    Ok(())
}

fn print_info(fb: &FrameBufferDevice) {
    println!(
        "Display Device => {} Name => {} Width => {} Height => {} Bpp => {}",
        fb.device().display(),
        fb.id().unwrap_or_default(),
        fb.pixel_width(),
        fb.pixel_height(),
        fb.pixel_depth()
    );
}
