//! # Labelbridge CLI
//!
//! Command-line interface for TSPL label printing.
//!
//! ## Usage
//!
//! ```bash
//! # List serial ports
//! labelbridge ports
//!
//! # Print a text label (40x30 mm unless --label is given)
//! labelbridge --port /dev/rfcomm0 text "Order #1234"
//!
//! # Print a rendered page on a 4x6 label
//! labelbridge --label 4x6 document label.png
//!
//! # Preview the processed label instead of printing
//! labelbridge document label.png --png preview.png
//!
//! # Send raw bytes
//! labelbridge raw "1B 40"
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use labelbridge::{
    BridgeConfig, LabelError, LabelSession, LabelSpec, PrintContent, PrintRequest,
    error::{ConfigError, FormatError},
    page,
    render::crop::{CropRegion, ManualCrop},
    render::pipeline::{ImagePipeline, RasterOptions},
    render::preview,
    transport::{self, SerialConnection},
};

/// Labelbridge - TSPL label printer bridge
#[derive(Parser, Debug)]
#[command(name = "labelbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial port (e.g. /dev/rfcomm0, COM5)
    #[arg(long, global = true)]
    port: Option<String>,

    /// Baud rate
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// Label size: preset (4x6, 4x4, 2x1) or WIDTHxHEIGHT in mm
    #[arg(long, global = true, value_name = "SIZE")]
    label: Option<String>,

    /// Printer resolution in DPI
    #[arg(long, global = true)]
    dpi: Option<u32>,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available serial ports
    Ports,

    /// Print a text label, one TEXT line per input line
    Text {
        text: String,

        /// Resident font name
        #[arg(long)]
        font: Option<String>,

        /// Number of copies
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        copies: Option<u32>,
    },

    /// Send hex bytes unchanged (e.g. "1B 40")
    Raw { hex: String },

    /// Send a file's bytes unchanged
    File { path: PathBuf },

    /// Print the first page of a document as a bitmap label
    Document {
        path: PathBuf,

        /// Disable label border detection
        #[arg(long)]
        no_crop: bool,

        /// Disable automatic rotation
        #[arg(long)]
        no_rotate: bool,

        /// Do not invert the bitmap
        #[arg(long)]
        no_invert: bool,

        /// Turn the label upside down
        #[arg(long)]
        flip: bool,

        /// Manual crop as LEFT,TOP,RIGHT,BOTTOM in reference-DPI pixels
        #[arg(long, value_name = "L,T,R,B")]
        crop: Option<String>,

        /// Save a PNG preview instead of printing
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,

        /// Number of copies
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        copies: Option<u32>,
    },

    /// Send plain text without label commands (port check)
    Probe { text: String },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Returns whether the job succeeded.
fn run(cli: Cli) -> Result<bool, LabelError> {
    let mut config = BridgeConfig::load_or_default(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(baud) = cli.baud {
        config.baud_rate = baud;
    }
    let label_override = cli.label.as_deref().map(LabelSpec::parse).transpose()?;
    if let Some(label) = label_override {
        config.label = label;
    }
    if let Some(dpi) = cli.dpi {
        config.label = config.label.with_dpi(dpi);
    }
    config.validate()?;

    let request = match cli.command {
        Commands::Ports => {
            list_ports()?;
            return Ok(true);
        }
        Commands::Text { text, font, copies } => {
            let label = label_override
                .unwrap_or(LabelSpec::TEXT_DEFAULT)
                .with_dpi(config.label.dpi);
            let mut style = config.text.clone();
            if let Some(font) = font {
                style.font = font;
            }
            PrintRequest::new(PrintContent::Text(text), label)
                .with_text_style(style)
                .with_copies(copies.unwrap_or(config.copies))
        }
        Commands::Raw { hex } => {
            PrintRequest::new(PrintContent::Raw(transport::parse_hex(&hex)?), config.label)
        }
        Commands::File { path } => return send_file(&config, &path),
        Commands::Probe { text } => return probe(&config, &text),
        Commands::Document {
            path,
            no_crop,
            no_rotate,
            no_invert,
            flip,
            crop,
            png,
            copies,
        } => {
            let mut options = config.raster;
            options.auto_crop &= !no_crop;
            options.auto_rotate &= !no_rotate;
            options.invert &= !no_invert;
            options.flip_vertical |= flip;
            if let Some(crop) = crop {
                options.manual_crop = Some(ManualCrop::new(
                    parse_crop(&crop)?,
                    config.reference_dpi,
                ));
            }

            if let Some(png) = png {
                save_preview(&config, options, &path, &png)?;
                return Ok(true);
            }

            PrintRequest::new(PrintContent::Document(path), config.label)
                .with_options(options)
                .with_copies(copies.unwrap_or(config.copies))
        }
    };

    let connection = SerialConnection::system(config.port_settings());
    let mut session = LabelSession::new(connection).with_working_dpi(config.render_dpi);
    let outcome = session.run(request);
    if outcome.success {
        println!("{}", outcome.message);
    } else {
        eprintln!("{}", outcome.message);
    }
    Ok(outcome.success)
}

fn list_ports() -> Result<(), LabelError> {
    let ports = transport::list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    println!("\nAvailable serial ports:");
    println!("{}", "-".repeat(60));
    for port in ports {
        println!("Port: {}", port.device);
        println!("  Description: {}", port.description);
        println!(
            "  Manufacturer: {}",
            port.manufacturer.as_deref().unwrap_or("Unknown")
        );
        println!("  HWID: {}", port.hardware_id);
        println!();
    }
    Ok(())
}

fn probe(config: &BridgeConfig, text: &str) -> Result<bool, LabelError> {
    let mut connection = SerialConnection::system(config.port_settings());
    connection.connect()?;
    let sent = connection.send_plain(text);
    connection.disconnect();
    println!("Sent {} bytes", sent?);
    Ok(true)
}

fn send_file(config: &BridgeConfig, path: &Path) -> Result<bool, LabelError> {
    let mut connection = SerialConnection::system(config.port_settings());
    connection.connect()?;
    let sent = connection.send_file(path);
    connection.disconnect();
    println!("Sent {} bytes", sent?);
    Ok(true)
}

fn save_preview(
    config: &BridgeConfig,
    options: RasterOptions,
    source: &Path,
    out: &Path,
) -> Result<(), LabelError> {
    let rasterizer = page::default_rasterizer()?;
    let page = rasterizer.render_first_page(source, config.render_dpi)?;
    let label = ImagePipeline::new(config.label, options)
        .with_working_dpi(config.render_dpi)
        .preview(&page)?;
    preview::save_png(out, &label)?;
    println!("Saved to {}", out.display());
    Ok(())
}

/// Parse `LEFT,TOP,RIGHT,BOTTOM`.
fn parse_crop(s: &str) -> Result<CropRegion, LabelError> {
    let values: Vec<i32> = s
        .split(',')
        .map(|v| v.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .map_err(|_| ConfigError::Invalid(format!("Invalid crop '{}': expected L,T,R,B", s)))?;
    let [left, top, right, bottom] = values[..] else {
        return Err(ConfigError::Invalid(format!("Invalid crop '{}': expected 4 values", s)).into());
    };
    let region = CropRegion::new(left, top, right, bottom);
    if region.width() <= 0 || region.height() <= 0 {
        return Err(FormatError::InvalidCropRegion {
            left: left.max(0) as u32,
            top: top.max(0) as u32,
            right: right.max(0) as u32,
            bottom: bottom.max(0) as u32,
        }
        .into());
    }
    Ok(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_zero_copies_rejected() {
        let text = ["labelbridge", "text", "hi", "--copies", "0"];
        assert!(Cli::try_parse_from(text).is_err());
        let document = ["labelbridge", "document", "a.png", "--copies", "0"];
        assert!(Cli::try_parse_from(document).is_err());

        let cli = Cli::try_parse_from(["labelbridge", "text", "hi", "--copies", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Text { copies: Some(3), .. }));
    }

    #[test]
    fn test_parse_crop() {
        assert_eq!(
            parse_crop("10, 20,110,220").unwrap(),
            CropRegion::new(10, 20, 110, 220)
        );
        assert!(parse_crop("1,2,3").is_err());
        assert!(parse_crop("a,b,c,d").is_err());
        assert!(parse_crop("100,100,50,200").is_err());
    }
}
