//! qrforge server entrypoint

use clap::Parser;
use qrforge::qr::{GenerateRequest, QrDecoder, QrImageEncoder};
use qrforge::{Error, ForgeConfig, Result, RgbColor, StudioServer, logging, metrics, speech};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "qrforge",
    version,
    about = "Self-hosted single-page QR studio with colored rendering and logo overlay"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to qrforge.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override bind address (e.g. 0.0.0.0)
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Override bind port
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Override the base URL prefixed onto QR payloads
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Override the logo asset path
    #[arg(long, value_name = "PATH")]
    logo: Option<PathBuf>,

    /// Override the welcome audio asset path
    #[arg(long, value_name = "PATH")]
    audio: Option<PathBuf>,

    /// Treat this process as a hosted deployment (suppresses local speech)
    #[arg(long)]
    hosted: bool,

    /// Enable metrics output regardless of configuration file settings
    #[arg(long)]
    metrics: bool,

    /// Generate a single QR code to disk instead of serving, then exit
    #[arg(long, value_name = "TEXT")]
    render: Option<String>,

    /// Output path for --render
    #[arg(long, value_name = "PATH", default_value = "qr_output.png")]
    out: PathBuf,

    /// Foreground color for --render (#RRGGBB)
    #[arg(long, value_name = "COLOR")]
    fg: Option<String>,

    /// Background color for --render (#RRGGBB)
    #[arg(long, value_name = "COLOR")]
    bg: Option<String>,

    /// Composite the logo asset during --render
    #[arg(long)]
    logo_overlay: bool,

    /// Decode the rendered image back and check it matches the payload
    #[arg(long)]
    verify: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ForgeConfig::load(cli.config.as_deref())?;

    if let Some(ref addr) = cli.bind {
        config.server.bind_address = addr.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref url) = cli.base_url {
        config.app.base_url = url.clone();
    }
    if let Some(ref path) = cli.logo {
        config.app.logo_path = path.clone();
    }
    if let Some(ref path) = cli.audio {
        config.app.audio_path = path.clone();
    }
    if cli.hosted {
        config.app.hosted = true;
    }
    if cli.metrics {
        config.logging.metrics = true;
    }

    logging::init(&config.logging)?;

    if let Some(text) = cli.render.as_deref() {
        return render_once(&cli, &config, text);
    }

    if config.logging.metrics {
        metrics::enable(config.logging.metrics_interval_secs);
    }

    speech::speak("Welcome to the QR code studio", config.app.hosted);

    let server = StudioServer::bind(&config).await?;
    server.serve().await
}

/// One-shot generation mode: write a PNG and optionally verify it scans.
fn render_once(cli: &Cli, config: &ForgeConfig, text: &str) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Other(
            "Nothing to encode: --render needs non-empty text".to_string(),
        ));
    }

    let foreground = match cli.fg.as_deref() {
        Some(value) => RgbColor::parse(value)?,
        None => RgbColor::default_foreground(),
    };
    let background = match cli.bg.as_deref() {
        Some(value) => RgbColor::parse(value)?,
        None => RgbColor::default_background(),
    };

    let encoder =
        QrImageEncoder::with_options(config.app.base_url.clone(), config.render_options()?);
    let request = GenerateRequest {
        text: text.to_string(),
        foreground,
        background,
        add_logo: cli.logo_overlay,
    };

    let (image, warnings) = encoder.generate(&request, &config.app.logo_path)?;
    for warning in &warnings {
        eprintln!("Warning: {warning}");
    }

    image
        .save(&cli.out)
        .map_err(|e| Error::Image(format!("Failed to write {}: {e}", cli.out.display())))?;
    info!(path = %cli.out.display(), "QR code written");
    println!("QR code written to {}", cli.out.display());

    if cli.verify {
        let decoded = QrDecoder::new().decode(&image)?;
        let expected = encoder.payload_for(text);
        if decoded != expected {
            return Err(Error::QrDecode(format!(
                "Verification mismatch: decoded '{decoded}', expected '{expected}'"
            )));
        }
        println!("Verified: image decodes to {expected}");
    }

    Ok(())
}
