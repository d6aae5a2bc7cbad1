//! Scanlens - A terminal client for medical image analysis.
//!
//! # Usage
//!
//! ```bash
//! scanlens
//! scanlens chest-xray.png
//! scanlens --server http://10.0.0.5:5000 --timeout 120 scan.jpg
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use scanlens::api::HttpApi;
use scanlens::app::App;
use scanlens::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use scanlens::highlight::{HighlightBackground, set_background_mode};

/// A terminal client for medical image analysis
#[derive(Parser, Debug)]
#[command(name = "scanlens", version, about, long_about = None)]
struct Cli {
    /// Image to load on startup
    #[arg(value_name = "IMAGE")]
    image: Option<PathBuf>,

    /// Analysis server base URL
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Request timeout in seconds (no timeout when unset)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Largest image accepted for upload, in MiB (default 16)
    #[arg(long, value_name = "MIB")]
    max_upload_mb: Option<u64>,

    /// Force syntax highlight theme background (light or dark)
    #[arg(long, value_enum, default_value = "auto")]
    theme: ThemeMode,

    /// Disable the inline image preview (show a placeholder only)
    #[arg(long)]
    no_images: bool,

    /// Force image rendering to use half-cell fallback mode
    #[arg(long)]
    force_half_cell: bool,

    /// Write logs to this file (set RUST_LOG to change the level)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Directory exported reports are written to
    #[arg(long, value_name = "PATH")]
    report_dir: Option<PathBuf>,

    /// Save current command-line flags as global defaults
    #[arg(long)]
    save: bool,

    /// Clear saved global defaults
    #[arg(long)]
    clear: bool,
}

// Query the terminal background using OSC 11.
// We talk to /dev/tty so the terminal responds even when stdout is piped.
// Non-Unix platforms skip the query: the stdin fallback leaves a reader
// thread blocking console input.
#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::{Read, Write};
    use std::sync::mpsc;

    let (tx, rx) = mpsc::channel();

    let mut io = OpenOptions::new().read(true).write(true).open("/dev/tty")?;
    let reader = io.try_clone()?;

    // OSC 11 query: ESC ] 11 ; ? BEL
    io.write_all(b"\x1b]11;?\x07")?;
    io.flush()?;

    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; 256];
        let mut collected: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => {
                    collected.extend_from_slice(&buf[..n]);
                    if collected.contains(&b'\x07') || collected.windows(2).any(|w| w == b"\x1b\\")
                    {
                        let _ = tx.send(collected);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let reply = rx
        .recv_timeout(Duration::from_millis(75))
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();
    Ok(parse_osc11_reply(&reply))
}

fn theme_from_rgb(r: u8, g: u8, b: u8) -> HighlightBackground {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    if luma >= 140.0 {
        HighlightBackground::Light
    } else {
        HighlightBackground::Dark
    }
}

fn detect_theme() -> Option<HighlightBackground> {
    let _raw = enable_raw_mode();
    let result = query_terminal_background();
    let _ = disable_raw_mode();
    result.ok().flatten().map(|(r, g, b)| theme_from_rgb(r, g, b))
}

fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    // Expect: ESC ] 11 ; rgb:RRRR/GGGG/BBBB BEL or ST
    let start = reply.find("rgb:")?;
    let data = &reply[start + 4..];
    let mut parts = data.split(['/', '\x07', '\x1b']);
    let r = parts.next()?;
    let g = parts.next()?;
    let b = parts.next()?;
    Some((
        parse_osc_component(r)?,
        parse_osc_component(g)?,
        parse_osc_component(b)?,
    ))
}

fn parse_osc_component(s: &str) -> Option<u8> {
    let hex = s.trim();
    if hex.len() >= 4 {
        let v = u16::from_str_radix(hex.get(..4)?, 16).ok()?;
        u8::try_from(v >> 8).ok()
    } else if hex.len() == 2 {
        u8::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}

/// Logs go to `--log-file` when given; the TUI owns stdout and stderr.
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false);
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_writer(Arc::new(file)).init();
        }
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.log_file.as_ref())?;
    tracing::debug!(?effective, "effective configuration");

    match effective.theme.unwrap_or(ThemeMode::Auto) {
        // Without an OSC 11 reply the highlighter falls back to COLORFGBG.
        ThemeMode::Auto => set_background_mode(detect_theme()),
        ThemeMode::Light => set_background_mode(Some(HighlightBackground::Light)),
        ThemeMode::Dark => set_background_mode(Some(HighlightBackground::Dark)),
    }

    if let Some(image) = &cli.image
        && !image.exists()
    {
        anyhow::bail!("File not found: {}", image.display());
    }

    let server = effective.server_or_default().to_string();
    let timeout = effective.timeout_secs.map(Duration::from_secs);
    let api = HttpApi::new(&server, timeout).context("Failed to create HTTP client")?;
    tracing::info!(server = api.base_url(), ?timeout, "starting");

    let app = App::new(Arc::new(api))
        .with_initial_image(cli.image)
        .with_max_upload_bytes(effective.max_upload_bytes())
        .with_images_enabled(!effective.no_images)
        .with_force_half_cell(effective.force_half_cell)
        .with_server_label(server)
        .with_report_dir(effective.report_dir.unwrap_or_else(|| PathBuf::from(".")))
        .with_config_paths(
            Some(global_path),
            if local_path.exists() {
                Some(local_path)
            } else {
                None
            },
        );

    app.run().context("Application error")
}
