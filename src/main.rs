use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use simple_logger::SimpleLogger;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use strip_driver::serial::{FrameEncoderProvider, SerialChannelProvider, SerialConfig};
use strip_driver::{
    ChannelConfig, ChannelStrip, HardwareError, LedStrip, StripConfig, StripError,
};

#[derive(Debug, Clone, Deserialize)]
struct AppConfig {
    strip: StripConfig,
    #[serde(default)]
    channel: ChannelConfig,
    output: SerialConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Pattern {
    /// Every LED in the chosen color
    Fill,
    /// One lit LED running along the strip
    Chase,
    /// All LEDs off
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Color {
    red: u32,
    green: u32,
    blue: u32,
    white: u32,
}

const OFF: Color = Color {
    red: 0,
    green: 0,
    blue: 0,
    white: 0,
};

#[derive(Parser)]
#[command(name = "strip_driver")]
#[command(about = "Drive an addressable LED strip through a serial LED controller", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON)
    config: String,

    #[arg(long, value_enum, default_value_t = Pattern::Chase)]
    pattern: Pattern,

    /// Color as R,G,B or R,G,B,W (white is used on GRBW strips only)
    #[arg(long, default_value = "0,0,64", value_parser = parse_color)]
    color: Color,

    /// Delay between frames
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,

    /// Number of frames to send, 0 runs until Ctrl-C
    #[arg(long, default_value_t = 0)]
    frames: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,
}

fn parse_color(s: &str) -> Result<Color, String> {
    let parts = s
        .split(',')
        .map(|part| part.trim().parse::<u8>().map(u32::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad color component in '{}': {}", s, e))?;

    match parts[..] {
        [red, green, blue] => Ok(Color {
            red,
            green,
            blue,
            white: 0,
        }),
        [red, green, blue, white] => Ok(Color {
            red,
            green,
            blue,
            white,
        }),
        _ => Err(format!("expected R,G,B or R,G,B,W, got '{}'", s)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        log::LevelFilter::Debug
    } else if cli.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    SimpleLogger::new()
        .with_level(log_level)
        .with_utc_timestamps()
        .init()
        .context("Failed to initialize logger")?;

    // Load configuration
    let config_data = fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read {}", cli.config))?;
    let config: AppConfig = serde_json::from_str(&config_data)
        .with_context(|| format!("Failed to parse {}", cli.config))?;

    let mut channels = SerialChannelProvider::new(config.output.clone());
    let mut encoders = FrameEncoderProvider::new(config.output.protocol, config.strip.pixel_format)?;
    let mut strip = ChannelStrip::create(&config.strip, &config.channel, &mut channels, &mut encoders)
        .with_context(|| format!("Failed to set up strip on {}", config.output.port))?;

    // Ctrl-C stops the frame loop and aborts a refresh stuck waiting
    let running = Arc::new(AtomicBool::new(true));
    let handler_running = Arc::clone(&running);
    let cancel = strip.cancel_token();
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Shutting down...");
        handler_running.store(false, Ordering::Relaxed);
        cancel.cancel();
    }) {
        log::warn!("Could not set Ctrl-C handler: {}", e);
    }

    let result = run(&mut strip, &cli, &running);

    // Graceful shutdown - turn the LEDs off
    strip.cancel_token().reset();
    if let Err(e) = strip.clear() {
        log::warn!("Failed to turn off LEDs: {}", e);
    }
    strip.destroy().context("Failed to release strip")?;

    result
}

/// Render and send frames until done or interrupted
fn run(strip: &mut impl LedStrip, cli: &Cli, running: &AtomicBool) -> Result<()> {
    let interval = Duration::from_millis(cli.interval_ms);
    let mut sent = 0u64;

    while running.load(Ordering::Relaxed) && (cli.frames == 0 || sent < cli.frames) {
        render(strip, cli.pattern, sent, cli.color)?;

        match strip.refresh() {
            Ok(()) => sent += 1,
            // Ctrl-C aborted the wait
            Err(e) if is_cancelled(&e) => break,
            Err(e) => return Err(e).context("Refresh failed"),
        }

        thread::sleep(interval);
    }

    log::info!("Sent {} frames", sent);
    Ok(())
}

fn is_cancelled(err: &StripError) -> bool {
    matches!(
        err,
        StripError::Hardware {
            source: HardwareError::Cancelled,
            ..
        }
    )
}

fn render(
    strip: &mut impl LedStrip,
    pattern: Pattern,
    frame: u64,
    color: Color,
) -> strip_driver::Result<()> {
    let len = strip.len();
    if len == 0 {
        return Ok(());
    }
    let lit = (frame % len as u64) as usize;

    for index in 0..len {
        let pixel = match pattern {
            Pattern::Fill => color,
            Pattern::Chase if index == lit => color,
            Pattern::Chase | Pattern::Clear => OFF,
        };
        set_color(strip, index, pixel)?;
    }
    Ok(())
}

fn set_color(strip: &mut impl LedStrip, index: usize, color: Color) -> strip_driver::Result<()> {
    if strip.bytes_per_pixel() == 4 {
        strip.set_pixel_rgbw(index, color.red, color.green, color.blue, color.white)
    } else {
        strip.set_pixel(index, color.red, color.green, color.blue)
    }
}
