use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use inklink_link::{LinkConfig, RetryPolicy};
use inklink_transport::DEFAULT_BAUD_RATE;

use crate::exit::{io_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod hibernate;
pub mod image;
pub mod monitor;
pub mod update;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send an image to a display.
    Image(ImageArgs),
    /// Put a display to sleep until a wake-up time.
    Hibernate(HibernateArgs),
    /// Send an image, let the panel refresh, then put the display to sleep.
    Update(UpdateArgs),
    /// Print lines received from the bridge.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, link: &LinkOptions, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Image(args) => image::run(args, link, format),
        Command::Hibernate(args) => hibernate::run(args, link, format),
        Command::Update(args) => update::run(args, link, format),
        Command::Monitor(args) => monitor::run(args, link, format),
        Command::Version(args) => version::run(args),
    }
}

/// Serial and flow-control settings shared by every subcommand.
#[derive(Args, Debug)]
pub struct LinkOptions {
    /// Serial baud rate.
    #[arg(long, global = true, default_value_t = DEFAULT_BAUD_RATE, env = "INKLINK_BAUD")]
    pub baud: u32,
    /// Per-packet ACK timeout (e.g. 30s, 500ms), or "none" to wait forever.
    #[arg(long, global = true, default_value = "30s", env = "INKLINK_ACK_TIMEOUT")]
    pub ack_timeout: String,
    /// Resend an unacknowledged packet up to N more times.
    #[arg(long, global = true, default_value_t = 0, env = "INKLINK_RETRIES")]
    pub retries: u32,
    /// Pause between chunks of one transmission.
    #[arg(long, global = true, default_value = "100ms", env = "INKLINK_CHUNK_DELAY")]
    pub chunk_delay: String,
}

impl LinkOptions {
    pub fn config(&self) -> CliResult<LinkConfig> {
        let ack_timeout = match self.ack_timeout.trim() {
            "none" => None,
            value => Some(parse_duration(value)?),
        };
        Ok(LinkConfig {
            ack_timeout,
            retry: RetryPolicy {
                max_attempts: self.retries.saturating_add(1),
                ..RetryPolicy::none()
            },
            chunk_delay: parse_duration(&self.chunk_delay)?,
            ..LinkConfig::default()
        })
    }
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Serial port of the bridge.
    #[arg(env = "INKLINK_PORT")]
    pub port: String,
    /// Target display id.
    #[arg(long, short = 'd')]
    pub device: u8,
    /// PBM (P4) or PGM (P5) image.
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct HibernateArgs {
    /// Serial port of the bridge.
    #[arg(env = "INKLINK_PORT")]
    pub port: String,
    /// Target display id.
    #[arg(long, short = 'd')]
    pub device: u8,
    /// Wake up after this long (e.g. 90m, 6h).
    #[arg(
        long = "in",
        value_name = "DURATION",
        conflicts_with = "at",
        required_unless_present = "at"
    )]
    pub wake_in: Option<String>,
    /// Wake up at this Unix time.
    #[arg(long, value_name = "UNIX_SECONDS")]
    pub at: Option<u64>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Serial port of the bridge.
    #[arg(env = "INKLINK_PORT")]
    pub port: String,
    /// Target display id.
    #[arg(long, short = 'd')]
    pub device: u8,
    /// PBM (P4) or PGM (P5) image.
    #[arg(long, short = 'f')]
    pub file: PathBuf,
    /// Sleep duration after the refresh (e.g. 30m).
    #[arg(long = "in", value_name = "DURATION")]
    pub wake_in: String,
    /// Time the panel gets to refresh before the hibernation request.
    #[arg(long, default_value = "10s")]
    pub settle: String,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial port of the bridge.
    #[arg(env = "INKLINK_PORT")]
    pub port: String,
    /// Exit after printing N lines.
    #[arg(long)]
    pub count: Option<usize>,
    /// Extra control signal names to track (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub signals: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, scale) = if let Some(num) = input.strip_suffix("ms") {
        (num, 1)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, 1_000)
    } else if let Some(num) = input.strip_suffix('m') {
        (num, 60_000)
    } else if let Some(num) = input.strip_suffix('h') {
        (num, 3_600_000)
    } else {
        (input, 1_000)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    value
        .checked_mul(scale)
        .map(Duration::from_millis)
        .ok_or_else(|| CliError::usage(format!("duration out of range: {input}")))
}
