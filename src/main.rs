// Sysgauge - systemd unit state gauges for collectd
// Main entry point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use sysgauge::config::Config;
use sysgauge::monitor::{configure, Monitor};
use sysgauge::scheduler::TickScheduler;
use sysgauge::sink::{default_hostname, PutvalSink};
use sysgauge::systemd::SystemBusConnector;
use sysgauge::version::build_info;
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser, Debug)]
#[command(name = "sysgauge")]
#[command(author, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging regardless of the config file
    #[arg(short, long)]
    verbose: bool,

    /// Host name used in metric identifiers
    #[arg(long, env = "COLLECTD_HOSTNAME")]
    hostname: Option<String>,

    /// Run a single read cycle and exit
    #[arg(long)]
    once: bool,

    /// Show version information
    #[arg(short = 'V', long)]
    version: bool,

    /// Show detailed build information
    #[arg(long)]
    build_info: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", build_info().format_display());
        return Ok(());
    }

    if cli.build_info {
        println!("{}", build_info().format_display());
        println!("\n{}", build_info().format_build_info());
        return Ok(());
    }

    let mut config = Config::load(cli.config)?;
    if cli.verbose {
        config.verbose = true;
    }

    // stdout carries PUTVAL lines, so logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if config.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("{} starting", build_info().format_display());
    tracing::debug!(
        "Loaded configuration: services={:?}, interval={}",
        config.services,
        config.interval_secs()
    );

    if config.services.is_empty() {
        tracing::info!("No services configured, nothing to monitor");
        return Ok(());
    }

    let hostname = cli.hostname.unwrap_or_else(default_hostname);
    let sink = PutvalSink::stdout(hostname, config.interval);
    let connector = SystemBusConnector::default();

    if cli.once {
        let mut monitor = Monitor::new(config.services.clone(), connector, sink);
        if let Err(e) = monitor.connect().await {
            tracing::warn!("Failed to connect to systemd: {}", e);
        }
        let report = monitor.read_cycle().await;
        tracing::info!("Read cycle finished: {:?}", report);
        return Ok(());
    }

    let mut scheduler = TickScheduler::new();
    if configure(&config, connector, sink, &mut scheduler).await.is_none() {
        return Ok(());
    }
    tracing::info!(
        "Monitoring {} services every {:?}",
        config.services.len(),
        config.interval
    );

    wait_for_shutdown().await?;
    scheduler.shutdown();

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    tracing::info!("Shutting down");
    Ok(())
}
