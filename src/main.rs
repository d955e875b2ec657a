use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use visitor_kiosk::camera::MediaDevices;
use visitor_kiosk::geolocation::{FixedGeolocation, Geolocation};
use visitor_kiosk::transport::{HttpScanTransport, MockScanTransport, ScanTransport};
use visitor_kiosk::{KioskConfig, KioskOrchestrator, MockMediaDevices};

#[derive(Parser, Debug)]
#[command(name = "kiosk")]
#[command(about = "Face-scan visitor check-in kiosk")]
#[command(version)]
#[command(long_about = "Kiosk client for visitor check-in: captures a still from the camera, \
submits it to the recognition backend, and collects registration details from first-time \
visitors before resubmitting.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "kiosk.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", help = "Append logs to a file in addition to stderr")]
    log_file: Option<String>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the kiosk")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - initialize but don't start components
    #[arg(long, help = "Perform dry run - initialize components but don't start them")]
    dry_run: bool,

    /// Use a simulated camera
    #[arg(long, help = "Use a simulated camera instead of real capture devices")]
    mock_camera: bool,

    /// Use a scripted backend
    #[arg(long, help = "Answer scans locally instead of calling the recognition backend")]
    mock_backend: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let log_guard = init_logging(&args)?;

    info!("Starting visitor kiosk v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match KioskConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match config.validate() {
        Ok(()) if args.validate_config => {
            info!("Configuration validation successful");
            println!("✓ Configuration is valid");
            return Ok(());
        }
        Ok(()) => {}
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
    }

    let media = create_media_devices(&args)?;
    let transport = create_transport(&args, &config)?;
    let geolocation = FixedGeolocation::from_config(&config.geolocation)
        .map(|provider| Arc::new(provider) as Arc<dyn Geolocation>);
    if geolocation.is_none() {
        warn!("No kiosk position configured; location will be reported as not supported");
    }

    let mut orchestrator = KioskOrchestrator::new(config, media, transport, geolocation);
    orchestrator.set_console_enabled(true);

    orchestrator.initialize().await.map_err(|e| {
        error!("Failed to initialize kiosk: {}", e);
        e
    })?;

    if args.dry_run {
        info!("Dry run mode - components initialized but not started");
        println!("✓ Dry run completed successfully - all components initialized");
        return Ok(());
    }

    orchestrator.start().await.map_err(|e| {
        error!("Failed to start kiosk: {}", e);
        e
    })?;

    let exit_code = orchestrator.run().await.map_err(|e| {
        error!("Kiosk error during execution: {}", e);
        e
    })?;

    info!("Visitor kiosk exited with code: {}", exit_code);

    // Flush file logs before exiting
    drop(log_guard);
    std::process::exit(exit_code);
}

fn create_media_devices(args: &Args) -> Result<Arc<dyn MediaDevices>> {
    if args.mock_camera {
        info!("Using simulated camera");
        return Ok(Arc::new(MockMediaDevices::with_cameras(2)));
    }

    #[cfg(all(target_os = "linux", feature = "camera"))]
    {
        let devices = visitor_kiosk::camera::GstMediaDevices::new()
            .context("Failed to initialize GStreamer camera backend")?;
        return Ok(Arc::new(devices));
    }

    #[cfg(not(all(target_os = "linux", feature = "camera")))]
    {
        anyhow::bail!(
            "Built without camera support; rebuild with --features camera or pass --mock-camera"
        );
    }
}

fn create_transport(args: &Args, config: &KioskConfig) -> Result<Arc<dyn ScanTransport>> {
    if args.mock_backend {
        info!("Using scripted scan backend");
        return Ok(Arc::new(MockScanTransport::new()));
    }

    info!("Scan backend: {}", config.transport.scan_url());
    let transport =
        HttpScanTransport::new(&config.transport).context("Failed to create scan backend client")?;
    Ok(Arc::new(transport))
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("visitor_kiosk={0},kiosk={0}", log_level)));

    // Stdout belongs to the kiosk screen
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match args.log_file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Visitor kiosk configuration file");
    println!("# Every key can also be set through KIOSK_<SECTION>__<KEY> environment variables");
    println!("# [geolocation] latitude/longitude are optional; omit them when the kiosk position is unknown");
    println!();

    let default_config = toml::to_string_pretty(&KioskConfig::default())
        .context("Failed to serialize default configuration")?;
    println!("{}", default_config);
    Ok(())
}
