//! Shelly Panel - Raspberry Pi home dashboard backend binary
//!
//! Serves the relay API for the dashboard, or reads and switches relays
//! straight from the command line.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use shelly_panel::shelly::response::{BatchResponse, CommandResponse};
use shelly_panel::{start_web_server, CommandRequest, DeviceState, DispatchMode, PanelConfig};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "shelly_panel")]
#[command(about = "Shelly Panel - Raspberry Pi home dashboard backend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Austin Couch")]
#[command(long_about = "Reads and switches Shelly smart relays for the home dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the TOML configuration file
    #[arg(short, long, env = "SHELLY_PANEL_CONFIG")]
    config: Option<PathBuf>,

    /// Web server bind address (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Web server port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Query devices one at a time instead of concurrently
    #[arg(long)]
    sequential: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve(ServeArgs),

    /// Read the state of every configured relay and exit
    List(ListArgs),

    /// Switch one relay and exit
    Command(CommandArgs),

    /// Show the configured devices
    Devices,
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Static files directory for the dashboard front-end
    #[arg(long)]
    static_dir: Option<String>,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,
}

#[derive(Args)]
struct ListArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[derive(Args)]
struct CommandArgs {
    /// Device id from the configuration
    device: String,

    /// Action: on, off or toggle
    action: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = load_config(&cli)?;

    match &cli.command {
        Some(Commands::Serve(args)) => serve_command(config, args).await?,
        Some(Commands::List(args)) => list_command(&config, args).await?,
        Some(Commands::Command(args)) => command_command(&config, args).await?,
        Some(Commands::Devices) => devices_command(&config),
        None => serve_command(config, &ServeArgs::default()).await?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<PanelConfig> {
    let mut config = PanelConfig::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("loading configuration from {}", path.display()),
        None => "loading configuration".to_string(),
    })?;

    if let Some(host) = &cli.host {
        config.web = config.web.with_host(host.clone());
    }
    if let Some(port) = cli.port {
        config.web = config.web.with_port(port);
    }
    if cli.sequential {
        config.rpc.dispatch = DispatchMode::Sequential;
    }

    Ok(config)
}

async fn serve_command(mut config: PanelConfig, args: &ServeArgs) -> anyhow::Result<()> {
    info!("Starting Shelly panel...");

    if let Some(static_dir) = &args.static_dir {
        config.web = config.web.with_static_path(Some(static_dir.clone()));
        info!("Using static files from: {}", static_dir);
    }
    if args.no_cors {
        config.web = config.web.with_cors(false);
    }

    info!("Web server configuration:");
    info!("  - Bind address: {}", config.web.bind_address());
    info!("  - CORS enabled: {}", config.web.enable_cors);
    info!("  - Devices: {}", config.devices.len());
    info!("  - Dispatch: {:?}", config.rpc.dispatch);

    let controller = config.build_controller();
    start_web_server(config.web, controller).await?;

    Ok(())
}

async fn list_command(config: &PanelConfig, args: &ListArgs) -> anyhow::Result<()> {
    let controller = config.build_controller();
    let batch = controller.list().await?;

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&BatchResponse::from(&batch))?;
            println!("{}", json);
        }
        "pretty" => {
            println!(
                "Shelly devices ({})",
                batch.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("==========================================");
            for result in &batch.results {
                let marker = match result.state {
                    DeviceState::On => "ON ",
                    DeviceState::Off => "OFF",
                    DeviceState::Unknown => " ? ",
                };
                println!(
                    "  [{}] {} ({}): {}",
                    marker,
                    result.device.display_label(),
                    result.device.id,
                    result.description
                );
            }
            if batch.has_errors {
                println!();
                println!("Some devices could not be read.");
            }
        }
        _ => {
            error!("Unsupported format: {}. Use 'json' or 'pretty'", args.format);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn command_command(config: &PanelConfig, args: &CommandArgs) -> anyhow::Result<()> {
    let controller = config.build_controller();
    let request = CommandRequest::new(args.device.clone(), args.action.clone());
    let result = controller.command(&request).await?;

    println!("{}", serde_json::to_string_pretty(&CommandResponse::from(&result))?);

    if !result.ok() {
        std::process::exit(1);
    }

    Ok(())
}

fn devices_command(config: &PanelConfig) {
    if config.devices.is_empty() {
        println!("No devices configured.");
        return;
    }

    println!("Configured devices:");
    for device in &config.devices {
        println!(
            "  {} - {} ({}, relay {}, auth {})",
            device.id,
            device.display_label(),
            device.base_url,
            device.relay_id,
            device.auth.describe()
        );
    }
}
