//! Command-line front end for the bridge.
//!
//! ```text
//! bitwig-osc call '{"name":"set_tempo","arguments":{"bpm":124}}'
//! bitwig-osc resource bitwig://tracks
//! bitwig-osc browse --context device --tab Everything
//! bitwig-osc monitor --seconds 10
//! bitwig-osc prompt create_track_template --args '{"track_type":"drums"}'
//! bitwig-osc status
//! ```
//!
//! Settings come from the environment (a `.env` file is loaded first) and
//! may be overridden by flags.

// ============================================================================
// Imports
// ============================================================================

use std::net::IpAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bitwig_osc_bridge::{
    AddressPattern, BridgeConfig, BrowseContext, BrowserNavigator, Controller, Message,
    OscClient, OscListener, Result, ToolCall, ToolError, Tools, address, tools,
};

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "bitwig-osc", about = "Control Bitwig Studio over OSC", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// DAW host
    #[arg(long, global = true)]
    host: Option<IpAddr>,

    /// Port the DAW listens on
    #[arg(long, global = true)]
    send_port: Option<u16>,

    /// Port the bridge listens on
    #[arg(long, global = true)]
    receive_port: Option<u16>,

    /// Reply timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, env = "BITWIG_MCP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable debug logging for the bridge
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute a tool call given as JSON
    Call {
        /// `{"name": .., "arguments": {..}}`
        json: String,
    },
    /// Print a `bitwig://` resource, or list them
    Resource {
        /// Resource URI; omit to list all
        uri: Option<String>,
    },
    /// Open the browser, collect every result and cancel
    Browse {
        /// device, device_before or preset
        #[arg(long, default_value = "device")]
        context: BrowseContext,
        /// Tab to select before collecting
        #[arg(long)]
        tab: Option<String>,
    },
    /// Print every inbound message
    Monitor {
        /// Seconds to listen for
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
    /// Render a prompt template, or list them
    Prompt {
        /// Prompt name; omit to list all
        name: Option<String>,
        /// Arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
    /// Ping the DAW and print connection health
    Status,
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.debug, cli.log_level.as_deref());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{}", ToolError::from(&e).to_json());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool, level: Option<&str>) {
    let fallback = if debug {
        "bitwig_osc_bridge=debug".to_string()
    } else {
        match level {
            Some(level) => format!("bitwig_osc_bridge={}", level.to_lowercase()),
            None => "bitwig_osc_bridge=info".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn config_from(cli: &Cli) -> Result<BridgeConfig> {
    let mut config = BridgeConfig::from_env()?;
    if let Some(host) = cli.host {
        config = config.with_host(host);
    }
    if let Some(port) = cli.send_port {
        config = config.with_send_port(port);
    }
    if let Some(port) = cli.receive_port {
        config = config.with_receive_port(port);
    }
    if let Some(ms) = cli.timeout_ms {
        config = config.with_response_timeout(Duration::from_millis(ms));
    }
    config.validate()?;
    Ok(config)
}

// ============================================================================
// Commands
// ============================================================================

async fn run(cli: Cli) -> Result<()> {
    let config = config_from(&cli)?;

    match cli.command {
        Command::Call { json } => {
            let call = ToolCall::from_json(&json)?;
            let tools = Tools::new(Controller::connect(config).await?);
            let status = tools.execute(call).await;
            tools.endpoint().shutdown().await;
            println!("{}", status?);
        }
        Command::Resource { uri: None } => {
            let listing = tools::list_resources();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Command::Resource { uri: Some(uri) } => {
            let tools = Tools::new(Controller::connect(config).await?);
            let text = tools.read_resource(&uri).await;
            tools.endpoint().shutdown().await;
            println!("{}", text?);
        }
        Command::Browse { context, tab } => {
            let controller = Controller::connect(config).await?;
            let outcome = browse(&controller, context, tab.as_deref()).await;
            controller.shutdown().await;
            println!("{}", serde_json::to_string_pretty(&outcome?)?);
        }
        Command::Monitor { seconds } => monitor(config, Duration::from_secs(seconds)).await?,
        Command::Prompt { name: None, .. } => {
            println!("{}", serde_json::to_string_pretty(&tools::list_prompts())?);
        }
        Command::Prompt {
            name: Some(name),
            args,
        } => {
            let arguments = match args {
                Some(json) => serde_json::from_str(&json)?,
                None => serde_json::Value::Null,
            };
            println!("{}", tools::render_prompt(&name, &arguments)?.text);
        }
        Command::Status => {
            let controller = Controller::connect(config).await?;
            let reachable = controller.ping(controller.config().response_timeout).await;
            let status = controller.status();
            controller.shutdown().await;
            info!(reachable, "Status collected");
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

async fn browse(
    controller: &Controller,
    context: BrowseContext,
    tab: Option<&str>,
) -> Result<Vec<bitwig_osc_bridge::CollectedResult>> {
    let mut navigator = BrowserNavigator::new(controller.clone());
    navigator.open(context).await?;

    let collected = async {
        if let Some(tab) = tab {
            navigator.select_tab(tab).await?;
        }
        navigator.collect_all_results().await
    }
    .await;

    navigator.cancel().await?;
    collected
}

async fn monitor(config: BridgeConfig, duration: Duration) -> Result<()> {
    let listener = OscListener::bind(config.receive_addr()).await?;
    let count = Arc::new(AtomicUsize::new(0));
    {
        let count = Arc::clone(&count);
        listener.register_handler(AddressPattern::Any, move |message| {
            count.fetch_add(1, Ordering::Relaxed);
            println!("{message}");
        });
    }
    listener.set_error_observer(|e| eprintln!("! {e}"));
    listener.start();

    let client = OscClient::bind(config.send_addr()).await?;
    client.send(&Message::trigger(address::REFRESH)).await?;
    info!(listen = %listener.local_addr(), seconds = duration.as_secs(), "Monitoring");

    tokio::select! {
        () = tokio::time::sleep(duration) => {}
        _ = tokio::signal::ctrl_c() => {}
    }

    listener.stop().await;
    info!(messages = count.load(Ordering::Relaxed), "Monitor stopped");
    Ok(())
}
