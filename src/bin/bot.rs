use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use server_status::{
    actors::scheduler::SchedulerHandle,
    commands::{Command, CommandHandler, CommandReply},
    config::Config,
    discord,
    monitors::{HttpProber, Monitor},
    registry::Registry,
    report::ReportBuilder,
    storage::{PersistenceStore, json::JsonFileStore, memory::MemoryStore},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Registry file (overrides DATA_FILE)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Probe timeout in milliseconds (overrides REQUEST_TIMEOUT)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Sweep interval in milliseconds (overrides CHECK_INTERVAL)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: Option<u64>,

    /// Command API bind address (overrides API_ADDR)
    #[arg(long)]
    listen: Option<std::net::SocketAddr>,

    /// Keep the registry in memory only
    #[arg(long)]
    no_persist: bool,

    /// Do not start the command API
    #[arg(long)]
    no_api: bool,
}

fn log_filter() -> filter::Targets {
    filter::Targets::new().with_targets(vec![
        ("server_status", LevelFilter::DEBUG),
        (module_path!(), LevelFilter::TRACE),
        ("tower_http", LevelFilter::DEBUG),
    ])
}

fn init() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(log_filter())
        .init();
}

fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(path) = &args.data_file {
        config.data_file = path.clone();
    }
    if let Some(timeout) = args.timeout_ms {
        config.request_timeout = Duration::from_millis(timeout);
    }
    if let Some(interval) = args.interval_ms {
        config.check_interval = Duration::from_millis(interval);
    }
    if let Some(addr) = args.listen {
        config.api_addr = addr;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = resolve_config(&args)?;

    let store: Arc<dyn PersistenceStore> = if args.no_persist {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::new(&config.data_file))
    };

    let registry = Arc::new(Registry::restore(store).await);
    let prober = HttpProber::new(config.request_timeout).context("failed to build HTTP client")?;
    let monitor = Monitor::new(registry.clone(), Arc::new(prober));

    let scheduler = SchedulerHandle::spawn(monitor.clone(), config.check_interval);
    info!(
        "checking {} servers every {}s",
        registry.len().await,
        config.check_interval.as_secs()
    );

    let commands = CommandHandler::new(monitor, ReportBuilder::new(config.request_timeout));

    #[cfg(feature = "api")]
    {
        use server_status::api::{ApiConfig, ApiState, spawn_api_server};

        if !args.no_api {
            let api_config = ApiConfig {
                bind_addr: config.api_addr,
            };
            spawn_api_server(api_config, ApiState::new(commands.clone())).await?;
        }
    }

    run_command_loop(&commands).await;

    info!("shutting down");
    if let Err(e) = scheduler.shutdown().await {
        warn!("scheduler already stopped: {e:#}");
    }
    registry.flush().await;

    Ok(())
}

/// Read commands from stdin until Ctrl-C
///
/// A closed stdin (e.g. running as a service) only stops command input;
/// the scheduler and API keep running.
async fn run_command_loop(commands: &CommandHandler) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    println!("{}", server_status::commands::HELP);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => handle_line(commands, &line).await,
                Ok(None) => {
                    debug!("stdin closed, command input disabled");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("failed to read stdin: {e}");
                    stdin_open = false;
                }
            },
        }
    }
}

async fn handle_line(commands: &CommandHandler, line: &str) {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    match commands.execute(command).await {
        Ok(reply) => print!("{}", render_reply(&reply)),
        Err(e) => println!("Error: {e}"),
    }
}

fn render_reply(reply: &CommandReply) -> String {
    match reply {
        CommandReply::Report(report) => discord::status_markdown(report),
        CommandReply::Added(target) => {
            let content = discord::added_message(target).content.unwrap_or_default();
            format!("{content}\n")
        }
        CommandReply::Help(help) => format!("{help}\n"),
    }
}
