//! # Agenda: Task Gateway & Notifier
//!
//! Serves the backend-for-frontend API over the user and task services and
//! runs the periodic job that emails owners about tasks due in the next hour.
//!
//! Usage:
//!   agenda                          # gateway + scheduler (same as `agenda serve`)
//!   agenda serve --port 9000        # custom port
//!   agenda serve --no-scheduler     # gateway only
//!   agenda run-once                 # run one notification cycle and exit
//!   agenda check-config             # validate and print the effective config

use std::path::Path;
use std::sync::Arc;

use agenda_clients::{EmailClient, TasksClient, UsersClient};
use agenda_core::AgendaConfig;
use agenda_gateway::AppState;
use agenda_scheduler::{CronSchedule, NotificationCycle, spawn_scheduler};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agenda", version, about = "📅 Agenda: task gateway and upcoming-task notifier")]
struct Cli {
    /// Config file (default: $AGENDA_CONFIG, then ~/.agenda/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway and the notification scheduler
    Serve {
        /// Override the gateway port
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not start the notification scheduler
        #[arg(long)]
        no_scheduler: bool,
    },
    /// Run a single notification cycle and exit
    RunOnce,
    /// Validate the configuration and print it with secrets masked
    CheckConfig,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        "agenda=debug,agenda_core=debug,agenda_clients=debug,agenda_scheduler=debug,agenda_gateway=debug,tower_http=debug"
    } else {
        "agenda=info,agenda_core=info,agenda_clients=info,agenda_scheduler=info,agenda_gateway=info,tower_http=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<AgendaConfig> {
    let explicit = cli
        .config
        .clone()
        .or_else(|| std::env::var("AGENDA_CONFIG").ok().filter(|p| !p.trim().is_empty()));
    let mut config = match explicit {
        Some(p) => {
            let path = expand_path(&p);
            tracing::debug!(path = %path, "loading config");
            AgendaConfig::load_from(Path::new(&path))?
        }
        None => AgendaConfig::load()?,
    };
    config.apply_env_overrides();
    Ok(config)
}

fn build_cycle(
    config: &AgendaConfig,
    users: Arc<UsersClient>,
    tasks: Arc<TasksClient>,
) -> Result<Arc<NotificationCycle>> {
    let notifier = Arc::new(EmailClient::from_config(&config.upstream)?);
    Ok(Arc::new(NotificationCycle::from_config(
        &config.scheduler,
        &config.service_account,
        users,
        tasks,
        notifier,
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

async fn serve(mut config: AgendaConfig, port: Option<u16>, no_scheduler: bool) -> Result<()> {
    if let Some(port) = port {
        config.gateway.port = port;
    }
    if no_scheduler {
        config.scheduler.enabled = false;
    }
    config.validate()?;

    let tasks = Arc::new(TasksClient::from_config(&config.upstream)?);
    let users = Arc::new(UsersClient::from_config(&config.upstream)?);
    let mut state = AppState::new(tasks.clone(), users.clone());

    let scheduler = if config.scheduler.enabled {
        let schedule = CronSchedule::parse(&config.scheduler.cron)
            .with_context(|| "invalid scheduler.cron")?;
        let cycle = build_cycle(&config, users, tasks)?;
        state = state.with_cycle(cycle.clone());
        tracing::info!(
            cron = %schedule,
            lookahead_minutes = config.scheduler.lookahead_minutes,
            mark_policy = ?config.scheduler.mark_policy,
            "notification scheduler enabled"
        );
        Some(spawn_scheduler(cycle, schedule))
    } else {
        tracing::info!("notification scheduler disabled");
        None
    };

    println!("📅 Agenda v{}", env!("CARGO_PKG_VERSION"));
    println!("   🌐 Gateway: http://{}:{}", config.gateway.host, config.gateway.port);

    let served = agenda_gateway::start(&config.gateway, state, shutdown_signal()).await;

    if let Some((handle, stop)) = scheduler {
        let _ = stop.send(true);
        if let Err(e) = handle.await {
            tracing::warn!("scheduler task ended abnormally: {e}");
        }
    }
    served
}

async fn run_once(mut config: AgendaConfig) -> Result<()> {
    // a one-off run needs the same settings as the scheduled one
    config.scheduler.enabled = true;
    config.validate()?;

    let tasks = Arc::new(TasksClient::from_config(&config.upstream)?);
    let users = Arc::new(UsersClient::from_config(&config.upstream)?);
    let cycle = build_cycle(&config, users, tasks)?;

    let report = cycle.run_cycle().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_clean() {
        anyhow::bail!("{} task(s) failed", report.failures.len());
    }
    Ok(())
}

fn check_config(config: &AgendaConfig) -> Result<()> {
    config.validate()?;
    if config.scheduler.enabled {
        CronSchedule::parse(&config.scheduler.cron).with_context(|| "invalid scheduler.cron")?;
    }
    println!("{}", toml::to_string_pretty(&config.redacted())?);
    println!("✅ Configuration OK");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let config = load_config(&cli)?;

    match cli.command {
        None => serve(config, None, false).await,
        Some(Command::Serve { port, no_scheduler }) => serve(config, port, no_scheduler).await,
        Some(Command::RunOnce) => run_once(config).await,
        Some(Command::CheckConfig) => check_config(&config),
    }
}
