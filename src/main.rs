use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use findermenu::bus::{NotificationBus, SocketBus};
use findermenu::config::{default_config_path, load_config, Config};
use findermenu::daemon::ServiceDaemon;
use findermenu::executor::{Interpreters, ScriptRunner};
use findermenu::logging;
use findermenu::menu_provider::{MenuProvider, ProviderEvent};
use findermenu::protocol::{encode_click, ClickEvent, MENU_ITEM_CLICKED_NOTIF, MENU_ITEM_INFO_REQUEST_NOTIF};
use findermenu::run_loop::RunLoop;
use findermenu::scripts::ScriptRegistry;
use findermenu::stdin_commands;

#[derive(Parser, Debug)]
#[command(name = "findermenu", version, about = "Run scripts from the folder context menu")]
struct Cli {
    /// Config file (defaults to <config_dir>/findermenu/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the script menu and run clicked scripts
    Daemon,
    /// Headless menu provider driven by JSONL commands on stdin
    Menu,
    /// Print the scripts the daemon would register
    Scripts,
    /// Publish one click event
    Click {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        target: PathBuf,
    },
    /// Ask a running daemon to announce its menu
    Request,
}

impl Commands {
    fn process_name(&self) -> &'static str {
        match self {
            Commands::Daemon => "findermenu-daemon",
            Commands::Menu => "findermenu-menu",
            _ => "findermenu-cli",
        }
    }
}

fn open_bus(config: &Config) -> anyhow::Result<Arc<SocketBus>> {
    let bus_dir = config.get_bus_dir();
    let bus = SocketBus::open(&bus_dir)
        .with_context(|| format!("Failed to open notification bus at {}", bus_dir.display()))?;
    Ok(Arc::new(bus))
}

fn run_daemon(config: &Config) -> anyhow::Result<()> {
    let registry = ScriptRegistry::scan(&config.get_scripts_dir());
    let runner = ScriptRunner::system(Interpreters::from_config(config));
    let bus = open_bus(config)?;

    let run_loop = RunLoop::new(config.get_inbox_capacity());
    let daemon = ServiceDaemon::new(registry, runner, bus);
    daemon
        .start(&run_loop.sender())
        .context("Failed to subscribe daemon channels")?;
    daemon.run(&run_loop);
    Ok(())
}

fn run_menu(config: &Config) -> anyhow::Result<()> {
    let bus = open_bus(config)?;
    let run_loop: RunLoop<ProviderEvent> = RunLoop::new(config.get_inbox_capacity());

    let mut provider = MenuProvider::new(bus);
    provider
        .start(&run_loop.sender())
        .context("Failed to subscribe menu channel")?;
    let _stdin_listener = stdin_commands::start_stdin_listener(run_loop.sender())
        .context("Failed to start stdin listener")?;

    let handlers = MenuProvider::handlers();
    let stdout = std::io::stdout();
    run_loop.run(|event| provider.handle_event(&handlers, event, &mut stdout.lock()));
    info!(event_type = "provider_lifecycle", "Menu provider exiting");
    Ok(())
}

fn print_scripts(config: &Config) -> anyhow::Result<()> {
    let registry = ScriptRegistry::scan(&config.get_scripts_dir());
    let scripts: Vec<_> = registry.iter().collect();
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &scripts)?;
    writeln!(stdout)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = load_config(&config_path);
    let _guard = logging::init(cli.command.process_name(), &config.get_log_dir());
    info!(config_path = %config_path.display(), "Configuration loaded");

    match cli.command {
        Commands::Daemon => run_daemon(&config),
        Commands::Menu => run_menu(&config),
        Commands::Scripts => print_scripts(&config),
        Commands::Click { id, target } => {
            let target = std::path::absolute(&target)
                .with_context(|| format!("Invalid target {}", target.display()))?;
            let payload = encode_click(&ClickEvent::new(id, target.to_string_lossy()))?;
            let delivered = open_bus(&config)?.publish(MENU_ITEM_CLICKED_NOTIF, Some(&payload));
            println!("{}", delivered);
            Ok(())
        }
        Commands::Request => {
            let delivered = open_bus(&config)?.publish(MENU_ITEM_INFO_REQUEST_NOTIF, None);
            println!("{}", delivered);
            Ok(())
        }
    }
}
