use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use itertools::Itertools;
use tracing::{error, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use data_explorer::config::context::build_explorer;
use data_explorer::config::schema::{load_config, load_config_from_string, ExplorerConfig};
use data_explorer::explorer::Explorer;
use data_explorer::notify::TracingHooks;

const DEFAULT_CONFIG_PATH: &str = "explorer.toml";
const DEFAULT_LOG_FILTER: &str = "data_explorer=info";

// Used when no config file exists: an empty account
const DEFAULT_CONFIG: &str = r#"
[source]
type = "memory"
"#;

#[derive(Debug, Parser)]
#[clap(
    name = "data-explorer",
    about = "Load a resource tree and open routes against it",
    version
)]
struct Args {
    #[clap(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,

    /// Hash route to open after the first refresh, e.g. dbs/db1/colls/c1/documents
    #[clap(long = "route", value_name = "HASH")]
    routes: Vec<String>,

    /// Emit logs as JSON
    #[clap(long)]
    json_logs: bool,
}

fn setup_logging(json_logs: bool) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the rendered tree, logs go to stderr
    if json_logs {
        tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_writer(std::io::stderr)),
        )?;
    } else {
        tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_writer(std::io::stderr)),
        )?;
    }

    LogTracer::init()?;
    Ok(())
}

// Returns whether the built-in default had to be used
fn load(args: &Args) -> Result<(ExplorerConfig, bool), Box<dyn Error>> {
    if args.config_path.exists() {
        Ok((load_config(&args.config_path)?, false))
    } else {
        Ok((load_config_from_string(DEFAULT_CONFIG, false, None)?, true))
    }
}

fn print_explorer(explorer: &Explorer) {
    for database in explorer.tree().databases() {
        let throughput = database
            .offer
            .as_ref()
            .and_then(|offer| offer.throughput)
            .map(|throughput| format!(" [{throughput} RU/s]"))
            .unwrap_or_default();
        println!(
            "{} {}{throughput}",
            if database.expanded { "v" } else { ">" },
            database.id
        );
        if !database.expanded {
            continue;
        }

        for collection in &database.collections {
            println!(
                "  {} {}",
                if collection.expanded { "v" } else { ">" },
                collection.id
            );
            if collection.expanded {
                for sub in collection
                    .stored_procedures
                    .iter()
                    .chain(&collection.triggers)
                    .chain(&collection.user_defined_functions)
                {
                    println!("      {} ({})", sub.id, sub.kind);
                }
            }
        }
    }

    if !explorer.tabs().is_empty() {
        println!();
        println!(
            "Tabs: {}",
            explorer
                .tabs()
                .tabs()
                .map(|tab| format!(
                    "{}{} #{}",
                    if tab.is_active() { "*" } else { "" },
                    tab.title(),
                    tab.hash_location()
                ))
                .join(" | ")
        );
    }
}

async fn run(args: Args, config: ExplorerConfig) -> Result<(), Box<dyn Error>> {
    let hooks = Arc::new(TracingHooks);
    let mut explorer = build_explorer(&config, hooks.clone(), hooks)?;

    explorer.set_account_ready(true);
    explorer.refresh_all_databases().await?;

    for route in &args.routes {
        let action = explorer.open_hash(route).await?;
        info!("Route {route}: {action:?}");
    }

    print_explorer(&explorer);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let (config, defaulted) = match load(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading config {}: {e}", args.config_path.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = setup_logging(args.json_logs || config.misc.json_logs) {
        eprintln!("Error setting up logging: {e}");
        return ExitCode::FAILURE;
    }
    if defaulted {
        warn!(
            "Config file {} not found, starting with an empty account",
            args.config_path.display()
        );
    }

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
