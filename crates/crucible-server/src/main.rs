use anyhow::Result;
use clap::{Parser, Subcommand};
use crucible_core::storage::Store;
use crucible_server::config::ServerConfig;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Test-file upload and run-request API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        db_path: Option<PathBuf>,
        #[arg(long)]
        data_root: Option<PathBuf>,
        #[arg(long)]
        runner_url: Option<String>,
    },
    /// Create a test environment. Names are unique; environments are
    /// immutable once referenced by a run request.
    AddEnv {
        name: String,
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = ServerConfig::from_env();
    init_logging(&cfg.log_level);

    match cli.command {
        Command::Serve {
            bind,
            db_path,
            data_root,
            runner_url,
        } => {
            if let Some(v) = bind {
                cfg.bind = v;
            }
            if let Some(v) = db_path {
                cfg.db_path = v;
            }
            if let Some(v) = data_root {
                cfg.data_root = v;
            }
            if let Some(v) = runner_url {
                cfg.runner_url = Some(v);
            }
            tracing::info!(event = "server_start", config = ?cfg);
            crucible_server::server::serve(cfg).await
        }
        Command::AddEnv { name, db_path } => {
            if let Some(v) = db_path {
                cfg.db_path = v;
            }
            let store = Store::open(&cfg.db_path)?;
            store.init_schema()?;
            let env = store.create_environment(&name)?;
            println!("created environment {} (id {})", env.name, env.id);
            Ok(())
        }
    }
}
