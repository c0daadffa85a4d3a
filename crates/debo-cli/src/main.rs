//! debo - command line client for the Debo Ethiopia API.
//!
//! Lists projects, manages the signed-in session and reads user records.
//! The access token is kept between runs (file or OS keychain).

mod commands;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use debo_core::auth::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, RecordingNavigator, TokenStore,
};
use debo_core::{ClientConfig, Config, HttpClient};

#[derive(Debug, Parser)]
#[command(name = "debo", version, about = "Client for the Debo Ethiopia API")]
struct Cli {
    /// API host, e.g. http://localhost:8000
    #[arg(long, global = true, env = "DEBO_API_URL")]
    base_url: Option<String>,

    /// Where the access token is kept between runs
    #[arg(long, global = true, value_enum, default_value_t = StoreKind::File)]
    store: StoreKind,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StoreKind {
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Public project listing
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },
    /// User records (requires login)
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Sign in and store the access token
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out and forget the access token
    Logout,
    /// Show whether an access token is stored
    Status,
}

#[derive(Debug, Subcommand)]
enum ProjectsAction {
    List {
        #[arg(long)]
        page: Option<u32>,
        /// Follow `next` links until the last page
        #[arg(long)]
        all: bool,
    },
    Get {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum UsersAction {
    List {
        #[arg(long)]
        page: Option<u32>,
    },
    Get {
        id: String,
    },
    /// The signed-in user
    Me,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().context("Log file path has no file name")?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

fn token_store(kind: StoreKind) -> Result<Arc<dyn TokenStore>> {
    Ok(match kind {
        StoreKind::File => Arc::new(
            FileTokenStore::default_location().context("Failed to locate token file")?,
        ),
        StoreKind::Keyring => Arc::new(KeyringTokenStore::new()),
        StoreKind::Memory => Arc::new(MemoryTokenStore::new()),
    })
}

/// From here on Ctrl-C cancels the command instead of killing the process
fn listen_for_interrupt(cancel: &CancellationToken) {
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });
}

async fn projects(ctx: &commands::Context, action: ProjectsAction) -> Result<()> {
    match action {
        ProjectsAction::List { page, all } => commands::list_projects(ctx, page, all).await,
        ProjectsAction::Get { id } => commands::get_project(ctx, &id).await,
    }
}

async fn users(ctx: &commands::Context, action: UsersAction) -> Result<()> {
    match action {
        UsersAction::List { page } => commands::list_users(ctx, page).await,
        UsersAction::Get { id } => commands::get_user(ctx, &id).await,
        UsersAction::Me => commands::get_user(ctx, "me").await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_ref())?;
    info!("debo starting");

    let mut settings = Config::load().unwrap_or_else(|e| {
        debug!(error = %e, "Ignoring unreadable config file");
        Config::default()
    });

    let mut client_config = settings.apply(ClientConfig::from_env()?);
    if let Some(ref url) = cli.base_url {
        client_config.base_url = url.clone();
    }
    debug!(api_root = %client_config.api_root(), "Using API");

    let navigator = RecordingNavigator::new();
    let public = HttpClient::public(client_config.clone())?;
    let authed = HttpClient::authenticated(
        client_config,
        token_store(cli.store)?,
        Arc::new(navigator.clone()),
    )?;

    let cancel = CancellationToken::new();
    let ctx = commands::Context {
        public,
        authed,
        cancel: cancel.clone(),
    };

    let is_logout = matches!(cli.command, Command::Logout);
    let result = match cli.command {
        Command::Projects { action } => {
            listen_for_interrupt(&cancel);
            commands::until_interrupted(&cancel, projects(&ctx, action))
                .await
                .map(|_| ())
        }
        Command::Users { action } => {
            listen_for_interrupt(&cancel);
            commands::until_interrupted(&cancel, users(&ctx, action))
                .await
                .map(|_| ())
        }
        Command::Login { email } => {
            // Prompts come first so Ctrl-C still ends the process there
            let credentials = commands::read_credentials(&settings, email)?;
            listen_for_interrupt(&cancel);
            let signed_in =
                commands::until_interrupted(&cancel, commands::login(&ctx, &credentials)).await;
            if let Ok(Some(())) = signed_in {
                settings.last_email = Some(credentials.email);
                if let Err(e) = settings.save() {
                    warn!(error = %e, "Failed to save config");
                }
            }
            signed_in.map(|_| ())
        }
        Command::Logout => {
            listen_for_interrupt(&cancel);
            commands::logout(&ctx).await;
            Ok(())
        }
        Command::Status => {
            commands::status(&ctx);
            Ok(())
        }
    };

    // A redirect to the login route means the session ended
    if navigator.last().is_some() && !is_logout {
        eprintln!("Your session has expired. Run `debo login` to sign in again.");
    }

    info!("debo finished");
    result
}
