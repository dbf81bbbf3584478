//! Lumina CLI
//!
//! Runs the loading demos, serves the busy store to remote overlays, and
//! performs account operations with the terminal overlay attached.

mod demo;
mod overlay;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use lumina_auth::{AuthClient, AuthSession, Notification};
use lumina_core::{create_router, AppState, BusyRequest, BusyStore, Config, Layout, LuminaError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::overlay::TerminalOverlay;

/// Lumina - busy-state coordinator for learning clients
///
/// Shows a blocking overlay while operations are in flight, with spinner or
/// percentage progress.
#[derive(Parser, Debug)]
#[command(name = "lumina")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: lumina.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Render the overlay inline instead of fullscreen
    #[arg(long, global = true)]
    inline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a loading demo
    Demo {
        #[command(subcommand)]
        kind: DemoKind,
    },

    /// Serve the busy store over HTTP and WebSocket until Ctrl+C
    Serve {
        /// Port for the HTTP server (default: server.port from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Sign in and save credentials
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out and remove saved credentials
    Logout,

    /// Change the signed-in user's name and email
    UpdateProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
}

#[derive(Subcommand, Debug)]
enum DemoKind {
    /// Spinner for three seconds
    Simple,

    /// Random progress up to 100%
    Progress,

    /// A hook held pending for a while
    Hook {
        /// Ramp simulated progress
        #[arg(long)]
        auto_progress: bool,

        /// Start determinate at the fullscreen floor
        #[arg(long)]
        force_fullscreen: bool,

        /// How long the hook stays pending
        #[arg(long, default_value_t = 5)]
        seconds: u64,

        /// Message to show
        #[arg(long)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let store = BusyStore::from_config(&config);
    let layout = if args.inline {
        Layout::Inline
    } else {
        Layout::Fullscreen
    };

    let overlay = TerminalOverlay::spawn(store.mount_overlay(layout)?, std::io::stderr());
    let result = dispatch(args.command, &config, &store).await;
    overlay.shutdown().await;
    result
}

async fn dispatch(command: Command, config: &Config, store: &BusyStore) -> anyhow::Result<()> {
    match command {
        Command::Demo { kind } => {
            run_demo(kind, config, store).await;
            Ok(())
        }
        Command::Serve { port } => serve(config, store, port.unwrap_or(config.server.port)).await,
        Command::Login { email, password } => {
            let mut session = open_session(config, store)?;
            let mut notifications = session.subscribe();
            let ok = session.login(&email, &password).await;
            finish(ok, &mut notifications, "login")?;
            if let Some(user) = session.user() {
                println!("Signed in as {} <{}> ({})", user.name, user.email, user.account_type);
            }
            Ok(())
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let mut session = open_session(config, store)?;
            let mut notifications = session.subscribe();
            let ok = session.sign_up(&name, &email, &password).await;
            finish(ok, &mut notifications, "register")?;
            println!("Run `lumina login` to sign in");
            Ok(())
        }
        Command::Logout => {
            let mut session = open_session(config, store)?;
            let mut notifications = session.subscribe();
            let ok = session.logout().await;
            finish(ok, &mut notifications, "logout")
        }
        Command::UpdateProfile { name, email } => {
            let mut session = open_session(config, store)?;
            let mut notifications = session.subscribe();
            let ok = session.change_information(&name, &email).await;
            finish(ok, &mut notifications, "update-profile")
        }
    }
}

async fn run_demo(kind: DemoKind, config: &Config, store: &BusyStore) {
    match kind {
        DemoKind::Simple => demo::simple(store).await,
        DemoKind::Progress => {
            let mut rng = config
                .progress
                .seed
                .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
            demo::progress(store, &mut rng).await;
        }
        DemoKind::Hook {
            auto_progress,
            force_fullscreen,
            seconds,
            message,
        } => {
            let mut request = BusyRequest::idle()
                .with_auto_progress(auto_progress)
                .with_force_fullscreen(force_fullscreen);
            if let Some(message) = message {
                request = request.with_message(message);
            }
            demo::hook(
                store,
                config.progress.clone(),
                request,
                Duration::from_secs(seconds),
            )
            .await;
        }
    }
}

/// Runs the remote overlay server until Ctrl+C.
async fn serve(config: &Config, store: &BusyStore, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let router = create_router(AppState::new(config.clone(), store.clone()));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| LuminaError::server_bind(addr, e.to_string()))?;

    tracing::info!(%addr, "Remote overlay server listening");
    eprintln!("Serving busy state on http://{addr} (WebSocket at ws://{addr}/ws)");
    eprintln!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            }
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

/// Creates a session with saved credentials restored.
fn open_session(config: &Config, store: &BusyStore) -> anyhow::Result<AuthSession> {
    let client = AuthClient::new(&config.auth)?;
    let mut session = AuthSession::new(client, store.clone(), config)
        .with_persistence(PathBuf::from(&config.auth.credentials_file));
    if session.restore()? {
        tracing::debug!("Using saved credentials");
    }
    Ok(session)
}

/// Prints the notifications of an operation and maps its outcome.
fn finish(
    ok: bool,
    notifications: &mut broadcast::Receiver<Notification>,
    operation: &str,
) -> anyhow::Result<()> {
    while let Ok(notification) = notifications.try_recv() {
        println!("[{}] {}", notification.level, notification.message);
    }

    if ok {
        Ok(())
    } else {
        anyhow::bail!("{operation} failed")
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}
