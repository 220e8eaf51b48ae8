//! vantage - command line access to the analysis platform API.
//!
//! Logs in against the platform backend, keeps the session between runs and
//! issues authenticated calls to any API path.

mod console;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vantage_core::api::{ApiClient, ApiRequest, AuthApi, MultipartForm};
use vantage_core::auth::{FileStore, KeyValueStore, KeyringStore, Session};
use vantage_core::config::{Config, StorageBackend};
use vantage_core::router::{RouteTable, Router, LOGIN_ROUTE};

use console::{ConsoleNavigator, ConsoleNotifier};

/// Log file name prefix inside `log_dir`
const LOG_FILE_PREFIX: &str = "vantage.log";

#[derive(Parser)]
#[command(name = "vantage", version, about = "Command line client for the vantage analysis platform")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and keep the session for later commands
    Login {
        #[arg(short, long, env = "VANTAGE_USERNAME")]
        username: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// GET an API path and print the JSON payload
    Get {
        path: String,
        /// Query parameter as key=value
        #[arg(short, long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
    /// POST to an API path with an optional JSON body
    Post {
        path: String,
        #[arg(long)]
        json: Option<String>,
    },
    /// POST a multipart upload
    Upload {
        path: String,
        /// Text field as key=value
        #[arg(long = "field", value_parser = parse_pair)]
        fields: Vec<(String, String)>,
        /// File part as field=path
        #[arg(long = "file", value_parser = parse_pair)]
        files: Vec<(String, String)>,
    },
    /// Save the raw response of an API path to a file
    Download {
        path: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Resolve an application route through the login guard
    Open { route: String },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    Ok(match config.storage_backend() {
        StorageBackend::File => Arc::new(FileStore::new(config.cache_dir()?)),
        StorageBackend::Keyring => Arc::new(KeyringStore::new()),
    })
}

fn prompt_username() -> Result<String> {
    eprint!("Username: ");
    io::stderr().flush()?;
    let mut username = String::new();
    io::stdin().lock().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

fn prompt_password() -> Result<String> {
    if let Ok(password) = std::env::var("VANTAGE_PASSWORD") {
        return Ok(password);
    }
    Ok(rpassword::prompt_password("Password: ")?)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, mut config: Config) -> Result<()> {
    let navigator = Arc::new(ConsoleNavigator);
    let session = Arc::new(Session::restore(open_store(&config)?, navigator.clone(), LOGIN_ROUTE));
    let client = ApiClient::new(config.client_config(), session.clone(), Arc::new(ConsoleNotifier))
        .context("Failed to build HTTP client")?;

    match command {
        Command::Login { username } => {
            let username = match username.or_else(|| config.last_username.clone()) {
                Some(u) if !u.is_empty() => u,
                _ => prompt_username()?,
            };
            let password = prompt_password()?;
            if username.is_empty() || password.is_empty() {
                anyhow::bail!("Username and password required");
            }

            let auth = AuthApi::new(client);
            if !session.login(&auth, &username, &password).await {
                anyhow::bail!("Login failed: invalid credentials or server unreachable");
            }

            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Logged in as {}", session.username());
        }
        Command::Logout => {
            session.logout();
            println!("Logged out");
        }
        Command::Whoami => {
            if !session.is_logged_in() {
                println!("Not logged in");
            } else if let Some(user) = session.user_info() {
                println!("{} <{}> {}", user.username, user.email, user.full_name);
            } else {
                println!("Logged in (profile not available)");
            }
        }
        Command::Get { path, query } => {
            let request = query
                .into_iter()
                .fold(ApiRequest::get(path), |req, (k, v)| req.query(k, v));
            let payload = client.send(request).await?.into_json::<serde_json::Value>()?;
            print_json(&payload)?;
        }
        Command::Post { path, json } => {
            let payload: serde_json::Value = match json {
                Some(body) => {
                    let body: serde_json::Value =
                        serde_json::from_str(&body).context("--json is not valid JSON")?;
                    client.post(&path, &body).await?
                }
                None => client.post_empty(&path).await?,
            };
            print_json(&payload)?;
        }
        Command::Upload { path, fields, files } => {
            let mut form = fields
                .into_iter()
                .fold(MultipartForm::new(), |form, (k, v)| form.text(k, v));
            for (field, file) in files {
                let file = PathBuf::from(file);
                let bytes = std::fs::read(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let file_name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| field.clone());
                form = form.file(field, file_name, None, bytes);
            }
            let payload: serde_json::Value = client.post_multipart(&path, form).await?;
            print_json(&payload)?;
        }
        Command::Download { path, output } => {
            let response = client.download(&path).await?;
            std::fs::write(&output, &response.body)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Saved {} bytes to {}", response.body.len(), output.display());
        }
        Command::Open { route } => {
            let router = Router::new(RouteTable::default_app(), session, navigator);
            let landed = router.push(&route)?;
            println!("{}", landed);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = Config::load();
    let log_dir = config.as_ref().ok().and_then(|c| c.log_dir.clone());
    let _guard = init_tracing(log_dir.as_deref());

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    info!("vantage starting");

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
