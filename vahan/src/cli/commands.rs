//! CLI command execution.
//!
//! Each subcommand builds an `AppState` over the configured storage, runs one
//! action and prints the resulting slice.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use vahan::api::ApiClient;
use vahan::chat::read_history;
use vahan::config::Config;
use vahan::models::{Credentials, ModelMetrics, SessionId, SessionMetrics, SignupDetails};
use vahan::state::AppState;
use vahan::storage::{FileStorage, MemoryStorage, Storage};

use super::args::{Cli, Commands, DocsAction};
use super::chat::{self, print_message};
use super::prompt::prompt_password;

/// Defaults, then the config file, then `VAHAN_*`, then flags.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_env();
    if let Some(api_url) = &cli.api_url {
        config.api_url.clone_from(api_url);
    }
    if let Some(ws_url) = &cli.ws_url {
        config.ws_url = Some(ws_url.clone());
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    Ok(config)
}

fn open_storage(cli: &Cli, config: &Config) -> Result<Arc<dyn Storage>> {
    if cli.ephemeral {
        return Ok(Arc::new(MemoryStorage::new()));
    }
    let dir = config.storage_dir()?;
    let storage = FileStorage::open(&dir)
        .with_context(|| format!("Failed to open storage at {}", dir.display()))?;
    Ok(Arc::new(storage))
}

/// Execute the parsed command line.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let storage = open_storage(&cli, &config)?;
    let api = ApiClient::new(&config.api_base()?, Arc::clone(&storage), config.request_timeout())
        .context("Failed to build HTTP client")?;

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password("Password: ")?,
            };
            login(AppState::load(storage, api), email, password).await
        }
        Commands::Signup {
            name,
            email,
            password,
        } => {
            let (password, confirm_password) = match password {
                Some(p) => (p.clone(), p),
                None => (
                    prompt_password("Password: ")?,
                    prompt_password("Confirm password: ")?,
                ),
            };
            let details = SignupDetails {
                name,
                email,
                password,
                confirm_password,
            };
            signup(AppState::load(storage, api), &details).await
        }
        Commands::Logout => {
            let mut state = AppState::load(storage, api);
            state.logout().context("Failed to clear credentials")?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Chat { session } => chat::run(storage, config.ws_base()?, session).await,
        Commands::Docs { action } => {
            let mut state = AppState::load(storage, api);
            match action {
                DocsAction::List => list_documents(&mut state).await,
                DocsAction::Upload { path } => upload_document(&mut state, &path).await,
                DocsAction::Delete { filename } => delete_document(&mut state, &filename).await,
            }
        }
        Commands::Metrics { session } => {
            let mut state = AppState::load(storage, api);
            match session {
                Some(id) => {
                    let id = SessionId::parse(&id)?;
                    state
                        .fetch_session_metrics(&id)
                        .await
                        .context("Failed to fetch session metrics")?;
                    if let Some(metrics) = &state.metrics.session {
                        print_session_metrics(metrics);
                    }
                }
                None => {
                    state.fetch_metrics().await.context("Failed to fetch metrics")?;
                    if let Some(metrics) = &state.metrics.metrics {
                        print_model_metrics(metrics);
                    }
                }
            }
            Ok(())
        }
        Commands::History { session } => {
            let id = SessionId::parse(&session)?;
            let history = read_history(storage.as_ref(), &id);
            if history.is_empty() {
                println!("No messages stored for {id}.");
            }
            history.iter().for_each(print_message);
            Ok(())
        }
        Commands::Status => {
            let state = AppState::load(storage, api);
            println!("API:     {}", config.api_base()?);
            println!("Socket:  {}", config.ws_base()?);
            if cli.ephemeral {
                println!("Storage: (in memory)");
            } else {
                println!("Storage: {}", config.storage_dir()?.display());
            }
            if state.auth.is_authenticated() {
                let who = state.auth.email.as_deref().unwrap_or("unknown user");
                println!("Logged in as {who}");
                if let Some(user_id) = &state.auth.user_id {
                    println!("User ID: {user_id}");
                }
            } else {
                println!("Not logged in.");
            }
            Ok(())
        }
    }
}

async fn login(mut state: AppState, email: String, password: String) -> Result<()> {
    let credentials = Credentials { email, password };
    state.login(&credentials).await.context("Login failed")?;
    println!("Logged in as {}", credentials.email);
    Ok(())
}

async fn signup(mut state: AppState, details: &SignupDetails) -> Result<()> {
    state.signup(details).await.context("Signup failed")?;
    println!("Account created for {}.", details.email);
    println!("Log in with: vahan login --email {}", details.email);
    Ok(())
}

async fn list_documents(state: &mut AppState) -> Result<()> {
    state
        .list_documents()
        .await
        .context("Failed to list documents")?;

    let documents = &state.documents.documents;
    if documents.is_empty() {
        println!("No documents uploaded.");
        return Ok(());
    }

    println!(
        "{:<36} {:<10} {:<14} {:<20}",
        "FILENAME", "SIZE", "UPLOADED", "BY"
    );
    println!("{}", "-".repeat(82));
    for doc in documents {
        let name: String = doc.filename.chars().take(34).collect();
        println!(
            "{:<36} {:<10} {:<14} {:<20}",
            name,
            doc.size_label(),
            doc.upload_date_label(),
            doc.uploaded_by.as_deref().unwrap_or("-"),
        );
    }
    println!("\n{} document(s)", documents.len());
    Ok(())
}

async fn upload_document(state: &mut AppState, path: &Path) -> Result<()> {
    state
        .create_document(path)
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;

    match &state.documents.last_upload {
        Some(receipt) => {
            println!(
                "{}",
                receipt
                    .message
                    .as_deref()
                    .unwrap_or("Document uploaded successfully")
            );
            if let Some(url) = &receipt.public_url {
                println!("URL: {url}");
            }
        }
        None => println!("Document uploaded successfully"),
    }
    Ok(())
}

async fn delete_document(state: &mut AppState, filename: &str) -> Result<()> {
    if filename.trim().is_empty() {
        bail!("Filename must not be empty");
    }
    state
        .delete_document(filename)
        .await
        .with_context(|| format!("Failed to delete {filename}"))?;
    println!("Deleted {filename}");
    Ok(())
}

fn fmt_metric(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}{unit}"))
}

fn print_model_metrics(metrics: &ModelMetrics) {
    println!("Model metrics");
    println!("{}", "-".repeat(40));
    println!("{:<24} {}", "Total requests", fmt_metric(metrics.total_requests, ""));
    println!(
        "{:<24} {}",
        "Successful requests",
        fmt_metric(metrics.successful_requests, "")
    );
    println!("{:<24} {}", "Success rate", fmt_metric(metrics.success_rate.map(|r| r * 100.0), "%"));
    println!("{:<24} {}", "Average latency", fmt_metric(metrics.avg_latency, "s"));
    println!("{:<24} {}", "P50 latency", fmt_metric(metrics.p50_latency, "s"));
    println!("{:<24} {}", "P95 latency", fmt_metric(metrics.p95_latency, "s"));
    println!("{:<24} {}", "P99 latency", fmt_metric(metrics.p99_latency, "s"));
    println!(
        "{:<24} {}",
        "Context relevance",
        fmt_metric(metrics.avg_context_relevance, "")
    );

    if !metrics.latency_over_time.is_empty() {
        println!("\nRecent latency");
        let skip = metrics.latency_over_time.len().saturating_sub(10);
        for point in &metrics.latency_over_time[skip..] {
            let when = chrono::DateTime::from_timestamp_millis(point.timestamp).map_or_else(
                || point.timestamp.to_string(),
                |t| t.format("%Y-%m-%d %H:%M").to_string(),
            );
            println!("  {when:<18} {:.2}s", point.value);
        }
    }
}

fn print_session_metrics(metrics: &SessionMetrics) {
    println!("Session {}", metrics.session_id);
    println!("{}", "-".repeat(40));
    match &metrics.summary {
        Some(summary) => {
            println!("{:<24} {}", "Interactions", summary.total_interactions);
            println!("{:<24} {:.2}s", "Average latency", summary.avg_latency);
            println!("{:<24} {:.2}", "Relevance score", summary.avg_relevance_score);
        }
        None => println!("No interactions recorded."),
    }
}
