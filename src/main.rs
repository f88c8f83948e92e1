use std::net::SocketAddr;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use plantpal::api::{self, AppState, SecurityConfig};
use plantpal::client::PlantPalClient;
use plantpal::config::Config;
use plantpal::db::Database;
use plantpal::models::CreateMoodInput;
use plantpal::reminders;

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "plantpal")]
#[command(about = "Mood tracking, journaling and a virtual plant that grows with you")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the PlantPal server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Dispatch due reminders once against the local database
    Remind {
        /// Report what is due without marking anything notified
        #[arg(long)]
        dry_run: bool,
    },
    /// Record or list moods on a running server
    Mood {
        #[command(subcommand)]
        command: MoodCommands,
    },
    /// Show a user's profile stats from a running server
    Profile {
        user: Uuid,
    },
    /// Read or write a shared plant document on a running server
    PlantDoc {
        #[command(subcommand)]
        command: PlantDocCommands,
    },
}

#[derive(Subcommand)]
enum MoodCommands {
    /// Record a 0-10 mood rating
    Add {
        user: Uuid,
        rating: i32,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// List recent moods, newest first
    List {
        user: Uuid,
        #[arg(short, long)]
        limit: Option<u32>,
    },
}

#[derive(Subcommand)]
enum PlantDocCommands {
    Get {
        user: String,
    },
    /// Merge a JSON object into the document
    Set {
        user: String,
        json: String,
        /// Replace the whole document instead of merging
        #[arg(long)]
        replace: bool,
    },
}

/// Initialize tracing to stderr (one-shot commands) or stdout (server)
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "plantpal=debug,tower_http=debug".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_database(config: &Config) -> anyhow::Result<Database> {
    let db = Database::open(config.db_path.clone())?;
    db.migrate()?;
    Ok(db)
}

async fn serve(config: Config, host: &str, port: u16) -> anyhow::Result<()> {
    let db = open_database(&config)?;
    let state = AppState::new(db.clone(), config.app_id.clone());
    let shutdown_tx = state.shutdown.clone();
    let app = api::create_router_with_security(state, SecurityConfig::from_env());

    let reminder_loop = config
        .reminder_interval
        .map(|every| reminders::spawn_reminder_loop(db, every, shutdown_tx.subscribe()));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("PlantPal server listening on http://{}", addr);

    let signal_tx = shutdown_tx.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
        tracing::info!("Shutting down");
        let _ = signal_tx.send(());
    })
    .await?;

    if let Some(handle) = reminder_loop {
        let _ = shutdown_tx.send(());
        handle.await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let is_server = matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(!is_server);

    match cli.command {
        Some(Commands::Serve { port, host }) => {
            serve(Config::from_env()?, &host, port).await?;
        }
        None => {
            serve(Config::from_env()?, "127.0.0.1", DEFAULT_PORT).await?;
        }
        Some(Commands::Remind { dry_run }) => {
            let db = open_database(&Config::from_env()?)?;
            let report = reminders::dispatch_due(&db, Utc::now(), dry_run)?;
            print_json(&report)?;
        }
        Some(Commands::Mood { command }) => {
            let client = PlantPalClient::from_env();
            match command {
                MoodCommands::Add { user, rating, note } => {
                    let entry = client
                        .add_mood(user, &CreateMoodInput { mood: rating, note })
                        .await?;
                    print_json(&entry)?;
                }
                MoodCommands::List { user, limit } => {
                    print_json(&client.list_moods(user, limit).await?)?;
                }
            }
        }
        Some(Commands::Profile { user }) => {
            let client = PlantPalClient::from_env();
            print_json(&client.get_profile(user).await?)?;
        }
        Some(Commands::PlantDoc { command }) => {
            let client = PlantPalClient::from_env();
            match command {
                PlantDocCommands::Get { user } => {
                    print_json(&client.get_plant_doc(&user).await?)?;
                }
                PlantDocCommands::Set {
                    user,
                    json,
                    replace,
                } => {
                    let data: serde_json::Value =
                        serde_json::from_str(&json).context("Document must be valid JSON")?;
                    print_json(&client.set_plant_doc(&user, &data, !replace).await?)?;
                }
            }
        }
    }

    Ok(())
}
