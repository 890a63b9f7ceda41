//! Quizroom - live quiz rooms over TCP
//!
//! `serve` runs the room server; `create` and `join` are a terminal client.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quizroom_net::{Server, DEFAULT_PORT};

mod config;
mod play;
mod profile;

use config::{AppConfig, ServerOverrides};
use profile::ProfileStore;

#[derive(Debug, Parser)]
#[command(name = "quizroom", author, version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "QUIZROOM_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, used when RUST_LOG is not set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the room server
    Serve(ServerOverrides),

    /// Host a new room
    Create {
        /// Server address
        #[arg(short, long, default_value_t = default_server())]
        server: String,

        /// Question to put to the room
        #[arg(short, long)]
        question: Option<String>,

        /// An answer option; repeat for each one
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,

        /// Display name (saved to the profile)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Join a room by code or share URL; rejoins the last room if omitted
    Join {
        /// Room code or quizroom:// share URL
        room: Option<String>,

        /// Server address, when joining by code
        #[arg(short, long, default_value_t = default_server())]
        server: String,

        /// Display name (saved to the profile)
        #[arg(short, long)]
        name: Option<String>,
    },
}

fn default_server() -> String {
    format!("127.0.0.1:{}", DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_tracing(&config.log_level);

    match cli.command {
        Command::Serve(overrides) => {
            overrides.apply(&mut config.server);
            serve(config).await
        }
        Command::Create {
            server,
            question,
            options,
            name,
        } => {
            let quiz = play::build_quiz(question, options)?;
            let (store, mut profile) = load_profile(name)?;
            play::create(&server, quiz, &mut profile, &store).await
        }
        Command::Join { room, server, name } => {
            let (store, mut profile) = load_profile(name)?;
            play::join(&server, room.as_deref(), &mut profile, &store).await
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn serve(config: AppConfig) -> Result<()> {
    tracing::info!("Starting Quizroom server");

    let server = Server::start(config.server).await?;
    println!("Listening on {}", server.addr());

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    Ok(())
}

fn load_profile(name: Option<String>) -> Result<(ProfileStore, profile::PlayerProfile)> {
    let store = ProfileStore::default_location()?;
    let mut profile = store.load_or_create()?;
    tracing::debug!(path = %store.path().display(), identity = %profile.durable_identity_id, "Loaded profile");

    if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
        profile.display_name = name.trim().to_string();
        store.save(&profile)?;
    }
    Ok((store, profile))
}
