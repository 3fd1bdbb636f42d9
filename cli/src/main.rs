mod bulk;
mod client;
mod password;
mod preview;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crate::client::Client;

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Larder CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Admin login used by the generation commands.
#[derive(Args)]
struct AdminArgs {
    /// Server URL (default: http://localhost:3000)
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,
    #[arg(long, env = "LARDER_ADMIN_USERNAME")]
    username: String,
    #[arg(long, env = "LARDER_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

impl AdminArgs {
    async fn client(&self) -> Result<Client> {
        let mut client = Client::new(&self.server);
        client.login(&self.username, &self.password).await?;
        Ok(client)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ping the server (unauthenticated)
    Ping {
        /// Server URL (default: http://localhost:3000)
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,
    },
    /// Print an argon2 hash for ADMIN_PASSWORD_HASH
    HashPassword {
        password: String,
    },
    /// Ask the model for a handful of directions to try
    Directions {
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Generate and publish recipes for a list of directions
    Bulk {
        #[command(flatten)]
        admin: AdminArgs,
        /// A direction to generate for (repeatable)
        #[arg(long = "direction")]
        directions: Vec<String>,
        /// File with one direction per line
        #[arg(long)]
        file: Option<PathBuf>,
        /// Use the model's suggested directions when none are given
        #[arg(long)]
        suggest: bool,
        /// Seconds between status polls
        #[arg(long, default_value_t = 2)]
        poll_secs: u64,
    },
    /// Walk the live-preview wizard one step at a time
    Preview {
        /// Server URL (default: http://localhost:3000)
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,
        /// Where the wizard is kept between invocations
        #[arg(long, default_value = "larder-preview.json")]
        state: PathBuf,
        #[command(subcommand)]
        command: preview::PreviewCommand,
    },
}

#[derive(Deserialize)]
struct PingResponse {
    message: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ping { server } => {
            ping(&server).await?;
        }
        Commands::HashPassword { password } => {
            println!("{}", password::hash_password(&password)?);
        }
        Commands::Directions { admin } => {
            let client = admin.client().await?;
            for direction in bulk::suggest(&client).await? {
                println!("{}", direction);
            }
        }
        Commands::Bulk {
            admin,
            directions,
            file,
            suggest,
            poll_secs,
        } => {
            let client = admin.client().await?;
            let mut directions = bulk::collect_directions(&directions, file.as_deref())?;
            if directions.is_empty() && suggest {
                directions = bulk::suggest(&client).await?;
                tracing::info!(count = directions.len(), "using suggested directions");
            }
            bulk::run(&client, directions, Duration::from_secs(poll_secs)).await?;
        }
        Commands::Preview {
            server,
            state,
            command,
        } => {
            preview::run(&server, &state, command).await?;
        }
    }

    Ok(())
}

async fn ping(server: &str) -> Result<()> {
    let response: PingResponse = Client::new(server).get("/api/ping").await?;

    println!("{}", response.message);

    Ok(())
}
