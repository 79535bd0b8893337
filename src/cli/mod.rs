use std::net::SocketAddr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::application::AuthService;
use crate::http::{ApiServer, AppState};
use crate::storage::Repository;

/// Buono - prepaid voucher service
#[derive(Parser)]
#[command(name = "buono")]
#[command(about = "A prepaid voucher service backed by an append-only transaction ledger")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "buono.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Run the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },

    /// Create a superuser account
    CreateSuperuser {
        username: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long)]
        password: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                let db_url = init_url(&self.database);
                Repository::init(&db_url).await?;
                println!("Initialized database at {}", self.database);
                Ok(())
            }
            Commands::Serve { bind } => {
                tracing_subscriber::fmt::init();
                let db_url = init_url(&self.database);
                let repo = Repository::init(&db_url).await?;
                let server = ApiServer::new(AppState::new(repo), bind);
                server.serve().await
            }
            Commands::CreateSuperuser {
                username,
                email,
                password,
            } => {
                let db_url = init_url(&self.database);
                let repo = Repository::init(&db_url).await?;
                let auth = AuthService::new(repo);
                let user = auth.create_superuser(&username, &email, &password).await?;
                println!("Created superuser {}", user.username);
                Ok(())
            }
        }
    }
}

fn init_url(database_path: &str) -> String {
    format!("sqlite:{database_path}?mode=rwc")
}
