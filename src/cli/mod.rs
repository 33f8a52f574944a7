use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "form-service")]
#[command(about = "Form service - CRUD HTTP API for form definitions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Address to bind, overrides FORM_SERVICE_HOST")]
        host: Option<String>,

        #[arg(long, short, help = "Port to listen on, overrides FORM_SERVICE_PORT")]
        port: Option<u16>,

        #[arg(long, help = "Skip the startup schema migration")]
        no_migrate: bool,
    },

    #[command(about = "Create the form table if it does not exist, then exit")]
    Migrate,

    #[command(about = "Print the effective configuration as JSON")]
    Config,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve {
            host: None,
            port: None,
            no_migrate: false,
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();

    match cli.command.unwrap_or_default() {
        Commands::Serve { host, port, no_migrate } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let migrate = config.database.auto_migrate && !no_migrate;
            crate::app::serve(config, migrate).await
        }
        Commands::Migrate => {
            let database = DatabaseManager::connect(&config.database).await?;
            database.migrate().await?;
            database.close().await;
            info!("Migrations complete");
            Ok(())
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted()?)?);
            Ok(())
        }
    }
}
