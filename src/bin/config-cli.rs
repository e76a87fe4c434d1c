use std::path::PathBuf;
use std::time::Duration;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use config_sync::cache::ConfigCache;
use config_sync::client::{FetchClient, Fetched, Notification, ServerAddress};
use config_sync::config::AppConfig;

#[derive(Parser)]
#[command(name = "config-cli")]
#[command(about = "Inspect a configuration service the way the sync engine sees it", long_about = None)]
struct Cli {
    /// Configuration server address (host:port or URL).
    #[arg(short, long, default_value = "localhost:8080")]
    server: String,

    #[arg(short, long, default_value = "")]
    app_id: String,

    #[arg(short, long, default_value = "default")]
    cluster: String,

    /// Request timeout in seconds.
    #[arg(short, long, default_value_t = 5)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configuration servers from discovery
    Services,
    /// Fetch the configuration of a namespace
    Fetch {
        #[arg(short, long, default_value = "application")]
        namespace: String,
        /// Only return data if the release differs from this key
        #[arg(short, long)]
        release_key: Option<String>,
    },
    /// Run a single long-poll for a namespace
    Poll {
        #[arg(short, long, default_value = "application")]
        namespace: String,
        #[arg(long, default_value_t = Notification::INITIAL_ID)]
        notification_id: i64,
    },
    /// Print a local backup file
    Backup {
        #[arg(short, long, default_value = "config-backup.json")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout);
    let app = AppConfig {
        app_id: cli.app_id.clone(),
        cluster: cli.cluster.clone(),
        ip: cli.server.clone(),
        ..AppConfig::default()
    };

    let output = match cli.command {
        Commands::Backup { path } => {
            let cache = ConfigCache::load_from_file(&path)?;
            let namespaces: Vec<Value> = cache
                .namespaces()
                .iter()
                .filter_map(|ns| cache.get(ns))
                .map(|snapshot| serde_json::to_value(&*snapshot))
                .collect::<Result<_, _>>()?;
            json!(namespaces)
        }
        Commands::Services => {
            let (client, server) = connect(&cli.server)?;
            match client.fetch_discovery(&app, &server, timeout).await? {
                Fetched::Data(servers) => json!(servers.iter().map(ToString::to_string).collect::<Vec<_>>()),
                Fetched::NotModified => json!({ "status": "not_modified" }),
            }
        }
        Commands::Fetch { namespace, release_key } => {
            let (client, server) = connect(&cli.server)?;
            match client.fetch_config(&app, &namespace, release_key.as_deref(), &server, timeout).await? {
                Fetched::Data(snapshot) => serde_json::to_value(&snapshot)?,
                Fetched::NotModified => json!({ "status": "not_modified", "releaseKey": release_key }),
            }
        }
        Commands::Poll { namespace, notification_id } => {
            let (client, server) = connect(&cli.server)?;
            let notifications = [Notification::new(namespace, notification_id)];
            match client.long_poll(&app, &notifications, &server, timeout).await? {
                Fetched::Data(changed) => serde_json::to_value(&changed)?,
                Fetched::NotModified => json!({ "status": "not_modified" }),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn connect(server: &str) -> Result<(FetchClient, ServerAddress), Box<dyn std::error::Error>> {
    let server = ServerAddress::parse(server)?;
    let client = FetchClient::new(Duration::from_secs(1), None)?;
    Ok((client, server))
}
