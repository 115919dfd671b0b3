//! navd-cli - Command-line client for the navd routing daemon.

use clap::{Parser, Subcommand};
use colored::Colorize;
use navd_client::{Client, ConnectionConfig};
use navd_protocol::message::Waypoint;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "navd-cli")]
#[command(about = "Command-line client for the navd routing daemon")]
#[command(version)]
struct Cli {
    /// Daemon address
    #[arg(short, long, default_value = "127.0.0.1:8040")]
    server: SocketAddr,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a route through the given waypoints
    Route {
        /// Data directory on the daemon host (as produced by the preprocessor)
        #[arg(short, long)]
        data_dir: String,

        /// Waypoints as lat,lon[,heading-penalty[,heading]]
        #[arg(required = true, num_args = 2..)]
        waypoints: Vec<String>,
    },

    /// Print the daemon version
    Version,

    /// Unpack a packed map module on the daemon host
    Unpack {
        /// Path to the packed map module on the daemon host
        file: String,

        /// Delete the packed file after unpacking
        #[arg(long)]
        delete: bool,
    },
}

/// Parses `lat,lon[,heading-penalty[,heading]]` into a waypoint.
fn parse_waypoint(arg: &str) -> Result<Waypoint, String> {
    let parts: Vec<&str> = arg.split(',').collect();
    if parts.len() < 2 || parts.len() > 4 {
        return Err(format!(
            "expected lat,lon[,heading-penalty[,heading]], got {arg:?}"
        ));
    }

    let mut values = Vec::with_capacity(parts.len());
    for part in &parts {
        let value = part
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate {part:?}: {e}"))?;
        values.push(value);
    }

    let mut waypoint = Waypoint::new(values[0], values[1]);
    if let Some(&penalty) = values.get(2) {
        waypoint = waypoint.with_heading_penalty(penalty);
    }
    if let Some(&heading) = values.get(3) {
        waypoint = waypoint.with_heading(heading);
    }
    Ok(waypoint)
}

fn format_duration(seconds: f64) -> String {
    let total = seconds.round() as u64;
    format!("{}h {}m {}s", total / 3600, (total / 60) % 60, total % 60)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let client = Client::new(ConnectionConfig::new(cli.server));

    match cli.command {
        Commands::Route {
            data_dir,
            waypoints,
        } => {
            let waypoints = waypoints
                .iter()
                .map(|w| parse_waypoint(w))
                .collect::<Result<Vec<_>, _>>()?;

            let result = client.route(&data_dir, waypoints).await?;

            println!(
                "{} {}",
                "Travel time:".bold(),
                format_duration(result.seconds).green()
            );
            println!("{} {}", "Nodes:".bold(), result.nodes.len());
            for edge in &result.edges {
                let name = result
                    .edge_names
                    .get(edge.name_id as usize)
                    .map(String::as_str)
                    .unwrap_or("?");
                let kind = result
                    .edge_types
                    .get(edge.type_id as usize)
                    .map(String::as_str)
                    .unwrap_or("?");
                println!(
                    "  {} ({}) {}",
                    name.cyan(),
                    kind,
                    format_duration(edge.seconds)
                );
            }
        }

        Commands::Version => {
            let version = client.version().await?;
            println!("{version}");
        }

        Commands::Unpack { file, delete } => {
            client.unpack(&file, delete).await?;
            println!("{} {}", "Unpacked".green(), file.cyan());
        }
    }

    Ok(())
}
