use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use url::Url;

#[derive(Parser)]
#[command(name = "registry-cli")]
#[command(about = "Management CLI for the service registry", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8500")]
    url: Url,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check registry status
    Status,
    /// List every registered instance
    Services,
    /// List passing instances of a service
    Health {
        name: String,
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Register a service instance
    Register {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        port: u16,
        #[arg(long, default_value = "/health")]
        health: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Deregister a service instance
    Deregister { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = &cli.url;

    let res = match cli.command {
        Commands::Status => client.get(endpoint(base, &["v1", "status"])?).send().await?,
        Commands::Services => {
            client
                .get(endpoint(base, &["v1", "agent", "services"])?)
                .send()
                .await?
        }
        Commands::Health { name, tag } => {
            let mut req = client.get(endpoint(base, &["v1", "health", "service", &name])?);
            if let Some(tag) = tag {
                req = req.query(&[("tag", tag)]);
            }
            req.send().await?
        }
        Commands::Register {
            id,
            name,
            address,
            port,
            health,
            tags,
        } => {
            let body = json!({
                "id": id,
                "name": name,
                "address": address,
                "port": port,
                "health_check_path": health,
                "tags": tags,
            });
            client
                .put(endpoint(base, &["v1", "agent", "service", "register"])?)
                .json(&body)
                .send()
                .await?
        }
        Commands::Deregister { id } => {
            client
                .put(endpoint(base, &["v1", "agent", "service", "deregister", &id])?)
                .send()
                .await?
        }
    };

    print_response(res).await
}

/// `base` with each segment appended percent-encoded, so ids may contain `/`.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| format!("registry url {base} cannot take a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: registry returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
