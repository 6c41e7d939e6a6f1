use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use firecast::api::middleware::auth::API_KEY_HEADER;
use reqwest::{Client, Method, Response};
use serde_json::{Value, json};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Smoke-test client for a running Firecast server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the Firecast server
    #[arg(long, env = "FIRECAST_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Shared secret sent as x-api-key
    #[arg(long, env = "FIRECAST_SECRET", default_value = "supersecret", hide_env_values = true)]
    secret: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// GET /healthz
    Health,
    /// GET /test (station file listing)
    Files,
    /// GET /playlists
    Playlists,
    /// POST /addvideo
    Add {
        #[arg(long)]
        url: String,
        #[arg(long)]
        playlist: Option<String>,
    },
    /// health, files and playlists in sequence (default)
    Smoke,
    /// Call an AzuraCast API endpoint directly, bypassing Firecast
    Probe {
        /// Endpoint below the API root, e.g. /status
        #[arg(default_value = "/status")]
        endpoint: String,

        /// AzuraCast API root, e.g. https://radio.example.com/api
        #[arg(long, env = "AZURACAST_API_URL")]
        api_url: String,

        #[arg(long, env = "AZURACAST_API_KEY", hide_env_values = true)]
        api_key: String,
    },
}

struct FirecastClient {
    http: Client,
    base_url: String,
    secret: String,
}

impl FirecastClient {
    async fn call(&self, method: Method, endpoint: &str, body: Option<Value>) -> Result<Response> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), endpoint);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(API_KEY_HEADER, &self.secret);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, url))?;
        println!("{} {} -> {}", method, url, response.status());
        Ok(response)
    }
}

async fn print_body(response: Response) -> Result<()> {
    let text = response.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    println!("{}", "-".repeat(50));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "firecast_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let client = FirecastClient {
        http: Client::new(),
        base_url: cli.base_url,
        secret: cli.secret,
    };

    match cli.command.unwrap_or(Command::Smoke) {
        Command::Health => print_body(client.call(Method::GET, "/healthz", None).await?).await?,
        Command::Files => print_body(client.call(Method::GET, "/test", None).await?).await?,
        Command::Playlists => {
            print_body(client.call(Method::GET, "/playlists", None).await?).await?
        }
        Command::Add { url, playlist } => {
            info!("🎬 Submitting {}", url);
            let body = json!({ "video_url": url, "playlist": playlist });
            print_body(client.call(Method::POST, "/addvideo", Some(body)).await?).await?
        }
        Command::Smoke => {
            for endpoint in ["/healthz", "/test", "/playlists"] {
                match client.call(Method::GET, endpoint, None).await {
                    Ok(response) => print_body(response).await?,
                    Err(e) => error!("❌ {:#}", e),
                }
            }
        }
        Command::Probe {
            endpoint,
            api_url,
            api_key,
        } => {
            let url = format!(
                "{}/{}",
                api_url.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            );
            let response = Client::new()
                .get(&url)
                .header("X-API-Key", api_key)
                .send()
                .await
                .with_context(|| format!("GET {} failed", url))?;
            println!("Status code: {}", response.status());
            println!("Response: {}", response.text().await?);
        }
    }

    Ok(())
}
