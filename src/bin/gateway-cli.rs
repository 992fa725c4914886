use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use social_gateway::config::{apply_env_overrides, load_config, GatewayConfig};
use social_gateway::posting::{DataUri, PostingClient};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the social dashboard gateway", long_about = None)]
struct Cli {
    /// Gateway base URL.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway health
    Status,
    /// List operations and their upstreams
    Operations,
    /// Fetch analytics for a user
    Analytics { username: String },
    /// Send a marketing blast
    Blast {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
    },
    /// Trigger the recent-message automation
    RecentMessages,
    /// Generate post text, or an image with --image
    Generate {
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        tone: Option<String>,
        #[arg(long)]
        image: bool,
    },
    /// Upload an image file with a caption straight to the posting service
    Post {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        caption: String,
        /// Gateway TOML configuration; its `[posting]` and `[timeouts]` sections are used.
        /// Without it, defaults plus GATEWAY_* variables apply.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{base}/health")).send().await?,
        Commands::Operations => client.get(format!("{base}/api/operations")).send().await?,
        Commands::Analytics { username } => {
            let username = urlencoding::encode(&username);
            client
                .get(format!("{base}/api/analytics/{username}"))
                .send()
                .await?
        }
        Commands::Blast { subject, body } => {
            client
                .post(format!("{base}/api/automation/blast"))
                .json(&json!({ "subject": subject, "body": body }))
                .send()
                .await?
        }
        Commands::RecentMessages => {
            client
                .post(format!("{base}/api/automation/recent-messages"))
                .send()
                .await?
        }
        Commands::Generate {
            prompt,
            platform,
            tone,
            image,
        } => {
            let path = if image { "image" } else { "content" };
            client
                .post(format!("{base}/api/generate/{path}"))
                .json(&json!({ "prompt": prompt, "platform": platform, "tone": tone }))
                .send()
                .await?
        }
        Commands::Post {
            image,
            caption,
            config,
        } => {
            let config = match &config {
                Some(path) => load_config(path)?,
                None => {
                    let mut config = GatewayConfig::default();
                    apply_env_overrides(&mut config, std::env::vars());
                    config
                }
            };

            let bytes = tokio::fs::read(&image).await?;
            let mime = mime_guess::from_path(&image).first_or_octet_stream();
            let data_uri = DataUri::encode(mime.essence_str(), &bytes);

            let posting = PostingClient::from_config(&config)?;
            let result = posting.post_image(&data_uri, &caption).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let pretty = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or(text);

    if status.is_success() {
        println!("{pretty}");
    } else {
        eprintln!("Error: gateway returned status {status}");
        eprintln!("{pretty}");
    }
    Ok(())
}
