use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "orchestrator-cli")]
#[command(about = "Client for the service orchestrator", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:6502")]
    url: String,

    #[arg(long, default_value = "/api/v1")]
    api_prefix: String,

    #[arg(short, long, env = "ORCHESTRATOR_API_TOKEN", default_value = "your-secure-token")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness check
    Status,
    /// Detailed status of every service
    Health,
    /// Send a demo request through the authenticated API
    Demo { value: String },
    /// Stream broadcast events from the WebSocket endpoint
    Watch {
        /// Send this text once connected and print the echo
        #[arg(long)]
        say: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{base}/")).send().await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{base}/health")).send().await?;
            print_response(res).await?;
        }
        Commands::Demo { value } => {
            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
            );
            let res = client
                .post(format!("{base}{}/demo/demo", cli.api_prefix))
                .headers(headers)
                .json(&json!({ "demo": value }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Watch { say } => watch(base, say).await?,
    }

    Ok(())
}

async fn watch(base: &str, say: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let ws_url = match base.split_once("://") {
        Some(("https", rest)) => format!("wss://{rest}/ws"),
        Some((_, rest)) => format!("ws://{rest}/ws"),
        None => format!("ws://{base}/ws"),
    };

    let (mut socket, _) = connect_async(ws_url.as_str()).await?;
    eprintln!("Connected to {ws_url}");

    if let Some(text) = say {
        socket.send(Message::Text(text.into())).await?;
    }

    while let Some(frame) = socket.next().await {
        match frame? {
            Message::Text(text) => match serde_json::from_str::<Value>(text.as_str()) {
                Ok(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                Err(_) => println!("{}", text.as_str()),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: orchestrator returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
