use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Admin CLI for the bridge server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8001")]
    url: String,

    /// Value sent in X-API-Key; omit when the server has no api_key.
    #[arg(short, long, env = "BRIDGE_API_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List received payments, newest first
    ReceivedPayments {
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
    /// Show one received payment
    ReceivedPayment { id: i32 },
    /// List sent transactions, newest first
    SentTransactions {
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
    /// Reprocess a received payment operation
    Reprocess {
        operation_id: String,
        /// Reprocess even if the payment already succeeded
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert("X-API-Key", HeaderValue::from_str(&cli.key)?);
    }
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::ReceivedPayments { page, limit } => {
            client
                .get(format!("{}/admin/received-payments", base))
                .query(&[("page", page), ("limit", limit)])
                .headers(headers)
                .send()
                .await?
        }
        Commands::ReceivedPayment { id } => {
            client
                .get(format!("{}/admin/received-payments/{}", base, id))
                .headers(headers)
                .send()
                .await?
        }
        Commands::SentTransactions { page, limit } => {
            client
                .get(format!("{}/admin/sent-transactions", base))
                .query(&[("page", page), ("limit", limit)])
                .headers(headers)
                .send()
                .await?
        }
        Commands::Reprocess {
            operation_id,
            force,
        } => {
            client
                .post(format!("{}/reprocess", base))
                .form(&[
                    ("operation_id", operation_id),
                    ("force", force.to_string()),
                ])
                .headers(headers)
                .send()
                .await?
        }
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: bridge server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
