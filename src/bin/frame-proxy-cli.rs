use clap::{Parser, Subcommand};
use serde_json::json;

#[derive(Parser)]
#[command(name = "frame-proxy-cli")]
#[command(about = "Management CLI for the frame proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an origin frame and print its proxy URL
    Wrap {
        /// Origin frame URL
        frame_url: String,
        /// Analytics project key for this frame
        #[arg(long)]
        api_key: Option<String>,
        /// Analytics region (`us` or `eu`)
        #[arg(long, default_value = "eu")]
        region: String,
    },
    /// Check that the proxy is up
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Wrap {
            frame_url,
            api_key,
            region,
        } => {
            client
                .post(format!("{}/api/frames", base))
                .json(&json!({ "url": frame_url, "apiKey": api_key, "region": region }))
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        eprintln!("Response: {}", text);
        std::process::exit(1);
    }
    println!("{}", text);
    Ok(())
}
