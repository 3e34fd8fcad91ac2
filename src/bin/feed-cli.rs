use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tonic::transport::Endpoint;

use image_feed_gateway::proto::image_feed_service_client::ImageFeedServiceClient;
use image_feed_gateway::proto::Empty;

#[derive(Parser)]
#[command(name = "feed-cli")]
#[command(about = "Fetch one snapshot from an image feed gateway", long_about = None)]
struct Cli {
    /// Gateway address.
    #[arg(short, long, default_value = "http://localhost:8061")]
    target: String,

    /// Write the image here instead of only reporting its size.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Call deadline in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let channel = Endpoint::from_shared(cli.target.clone())?
        .timeout(Duration::from_secs(cli.timeout_secs))
        .connect()
        .await?;
    let mut client = ImageFeedServiceClient::new(channel);

    let image = match client.get(Empty {}).await {
        Ok(response) => response.into_inner(),
        Err(status) => {
            eprintln!("An error has occurred:");
            eprintln!("  Error Code: {:?}", status.code());
            eprintln!("  Details: {}", status.message());
            return Ok(ExitCode::FAILURE);
        }
    };

    match cli.output {
        Some(path) => {
            tokio::fs::write(&path, &image.data).await?;
            println!("Wrote {} bytes to {}", image.data.len(), path.display());
        }
        None => println!("Received {} bytes", image.data.len()),
    }

    Ok(ExitCode::SUCCESS)
}
