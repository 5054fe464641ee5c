//! # Harbor Client - Interactive Terminal Session
//!
//! Connects to a harbor server, completes the naming handshake and then
//! forwards each typed line as a command, printing the reply. Files fetched
//! with `get` are saved into the download directory.

use clap::Parser;
use harbor_client::{Connection, HarborClient, Response};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "harbor-client")]
#[command(about = "Interactive client for the harbor file repository server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:37200")]
    server: String,

    /// Directory downloaded files are written to
    #[arg(short, long, default_value = "downloads")]
    download_dir: String,

    /// Longest silence tolerated while a reply is arriving, in milliseconds
    #[arg(short = 't', long, default_value = "500")]
    idle_timeout_ms: u64,
}

const USAGE: &str = "\
Send a line to the server and it will be acknowledged.
  list          show the files in the repository
  get <file>    download a file into the download directory
  status        show every client seen by the server
  exit          close the session";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let idle_timeout = Duration::from_millis(args.idle_timeout_ms);

    let mut client =
        match HarborClient::connect(&args.server, &args.download_dir, idle_timeout).await? {
            Connection::Ready(client) => client,
            Connection::Busy(line) => {
                println!("{line}");
                return Ok(());
            }
        };

    println!("Connected as {}\n", client.name());
    println!("{USAGE}");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else {
            info!("👋 End of input, leaving");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match client.request(&line).await {
            Ok(Response::Lines(lines)) => {
                for reply in lines {
                    println!("{reply}");
                }
            }
            Ok(Response::Saved { path, size }) => {
                println!("Saved {size} bytes to {}", path.display());
            }
            Ok(Response::Closed) => {
                println!("Server closed the connection");
                break;
            }
            Err(e) => {
                error!("❌ {e}");
                break;
            }
        }

        if line.trim().eq_ignore_ascii_case("exit") {
            break;
        }
    }

    Ok(())
}
