use clap::{Parser, Subcommand};
use secrecy::SecretString;
use serde_json::Value;

use bookings_proxy::security::SignatureGate;

#[derive(Parser)]
#[command(name = "bookings-cli")]
#[command(about = "Signing and lookup helper for the bookings proxy", long_about = None)]
struct Cli {
    /// Shared HMAC secret
    #[arg(short, long, env = "HMAC_SECRET", hide_env_values = true)]
    secret: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the signature for a user id
    Sign { userid: String },
    /// Sign a user id and query a running proxy
    Lookup {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
        userid: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let gate = SignatureGate::new(SecretString::new(cli.secret));

    match cli.command {
        Commands::Sign { userid } => {
            println!("{}", gate.sign(&userid));
        }
        Commands::Lookup { url, userid } => {
            let hash = gate.sign(&userid);
            let res = reqwest::Client::new()
                .get(format!("{}/api/get-bookings", url.trim_end_matches('/')))
                .query(&[("userid", userid.trim()), ("hash", hash.as_str())])
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
