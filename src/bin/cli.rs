use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::json;
use std::fs;

#[derive(Parser)]
#[command(name = "flashdeck-cli")]
#[command(about = "CLI client for the flashdeck API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate flashcards from study text without saving them
    Generate {
        #[arg(short, long)]
        text: String,
    },
    /// Generate flashcards from study text and save them as a collection
    GenerateSave {
        #[arg(short, long)]
        text: String,
        #[arg(short, long)]
        name: String,
    },
    /// List the collection index
    List,
    /// List the cards in one collection
    Cards {
        #[arg(short, long)]
        name: String,
    },
    /// Rename a collection (cards move with it)
    Rename {
        #[arg(short, long)]
        name: String,
        #[arg(short = 'N', long)]
        new_name: String,
    },
    /// Delete a collection and its cards
    Delete {
        #[arg(short, long)]
        name: String,
    },
    /// Create a subscription checkout session
    Checkout,
    /// Save a bearer token for later commands
    Login {
        #[arg(short, long)]
        token: String,
    },
    Logout,
}

const TOKEN_FILE: &str = ".flashdeck_token";

fn token() -> String {
    fs::read_to_string(TOKEN_FILE).unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Generate { text } => {
            let res = client
                .post(format!("{}/generate", cli.url))
                .header("Authorization", format!("Bearer {}", token()))
                .body(text)
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::GenerateSave { text, name } => {
            let res = client
                .post(format!("{}/generate", cli.url))
                .header("Authorization", format!("Bearer {}", token()))
                .body(text)
                .send()
                .await?;
            if !res.status().is_success() {
                println!("Generation failed: {}", res.text().await?);
                return Ok(());
            }
            let generated: serde_json::Value = res.json().await?;
            let cards = generated["flashcards"].clone();
            let res = client
                .post(format!("{}/collections", cli.url))
                .header("Authorization", format!("Bearer {}", token()))
                .json(&json!({ "name": name, "cards": cards }))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::List => {
            let res = client
                .get(format!("{}/collections", cli.url))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Cards { name } => {
            let res = client
                .get(format!("{}/collections/{}/cards", cli.url, name))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Rename { name, new_name } => {
            let res = client
                .put(format!("{}/collections/{}", cli.url, name))
                .header("Authorization", format!("Bearer {}", token()))
                .json(&json!({ "new_name": new_name }))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Delete { name } => {
            let res = client
                .delete(format!("{}/collections/{}", cli.url, name))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Checkout => {
            let res = client
                .post(format!("{}/checkout_sessions", cli.url))
                .header("Authorization", format!("Bearer {}", token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Login { token } => {
            fs::write(TOKEN_FILE, token)?;
            println!("Token saved to {}", TOKEN_FILE);
        }
        Commands::Logout => {
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed).");
        }
    }

    Ok(())
}
