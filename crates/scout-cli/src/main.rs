use anyhow::Result;
use clap::Parser;
use cliclack::input;
use console::style;
use futures::StreamExt;
use scout::gateway::{Gateway, GatewayConfig};
use scout::toolsets::DbConfig;
use std::io::Write;

#[derive(Parser)]
#[command(author, version, about = "Chat with a web-search agent from the terminal", long_about = None)]
struct Cli {
    /// OpenAI API Key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Model to use
    #[arg(short, long, default_value = "gpt-4o-mini")]
    model: String,

    /// Expose the read-only MySQL tools to the agent
    #[arg(long)]
    database: bool,

    /// MySQL host
    #[arg(long, default_value = "localhost")]
    db_host: String,

    /// MySQL port
    #[arg(long, default_value_t = 3306)]
    db_port: u16,

    /// MySQL user
    #[arg(long, default_value = "root")]
    db_user: String,

    /// MySQL password
    #[arg(long, default_value = "")]
    db_password: String,

    /// MySQL schema name
    #[arg(long, default_value = "scout")]
    db_database: String,
}

impl Cli {
    fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            database: self.database.then(|| DbConfig {
                host: self.db_host.clone(),
                port: self.db_port,
                user: self.db_user.clone(),
                password: self.db_password.clone(),
                database: self.db_database.clone(),
            }),
            ..GatewayConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let gateway = Gateway::new(cli.gateway_config())?;

    println!(
        "{}",
        style("Ask questions; type 'exit' to quit.").dim()
    );

    loop {
        let question: String = input("Question:").placeholder("").interact()?;
        let question = question.trim().to_string();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let guard = gateway.check_input(&question);
        if guard.tripped {
            println!(
                "{}",
                style("Refused: that message looks like SQL this assistant will not run.")
                    .yellow()
            );
            continue;
        }

        let mut stream = gateway.ask_stream(&question);
        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(text) => {
                    print!("{text}");
                    std::io::stdout().flush()?;
                }
                Err(err) => {
                    eprintln!("\n{} {err:#}", style("error:").red());
                    break;
                }
            }
        }
        println!("\n{}", style("-".repeat(50)).dim());
    }

    Ok(())
}
