//! Main entry point for the Chat Translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_translator::cli::commands::{self, ClientOverrides, Commands};
use chat_translator::{ChatClient, ClientError};

/// Chat Translator - one-shot chat-completion client
#[derive(Parser, Debug)]
#[command(name = "chat-translator", version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    client: ClientOverrides,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.client.resolve()?;
    let client = ChatClient::new(config)?;

    match args.command {
        Some(Commands::Translate {
            text,
            target_lang,
            raw,
        }) => {
            commands::handle_translate(&client, text, target_lang, raw).await?;
        }
        Some(Commands::Chat {
            prompt,
            system,
            raw,
        }) => {
            commands::handle_chat(&client, prompt, system, raw).await?;
        }
        Some(Commands::Serve { host, port }) => {
            commands::handle_server(client, host, port).await?;
        }
        None => {
            commands::handle_translate(
                &client,
                commands::DEFAULT_TEXT.to_string(),
                commands::DEFAULT_TARGET_LANG.to_string(),
                false,
            )
            .await?;
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging; stdout is reserved for presented output
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}={}", env!("CARGO_CRATE_NAME"), default_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args).await {
        match e.downcast_ref::<ClientError>() {
            Some(client_err) if client_err.is_request_failure() => {
                eprintln!("request failed: {}", client_err);
            }
            _ => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}
