pub mod agent;
pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod utils;

use agent::ChatAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat API Key: {}", if args.api_key().is_some() { "set" } else { "missing" });
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("adapter default"));
    info!("Default Chat Model: {}", args.chat_model);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = Arc::new(ChatAgent::from_args(&args)?);
    info!(
        "Chat agent ready (configured: {}, default model: {})",
        agent.is_configured(),
        agent.default_model()
    );

    let addr = args.server_addr.clone();
    let server = Server::new(addr, agent, args.clone());
    server.run().await?;

    Ok(())
}
