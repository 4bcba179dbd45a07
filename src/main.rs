//! Lark Bot echo server
//!
//! Minimal bot wiring: subscribe to message and reaction events, echo them
//! back to the sender through the message API.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::info;

use lark_bot::webhook::{webhook_router, WebhookState};
use lark_bot::{BotConfig, CallMode, EventEnvelope, EventHandler, EventPayload, LarkClient};

/// Lark Bot echo server
#[derive(Parser, Debug)]
#[command(name = "lark-bot")]
#[command(version)]
#[command(about = "Echo bot server for the Lark open platform")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "9000")]
    port: u16,

    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Webhook callback path, as configured in the platform console
    #[arg(long, default_value = "/lark/event")]
    path: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

struct EchoHandler {
    client: LarkClient,
}

#[async_trait::async_trait]
impl EventHandler for EchoHandler {
    async fn on_event(&self, event: EventEnvelope) -> anyhow::Result<()> {
        match event.payload {
            EventPayload::MessageReceived(received) => {
                let text = received
                    .message
                    .text()
                    .unwrap_or_else(|| received.message.message_type.clone());
                let message_id = self
                    .client
                    .messages()
                    .send_text(&text, &received.sender.sender_id.open_id)
                    .resolve()
                    .await?;
                info!(?message_id, "Echoed message");
            }
            EventPayload::ReactionCreated(reaction) => {
                let message_id = self
                    .client
                    .messages()
                    .send_text(&reaction.reaction_type.emoji_type, &reaction.user_id.open_id)
                    .resolve()
                    .await?;
                info!(?message_id, "Echoed reaction");
            }
            EventPayload::Unknown(_) => {
                info!(event_type = %event.header.event_type, "Ignoring event");
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = BotConfig::from_env()?;
    let client = LarkClient::new(config.clone())?;
    client.set_mode(CallMode::Scheduled);

    let handler = Arc::new(EchoHandler { client });
    let (state, dispatcher) = WebhookState::new(&config, handler);
    tokio::spawn(dispatcher.run());

    let app = webhook_router(&args.path, Arc::new(state)).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Webhook endpoint listening on http://{}{}", addr, args.path);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
