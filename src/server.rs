use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::State, routing::post, Router};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::dispatch::{Dispatcher, IncomingMessage};

/// Inbound webhook payload: `{message: {chat: {id}, text, photo?, voice?}}`.
#[derive(Debug, Deserialize)]
struct WebhookUpdate {
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    chat: RawChat,
    text: Option<String>,
    photo: Option<Vec<PhotoSize>>,
    voice: Option<Voice>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct PhotoSize {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct Voice {
    file_id: String,
}

/// Lift the raw webhook body into an `IncomingMessage`. Returns None for
/// payloads that don't carry a message (or don't parse at all).
pub(crate) fn parse_update(body: &str) -> Option<IncomingMessage> {
    let update: WebhookUpdate = match serde_json::from_str(body) {
        Ok(u) => u,
        Err(e) => {
            warn!("Ignoring malformed webhook payload: {}", e);
            return None;
        }
    };

    let message = update.message?;

    // Telegram lists photo sizes smallest first; the last is the original.
    let photo_file_id = message
        .photo
        .and_then(|sizes| sizes.into_iter().last())
        .map(|size| size.file_id);

    Some(IncomingMessage {
        chat_id: message.chat.id,
        text: message.text,
        photo_file_id,
        voice_file_id: message.voice.map(|v| v.file_id),
    })
}

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .with_state(dispatcher)
}

/// Serve the webhook endpoint until the process is stopped.
pub async fn run(bind: &str, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind webhook server to {}", bind))?;

    info!("Webhook server listening on {}", bind);

    axum::serve(listener, router(dispatcher))
        .await
        .context("Webhook server exited")?;

    Ok(())
}

/// The transport retries deliveries that don't get a 2xx, so this always
/// acknowledges with 200 "OK" — malformed payloads and failed handling
/// included.
async fn handle_webhook(State(dispatcher): State<Arc<Dispatcher>>, body: String) -> &'static str {
    if let Some(msg) = parse_update(&body) {
        if let Err(e) = dispatcher.handle(&msg).await {
            error!("Failed to handle message for chat {}: {:#}", msg.chat_id, e);
        }
    }
    "OK"
}
