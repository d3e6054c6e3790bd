use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Outbound side of the chat transport. The dispatcher and broadcast
/// fan-out only ever talk to this trait, so tests can count sends without
/// a network peer.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// Telegram Bot API client for sendMessage.
pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramClient {
    pub fn new(client: reqwest::Client, api_base: String, bot_token: String) -> Self {
        Self {
            client,
            api_base,
            bot_token,
        }
    }
}

#[async_trait]
impl Notify for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);

        debug!("Sending message to chat {}", chat_id);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
            }))
            .send()
            .await
            .context("Failed to send request to Telegram")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram sendMessage error ({}): {}", status, error_body);
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn posts_chat_id_and_text_to_send_message() {
        let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route(
                "/bottest-token/sendMessage",
                post(
                    |State(received): State<Arc<Mutex<Vec<serde_json::Value>>>>,
                     Json(body): Json<serde_json::Value>| async move {
                        received.lock().unwrap().push(body);
                        Json(json!({"ok": true}))
                    },
                ),
            )
            .with_state(Arc::clone(&received));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = TelegramClient::new(
            reqwest::Client::new(),
            format!("http://{}", addr),
            "test-token".to_string(),
        );

        client.send_message(42, "hello there").await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["chat_id"], 42);
        assert_eq!(received[0]["text"], "hello there");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let app = Router::new().route(
            "/bottest-token/sendMessage",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    "chat not found".to_string(),
                )
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = TelegramClient::new(
            reqwest::Client::new(),
            format!("http://{}", addr),
            "test-token".to_string(),
        );

        let err = client.send_message(42, "hi").await.unwrap_err();
        assert!(err.to_string().contains("400"));
    }
}
