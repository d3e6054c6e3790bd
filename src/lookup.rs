use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::config::LookupConfig;

/// Fixed literal, explicitly not a real payment instrument.
pub fn test_card() -> String {
    "Card Number: 1234 5678 9012 3456, Exp: 12/34, CVV: 123".to_string()
}

/// Client for the third-party lookup services (BIN, random user, video
/// resolver, IP info). Each lookup is one GET.
pub struct LookupClient {
    client: reqwest::Client,
    config: LookupConfig,
}

impl LookupClient {
    pub fn new(client: reqwest::Client, config: LookupConfig) -> Self {
        Self { client, config }
    }

    /// BIN lookup; the whole JSON response is relayed for display.
    pub async fn bin_check(&self, bin: &str) -> Result<String> {
        let url = format!("{}/{}", self.config.bin_base_url, bin);

        debug!("Looking up BIN {}", bin);

        let response = self
            .client
            .get(&url)
            .header("Accept-Version", "3")
            .send()
            .await
            .context("Failed to reach BIN lookup service")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("BIN lookup error ({}): {}", status, error_body);
        }

        let decoded: Value = response
            .json()
            .await
            .context("Failed to parse BIN lookup response")?;

        Ok(decoded.to_string())
    }

    /// First entry of the random-user service, flattened for display.
    pub async fn random_user(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.config.random_user_url)
            .send()
            .await
            .context("Failed to reach random-user service")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Random-user error ({}): {}", status, error_body);
        }

        let decoded: Value = response
            .json()
            .await
            .context("Failed to parse random-user response")?;

        let user = decoded
            .get("results")
            .and_then(|r| r.get(0))
            .context("Random-user response has no results")?;

        let field = |v: &Value, path: &[&str]| -> Result<String> {
            let mut cur = v.clone();
            for p in path {
                cur = cur
                    .get(*p)
                    .cloned()
                    .with_context(|| format!("Random-user response missing '{}'", p))?;
            }
            cur.as_str()
                .map(str::to_string)
                .with_context(|| format!("Random-user field '{}' is not a string", path.join(".")))
        };

        Ok(format!(
            "{} {}, {}, {}, {}",
            field(user, &["name", "first"])?,
            field(user, &["name", "last"])?,
            field(user, &["email"])?,
            field(user, &["location", "city"])?,
            field(user, &["phone"])?,
        ))
    }

    /// Video-download resolver. The upstream contract is a placeholder
    /// (no known real API behind the default URL); we only assume a
    /// `download_link` field and let config point at a real resolver.
    pub async fn yt_download(&self, video_url: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.config.yt_resolver_url)
            .query(&[("url", video_url)])
            .send()
            .await
            .context("Failed to reach video-download resolver")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Video-download resolver error ({}): {}", status, error_body);
        }

        let decoded: Value = response
            .json()
            .await
            .context("Failed to parse video-download resolver response")?;

        decoded
            .get("download_link")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .context("Video-download resolver response missing 'download_link' field")
    }

    /// IP lookup; the whole JSON response is relayed for display.
    pub async fn ip_info(&self, ip: &str) -> Result<String> {
        let url = format!("{}/{}/json", self.config.ip_info_base_url, ip);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach IP-info service")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("IP-info error ({}): {}", status, error_body);
        }

        let decoded: Value = response
            .json()
            .await
            .context("Failed to parse IP-info response")?;

        Ok(decoded.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query, State},
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config_with(base: &str) -> LookupConfig {
        LookupConfig {
            bin_base_url: base.to_string(),
            random_user_url: format!("{}/api/", base),
            yt_resolver_url: format!("{}/download", base),
            ip_info_base_url: base.to_string(),
        }
    }

    #[test]
    fn test_card_is_pure_and_stable() {
        let first = test_card();
        let second = test_card();
        assert_eq!(first, second);
        assert_eq!(
            first,
            "Card Number: 1234 5678 9012 3456, Exp: 12/34, CVV: 123"
        );
    }

    #[tokio::test]
    async fn bin_check_issues_one_get_and_relays_full_json() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen_bin: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let hits_h = Arc::clone(&hits);
        let seen_h = Arc::clone(&seen_bin);
        let app = Router::new()
            .route(
                "/{bin}",
                get(
                    move |Path(bin): Path<String>,
                          State((hits, seen)): State<(
                        Arc<AtomicUsize>,
                        Arc<Mutex<Option<String>>>,
                    )>| async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        *seen.lock().unwrap() = Some(bin);
                        Json(json!({"scheme": "visa", "bank": {"name": "Test Bank"}}))
                    },
                ),
            )
            .with_state((hits_h, seen_h));
        let base = serve(app).await;

        let lookup = LookupClient::new(reqwest::Client::new(), config_with(&base));
        let info = lookup.bin_check("400000").await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(seen_bin.lock().unwrap().as_deref(), Some("400000"));
        let decoded: Value = serde_json::from_str(&info).unwrap();
        assert_eq!(decoded["scheme"], "visa");
        assert_eq!(decoded["bank"]["name"], "Test Bank");
    }

    #[tokio::test]
    async fn random_user_formats_first_result() {
        let app = Router::new().route(
            "/api/",
            get(|| async {
                Json(json!({
                    "results": [{
                        "name": {"first": "Ada", "last": "Lovelace"},
                        "email": "ada@example.com",
                        "location": {"city": "London"},
                        "phone": "555-0100"
                    }]
                }))
            }),
        );
        let base = serve(app).await;

        let lookup = LookupClient::new(reqwest::Client::new(), config_with(&base));
        let user = lookup.random_user().await.unwrap();

        assert_eq!(user, "Ada Lovelace, ada@example.com, London, 555-0100");
    }

    #[tokio::test]
    async fn yt_download_passes_url_and_extracts_link() {
        let app = Router::new().route(
            "/download",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("url").map(String::as_str), Some("https://youtu.be/x"));
                Json(json!({"download_link": "https://cdn.example/x.mp4"}))
            }),
        );
        let base = serve(app).await;

        let lookup = LookupClient::new(reqwest::Client::new(), config_with(&base));
        let link = lookup.yt_download("https://youtu.be/x").await.unwrap();

        assert_eq!(link, "https://cdn.example/x.mp4");
    }

    #[tokio::test]
    async fn ip_info_relays_full_json() {
        let app = Router::new().route(
            "/8.8.8.8/json",
            get(|| async { Json(json!({"ip": "8.8.8.8", "org": "Example LLC"})) }),
        );
        let base = serve(app).await;

        let lookup = LookupClient::new(reqwest::Client::new(), config_with(&base));
        let info = lookup.ip_info("8.8.8.8").await.unwrap();

        let decoded: Value = serde_json::from_str(&info).unwrap();
        assert_eq!(decoded["org"], "Example LLC");
    }
}
