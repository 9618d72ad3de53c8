use crate::error::{EgographError, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Chat and bot token for the operator channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub chat_id: String,
    pub token: String,
}

impl TelegramCredentials {
    /// Parse the `chatId#token` form used in the environment.
    pub fn parse(raw: &str) -> Option<Self> {
        let (chat_id, token) = raw.trim().split_once('#')?;
        if chat_id.is_empty() || token.is_empty() {
            return None;
        }
        Some(Self {
            chat_id: chat_id.to_string(),
            token: token.to_string(),
        })
    }
}

/// Telegram bot notifier
///
/// Without credentials every `send` is a no-op.
pub struct TelegramNotifier {
    client: Client,
    credentials: Option<TelegramCredentials>,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(credentials: Option<TelegramCredentials>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            credentials,
            api_base: TELEGRAM_API.to_string(),
        })
    }

    /// Build a notifier from the `chatId#token` value of `var`.
    pub fn from_env(var: &str) -> Result<Self> {
        let credentials = match std::env::var(var) {
            Ok(raw) => match TelegramCredentials::parse(&raw) {
                Some(c) => {
                    log::info!("Telegram notification configured");
                    Some(c)
                }
                None => {
                    log::warn!("{} is set but not in chatId#token form, notifications disabled", var);
                    None
                }
            },
            Err(_) => {
                log::warn!("No Telegram credentials found");
                None
            }
        };
        Self::new(credentials)
    }

    /// Point the client at another API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send `text` to the configured chat
    pub async fn send(&self, text: &str) -> Result<()> {
        let Some(credentials) = &self.credentials else {
            return Ok(());
        };

        let mut url = Url::parse(&format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            credentials.token
        ))
        .map_err(|e| EgographError::Notification(format!("bad API url: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("chat_id", &credentials.chat_id)
            .append_pair("text", text);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EgographError::Notification(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EgographError::Notification(format!("Telegram API error {}", status)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        routing::get,
        Router,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_parse_credentials() {
        let c = TelegramCredentials::parse("12345#abc:def").unwrap();
        assert_eq!(c.chat_id, "12345");
        assert_eq!(c.token, "abc:def");
        assert!(TelegramCredentials::parse("no-separator").is_none());
        assert!(TelegramCredentials::parse("#token").is_none());
        assert!(TelegramCredentials::parse("chat#").is_none());
    }

    #[tokio::test]
    async fn test_disabled_send_is_noop() {
        let notifier = TelegramNotifier::new(None).unwrap();
        assert!(!notifier.is_enabled());
        notifier.send("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_hits_bot_endpoint() {
        let seen: Arc<Mutex<Vec<(String, HashMap<String, String>)>>> = Arc::default();
        let record = seen.clone();
        let router = Router::new().route(
            "/:bot/sendMessage",
            get(
                move |Path(bot): Path<String>, Query(params): Query<HashMap<String, String>>| {
                    let record = record.clone();
                    async move {
                        record.lock().unwrap().push((bot, params));
                        "{\"ok\":true}"
                    }
                },
            ),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let credentials = TelegramCredentials::parse("42#secret").unwrap();
        let notifier = TelegramNotifier::new(Some(credentials))
            .unwrap()
            .with_api_base(format!("http://{}", addr));
        notifier.send("host -> okr").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "botsecret");
        assert_eq!(seen[0].1["chat_id"], "42");
        assert_eq!(seen[0].1["text"], "host -> okr");
    }

    #[tokio::test]
    async fn test_send_reports_api_error() {
        let credentials = TelegramCredentials::parse("42#secret").unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new()).await.unwrap();
        });

        let notifier = TelegramNotifier::new(Some(credentials))
            .unwrap()
            .with_api_base(format!("http://{}", addr));
        let err = notifier.send("x").await.unwrap_err();
        assert!(matches!(err, EgographError::Notification(_)));
    }
}
