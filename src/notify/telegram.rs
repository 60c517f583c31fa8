use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Notifier;

/// Telegram Bot API `sendMessage` client. One attempt per message.
#[derive(Clone)]
pub struct TelegramNotifier {
    api_base: String,
    token: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(api_base: String, token: String) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: false,
        };

        // The token is part of the URL, so errors are stripped of it before logging.
        let rsp = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("telegram request failed: {}", e.without_url()))?;

        let status = rsp.status();
        let reply: ApiReply = rsp.json().await.context("telegram reply body")?;
        if !status.is_success() || !reply.ok {
            return Err(anyhow!(
                "telegram sendMessage rejected ({status}): {}",
                reply.description.unwrap_or_default()
            ));
        }
        Ok(())
    }
}
