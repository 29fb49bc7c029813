//! 텔레그램 메시지 전송기.
//!
//! Telegram Bot API의 `sendMessage`로 채팅에 텍스트 메시지를 전송합니다.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use signal_core::{BridgeConfig, ChatId, DEFAULT_TELEGRAM_API_URL};
use tracing::{debug, warn};

use crate::types::{MessageSender, NotificationError, NotificationResult};

/// 429 응답에 `retry_after`가 없을 때 사용하는 기본 대기 시간 (초).
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// 텔레그램 Bot API 설정.
#[derive(Debug)]
pub struct TelegramConfig {
    /// @BotFather에서 받은 봇 토큰
    pub bot_token: SecretString,
    /// Bot API 기본 URL
    pub api_base_url: String,
}

impl TelegramConfig {
    /// 새 텔레그램 설정을 생성합니다.
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::from(bot_token.into()),
            api_base_url: DEFAULT_TELEGRAM_API_URL.to_string(),
        }
    }

    /// Bot API 기본 URL을 변경합니다 (로컬 Bot API 서버, 테스트용).
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// 애플리케이션 설정에서 텔레그램 설정을 생성합니다.
    pub fn from_bridge_config(config: &BridgeConfig) -> Self {
        Self::new(config.bot_token.expose_secret()).with_api_base_url(&config.telegram_api_url)
    }

    /// Bot API 메서드 URL.
    pub(crate) fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base_url,
            self.bot_token.expose_secret(),
            method
        )
    }
}

/// 실패 응답 본문.
#[derive(Debug, Deserialize)]
struct TelegramErrorBody {
    description: Option<String>,
    parameters: Option<TelegramResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponseParameters {
    retry_after: Option<u64>,
}

/// 텔레그램 메시지 전송기.
#[derive(Clone)]
pub struct TelegramSender {
    config: Arc<TelegramConfig>,
    client: reqwest::Client,
}

impl TelegramSender {
    /// 새 텔레그램 전송기를 생성합니다.
    pub fn new(config: Arc<TelegramConfig>) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// HTTP 클라이언트를 공유하는 전송기를 생성합니다.
    pub fn with_client(config: Arc<TelegramConfig>, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// 텔레그램에 메시지를 전송합니다.
    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> NotificationResult<()> {
        let params = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });

        debug!(chat_id = %chat_id, "Sending Telegram message");

        let response = self
            .client
            .post(self.config.method_url("sendMessage"))
            .json(&params)
            .send()
            .await
            .map_err(|e| NotificationError::NetworkError(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            debug!(chat_id = %chat_id, "Telegram message sent");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: Option<TelegramErrorBody> = serde_json::from_str(&body).ok();

        // 요청 한도 제한 확인
        if status.as_u16() == 429 {
            let retry_after = parsed
                .as_ref()
                .and_then(|b| b.parameters.as_ref())
                .and_then(|p| p.retry_after)
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!(chat_id = %chat_id, retry_after, "Telegram rate limited");
            return Err(NotificationError::RateLimited(retry_after));
        }

        let description = parsed
            .and_then(|b| b.description)
            .unwrap_or(body);
        Err(NotificationError::SendFailed(format!(
            "HTTP {}: {}",
            status, description
        )))
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> NotificationResult<()> {
        self.send_message(chat_id, text).await
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
