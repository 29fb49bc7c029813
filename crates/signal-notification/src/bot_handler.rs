//! 텔레그램 봇 명령어 핸들러.
//!
//! Long polling으로 업데이트를 수신하고 구독 명령어를 처리합니다.
//! - `/start` - 환영 메시지
//! - `/subscribe` - 구독 등록
//! - `/unsubscribe` - 구독 해지
//!
//! 그 밖의 메시지는 응답 없이 무시합니다.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use signal_core::{ChatId, SubscriberRegistry};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::telegram::TelegramConfig;
use crate::types::{MessageSender, NotificationError, NotificationResult};

/// `getUpdates` 서버 측 long polling 대기 시간 (초).
const POLL_TIMEOUT_SECS: u64 = 30;

/// 폴링 실패 후 재시도 전 대기 시간.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// 명령어 응답 전송 기본 타임아웃.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// `/start` 응답.
pub const WELCOME_TEXT: &str = "Welcome! Use /subscribe to get signals.";

/// `/subscribe` 응답.
pub const SUBSCRIBED_TEXT: &str = "You are now subscribed to signals ✅";

/// `/unsubscribe` 응답.
pub const UNSUBSCRIBED_TEXT: &str = "You are now unsubscribed ❌";

/// 텔레그램 봇 업데이트 응답.
#[derive(Debug, Deserialize)]
struct TelegramUpdates {
    ok: bool,
    #[serde(default)]
    result: Vec<TelegramUpdate>,
    description: Option<String>,
}

/// 개별 업데이트.
#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

/// 메시지 정보.
#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    text: Option<String>,
}

/// 채팅 정보.
#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

/// 봇 명령어 타입.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// 환영 메시지
    Start,
    /// 구독 등록
    Subscribe,
    /// 구독 해지
    Unsubscribe,
}

impl BotCommand {
    /// 텍스트에서 명령어 파싱.
    ///
    /// 인식하지 못한 텍스트는 `None`입니다.
    /// 그룹 채팅의 `/subscribe@MyBot` 형식과 뒤따르는 인자는 허용합니다.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let command = word.strip_prefix('/')?;
        let command = command
            .split_once('@')
            .map_or(command, |(head, _)| head)
            .to_lowercase();

        match command.as_str() {
            "start" => Some(BotCommand::Start),
            "subscribe" => Some(BotCommand::Subscribe),
            "unsubscribe" => Some(BotCommand::Unsubscribe),
            _ => None,
        }
    }
}

/// 명령어 응답 데이터.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    /// 응답 텍스트
    pub text: String,
}

impl CommandResponse {
    /// 일반 텍스트 응답 생성.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 봇 명령어 핸들러 trait.
///
/// 각 명령어의 실제 로직을 구현합니다.
#[async_trait]
pub trait BotCommandHandler: Send + Sync {
    /// 환영 메시지.
    async fn handle_start(&self, chat_id: ChatId) -> NotificationResult<CommandResponse>;

    /// 구독 등록.
    async fn handle_subscribe(&self, chat_id: ChatId) -> NotificationResult<CommandResponse>;

    /// 구독 해지.
    async fn handle_unsubscribe(&self, chat_id: ChatId) -> NotificationResult<CommandResponse>;
}

/// 레지스트리 기반 구독 명령어 핸들러.
pub struct SubscriptionHandler {
    registry: SubscriberRegistry,
}

impl SubscriptionHandler {
    /// 새 핸들러 생성.
    pub fn new(registry: SubscriberRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl BotCommandHandler for SubscriptionHandler {
    async fn handle_start(&self, _chat_id: ChatId) -> NotificationResult<CommandResponse> {
        Ok(CommandResponse::text(WELCOME_TEXT))
    }

    async fn handle_subscribe(&self, chat_id: ChatId) -> NotificationResult<CommandResponse> {
        let added = self.registry.add(chat_id).await;
        info!(chat_id = %chat_id, added, "Subscribe command");
        Ok(CommandResponse::text(SUBSCRIBED_TEXT))
    }

    async fn handle_unsubscribe(&self, chat_id: ChatId) -> NotificationResult<CommandResponse> {
        let removed = self.registry.remove(chat_id).await;
        info!(chat_id = %chat_id, removed, "Unsubscribe command");
        Ok(CommandResponse::text(UNSUBSCRIBED_TEXT))
    }
}

/// 텔레그램 봇 핸들러.
///
/// Long polling으로 업데이트를 수신하고 명령어를 처리합니다.
pub struct TelegramBotHandler<H: BotCommandHandler> {
    config: Arc<TelegramConfig>,
    client: reqwest::Client,
    handler: Arc<H>,
    replier: Arc<dyn MessageSender>,
    reply_timeout: Duration,
    last_update_id: RwLock<i64>,
}

impl<H: BotCommandHandler> TelegramBotHandler<H> {
    /// 새 봇 핸들러 생성.
    ///
    /// 명령어 응답은 `replier`를 통해 전송합니다.
    pub fn new(
        config: Arc<TelegramConfig>,
        handler: Arc<H>,
        replier: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            handler,
            replier,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            last_update_id: RwLock::new(0),
        }
    }

    /// 명령어 응답 타임아웃 지정.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// HTTP 클라이언트 지정.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// 봇 폴링 시작.
    ///
    /// `shutdown`이 취소될 때까지 업데이트를 수신합니다.
    pub async fn start_polling(&self, shutdown: CancellationToken) {
        info!("Telegram update polling started");

        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.poll_updates() => polled,
            };

            match polled {
                Ok(updates) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = self.process_updates(updates) => {}
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to poll updates");
                    // 에러 발생 시 잠시 대기
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        info!("Telegram update polling stopped");
    }

    /// 수신한 업데이트를 순서대로 처리합니다.
    async fn process_updates(&self, updates: Vec<TelegramUpdate>) {
        for update in updates {
            if let Err(e) = self.process_update(update).await {
                error!(error = %e, "Failed to process update");
            }
        }
    }

    /// 업데이트 폴링.
    async fn poll_updates(&self) -> NotificationResult<Vec<TelegramUpdate>> {
        let last_id = *self.last_update_id.read().await;

        let params = serde_json::json!({
            "offset": last_id + 1,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });

        let response = self
            .client
            .post(self.config.method_url("getUpdates"))
            .json(&params)
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 5))
            .send()
            .await
            .map_err(|e| NotificationError::NetworkError(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotificationError::NetworkError(e.without_url()))?;

        // 실패 응답은 JSON이 아닐 수 있음 (프록시의 HTML 에러 페이지 등)
        let updates: TelegramUpdates = match serde_json::from_str(&body) {
            Ok(updates) => updates,
            Err(_) if !status.is_success() => {
                return Err(NotificationError::Api(format!("HTTP {}", status)));
            }
            Err(e) => return Err(NotificationError::SerializationError(e)),
        };

        if !updates.ok {
            return Err(NotificationError::Api(
                updates
                    .description
                    .unwrap_or_else(|| "getUpdates returned ok=false".to_string()),
            ));
        }

        // 마지막 업데이트 ID 갱신
        if let Some(last) = updates.result.iter().map(|u| u.update_id).max() {
            *self.last_update_id.write().await = last;
        }

        Ok(updates.result)
    }

    /// 개별 업데이트 처리.
    async fn process_update(&self, update: TelegramUpdate) -> NotificationResult<()> {
        let Some(message) = update.message else {
            return Ok(());
        };

        let Some(text) = message.text else {
            return Ok(());
        };

        let chat_id = ChatId(message.chat.id);
        let Some(command) = BotCommand::parse(&text) else {
            debug!(chat_id = %chat_id, "Ignoring non-command message");
            return Ok(());
        };

        debug!(chat_id = %chat_id, command = ?command, "Command received");

        let response = self.execute_command(chat_id, command).await?;

        tokio::time::timeout(
            self.reply_timeout,
            self.replier.send_text(chat_id, &response.text),
        )
        .await
        .map_err(|_| NotificationError::Timeout(self.reply_timeout))?
    }

    /// 명령어 실행.
    async fn execute_command(
        &self,
        chat_id: ChatId,
        command: BotCommand,
    ) -> NotificationResult<CommandResponse> {
        match command {
            BotCommand::Start => self.handler.handle_start(chat_id).await,
            BotCommand::Subscribe => self.handler.handle_subscribe(chat_id).await,
            BotCommand::Unsubscribe => self.handler.handle_unsubscribe(chat_id).await,
        }
    }
}
