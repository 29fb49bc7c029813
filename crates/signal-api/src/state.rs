//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 부트스트랩 단계에서 한 번 생성되어 HTTP 라우터와
//! 봇 리스너 양쪽에 주입됩니다. 전역 싱글턴은 사용하지 않습니다.

use std::sync::Arc;

use signal_core::{BridgeConfig, SubscriberRegistry};
use signal_notification::{Broadcaster, MessageSender, TelegramConfig, TelegramSender};

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 설정 (시크릿 포함)
    pub config: Arc<BridgeConfig>,

    /// 텔레그램 Bot API 설정 - 봇 리스너의 `getUpdates` 호출에 사용
    pub telegram: Arc<TelegramConfig>,

    /// 구독자 레지스트리 - 명령어 핸들러가 수정하고 브로드캐스트가 읽음
    pub registry: SubscriberRegistry,

    /// 메시지 전송기 - 브로드캐스트와 명령어 응답에 공용
    pub sender: Arc<dyn MessageSender>,

    /// 시그널 브로드캐스터
    pub broadcaster: Broadcaster,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 설정으로부터 텔레그램 전송기를 포함한 상태를 생성합니다.
    pub fn new(config: BridgeConfig) -> Self {
        let telegram = Arc::new(TelegramConfig::from_bridge_config(&config));
        let sender: Arc<dyn MessageSender> = Arc::new(TelegramSender::new(telegram.clone()));
        Self::with_sender(config, telegram, sender)
    }

    /// 전송기를 직접 지정하여 상태를 생성합니다.
    pub fn with_sender(
        config: BridgeConfig,
        telegram: Arc<TelegramConfig>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        let broadcaster = Broadcaster::new(sender.clone(), config.broadcast.clone());

        Self {
            config: Arc::new(config),
            telegram,
            registry: SubscriberRegistry::new(),
            sender,
            broadcaster,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 AppState 생성.
///
/// `secret`이 `Some`이면 공유 시크릿 검사가 활성화됩니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state(secret: Option<&str>, sender: Arc<dyn MessageSender>) -> AppState {
    let mut vars = vec![("BOT_TOKEN", "test-token".to_string())];
    if let Some(secret) = secret {
        vars.push(("WEBHOOK_SECRET", secret.to_string()));
    }

    let config = BridgeConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("test configuration must be valid");

    let telegram = Arc::new(TelegramConfig::from_bridge_config(&config));
    AppState::with_sender(config, telegram, sender)
}
