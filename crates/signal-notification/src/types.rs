//! 알림 에러 및 전송기 trait 정의.

use std::time::Duration;

use async_trait::async_trait;
use signal_core::ChatId;

/// 알림 작업용 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    #[error("요청 한도 초과: {0}초 후 재시도")]
    RateLimited(u64),

    #[error("전송 타임아웃: {0:?}")]
    Timeout(Duration),

    #[error("텔레그램 API 응답 실패: {0}")]
    Api(String),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 채팅 메시지 전송기 trait.
///
/// 브로드캐스트와 명령어 응답이 모두 이 trait을 통해 메시지를 보냅니다.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// 지정한 채팅으로 일반 텍스트 메시지를 전송합니다.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> NotificationResult<()>;

    /// 전송기 이름을 반환합니다.
    fn name(&self) -> &str;
}
