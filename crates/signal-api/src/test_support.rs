//! 라우트 테스트용 전송기.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use signal_core::ChatId;
use signal_notification::{MessageSender, NotificationError, NotificationResult};

/// 전송 내역을 기록하는 전송기.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(ChatId, String)>>,
    failing: HashSet<ChatId>,
}

impl RecordingSender {
    /// 지정한 채팅으로의 전송은 실패합니다.
    pub fn failing_for(ids: impl IntoIterator<Item = ChatId>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: ids.into_iter().collect(),
        }
    }

    /// 성공한 전송 목록.
    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> NotificationResult<()> {
        if self.failing.contains(&chat_id) {
            return Err(NotificationError::SendFailed("HTTP 403: blocked".to_string()));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
