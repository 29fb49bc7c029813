//! 시그널 브로드캐스트.
//!
//! 하나의 메시지를 여러 채팅으로 전송합니다. 각 전송은 서로 독립적이며,
//! 한 수신자의 실패나 지연이 다른 수신자의 전송을 막지 않습니다.
//! 재시도는 하지 않습니다.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use signal_core::{BroadcastConfig, ChatId};
use tracing::{error, info, warn};

use crate::types::{MessageSender, NotificationError};

/// 수신자별 전송 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 전송 성공
    Delivered,
    /// 전송 실패 (타임아웃 포함)
    Failed { reason: String },
}

impl DeliveryOutcome {
    /// 성공 여부.
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// 한 수신자에 대한 전송 기록.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub chat_id: ChatId,
    pub outcome: DeliveryOutcome,
}

/// 브로드캐스트 결과.
///
/// 수신자 순서는 보장되지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct BroadcastReport {
    deliveries: Vec<Delivery>,
}

impl BroadcastReport {
    /// 전송 기록 목록.
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    /// 전송을 시도한 수신자 수.
    pub fn attempted(&self) -> usize {
        self.deliveries.len()
    }

    /// 성공한 수신자 수.
    pub fn delivered(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| d.outcome.is_delivered())
            .count()
    }

    /// 실패한 수신자 수.
    pub fn failed(&self) -> usize {
        self.attempted() - self.delivered()
    }

    /// 실패한 전송 기록.
    pub fn failures(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter().filter(|d| !d.outcome.is_delivered())
    }

    /// 특정 채팅의 결과 조회.
    pub fn outcome_for(&self, chat_id: ChatId) -> Option<&DeliveryOutcome> {
        self.deliveries
            .iter()
            .find(|d| d.chat_id == chat_id)
            .map(|d| &d.outcome)
    }
}

/// 시그널 브로드캐스터.
#[derive(Clone)]
pub struct Broadcaster {
    sender: Arc<dyn MessageSender>,
    config: BroadcastConfig,
}

impl Broadcaster {
    /// 새 브로드캐스터 생성.
    pub fn new(sender: Arc<dyn MessageSender>, config: BroadcastConfig) -> Self {
        Self { sender, config }
    }

    /// 모든 수신자에게 메시지를 전송합니다.
    ///
    /// 최대 `concurrency`개의 전송이 동시에 진행되며,
    /// 각 전송은 `delivery_timeout` 안에 끝나지 않으면 실패로 기록됩니다.
    pub async fn broadcast(&self, recipients: Vec<ChatId>, text: &str) -> BroadcastReport {
        if recipients.is_empty() {
            info!("No subscribers, skipping broadcast");
            return BroadcastReport::default();
        }

        let deliveries: Vec<Delivery> = stream::iter(recipients)
            .map(|chat_id| self.deliver(chat_id, text))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let report = BroadcastReport { deliveries };
        info!(
            sender = self.sender.name(),
            attempted = report.attempted(),
            delivered = report.delivered(),
            failed = report.failed(),
            "Broadcast finished"
        );
        report
    }

    async fn deliver(&self, chat_id: ChatId, text: &str) -> Delivery {
        let timeout = self.config.delivery_timeout;
        let result = match tokio::time::timeout(timeout, self.sender.send_text(chat_id, text)).await
        {
            Ok(result) => result,
            Err(_) => Err(NotificationError::Timeout(timeout)),
        };

        let outcome = match result {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(e @ NotificationError::Timeout(_)) => {
                warn!(chat_id = %chat_id, error = %e, "Signal delivery timed out");
                DeliveryOutcome::Failed {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                error!(chat_id = %chat_id, error = %e, "Failed to deliver signal");
                DeliveryOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        Delivery { chat_id, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationResult;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    /// 지정한 채팅에 대해 실패하거나 응답하지 않는 테스트용 전송기.
    #[derive(Default)]
    struct ScriptedSender {
        failing: HashSet<ChatId>,
        hanging: HashSet<ChatId>,
        sent: Mutex<Vec<(ChatId, String)>>,
    }

    #[async_trait]
    impl MessageSender for ScriptedSender {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> NotificationResult<()> {
            if self.hanging.contains(&chat_id) {
                std::future::pending::<()>().await;
            }
            if self.failing.contains(&chat_id) {
                return Err(NotificationError::SendFailed(
                    "HTTP 403 Forbidden: bot was blocked by the user".to_string(),
                ));
            }
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn broadcaster(sender: Arc<ScriptedSender>) -> Broadcaster {
        Broadcaster::new(
            sender,
            BroadcastConfig {
                delivery_timeout: Duration::from_secs(5),
                concurrency: 4,
            },
        )
    }

    #[tokio::test]
    async fn test_empty_recipients() {
        let sender = Arc::new(ScriptedSender::default());
        let report = broadcaster(sender.clone()).broadcast(vec![], "hi").await;

        assert_eq!(report.attempted(), 0);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_others() {
        let sender = Arc::new(ScriptedSender {
            failing: [ChatId(1)].into_iter().collect(),
            ..Default::default()
        });

        let report = broadcaster(sender.clone())
            .broadcast(vec![ChatId(1), ChatId(2)], "signal")
            .await;

        assert_eq!(report.attempted(), 2);
        assert_eq!(report.delivered(), 1);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.outcome_for(ChatId(1)),
            Some(DeliveryOutcome::Failed { reason }) if reason.contains("blocked")
        ));
        assert_eq!(report.outcome_for(ChatId(2)), Some(&DeliveryOutcome::Delivered));
        assert_eq!(
            *sender.sent.lock().unwrap(),
            vec![(ChatId(2), "signal".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_delivery_times_out() {
        let sender = Arc::new(ScriptedSender {
            hanging: [ChatId(10)].into_iter().collect(),
            ..Default::default()
        });

        let report = broadcaster(sender.clone())
            .broadcast(vec![ChatId(10), ChatId(11), ChatId(12)], "signal")
            .await;

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.delivered(), 2);
        let failures: Vec<_> = report.failures().map(|d| d.chat_id).collect();
        assert_eq!(failures, vec![ChatId(10)]);
    }

    #[tokio::test]
    async fn test_all_recipients_attempted_beyond_concurrency() {
        let sender = Arc::new(ScriptedSender::default());
        let recipients: Vec<ChatId> = (0..20).map(ChatId).collect();

        let report = broadcaster(sender.clone())
            .broadcast(recipients, "signal")
            .await;

        assert_eq!(report.attempted(), 20);
        assert_eq!(report.delivered(), 20);
        assert_eq!(sender.sent.lock().unwrap().len(), 20);
    }
}
