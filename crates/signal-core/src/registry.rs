//! 구독자 레지스트리.
//!
//! 시그널 브로드캐스트를 받을 채팅 ID의 인메모리 집합입니다.
//! 영속화하지 않으므로 프로세스 재시작 시 항상 비어 있습니다.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// 텔레그램 채팅 식별자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// 구독자 레지스트리 핸들.
///
/// 복제 비용이 낮으며, 모든 복제본이 같은 집합을 공유합니다.
/// 명령어 핸들러의 추가/삭제와 브로드캐스트의 스냅샷 조회가 동시에 일어날 수 있습니다.
#[derive(Debug, Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<RwLock<HashSet<ChatId>>>,
}

impl SubscriberRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 구독자를 추가합니다.
    ///
    /// 새로 추가된 경우 `true`, 이미 구독 중이면 `false`를 반환합니다.
    pub async fn add(&self, id: ChatId) -> bool {
        self.inner.write().await.insert(id)
    }

    /// 구독자를 제거합니다.
    ///
    /// 구독자가 없어도 에러가 아니며 `false`를 반환합니다.
    pub async fn remove(&self, id: ChatId) -> bool {
        self.inner.write().await.remove(&id)
    }

    /// 현재 구독자 목록의 복사본을 반환합니다.
    ///
    /// 읽기 락은 복사하는 동안만 유지됩니다.
    pub async fn snapshot(&self) -> Vec<ChatId> {
        self.inner.read().await.iter().copied().collect()
    }

    /// 구독 여부 확인.
    pub async fn contains(&self, id: ChatId) -> bool {
        self.inner.read().await.contains(&id)
    }

    /// 구독자 수.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// 구독자가 없는지 확인.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
