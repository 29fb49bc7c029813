//! 텔레그램 봇 명령어 리스너 서비스.
//!
//! HTTP 서버와 같은 구독자 레지스트리를 공유하는 명령어 핸들러를 띄웁니다.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use signal_notification::{SubscriptionHandler, TelegramBotHandler};

use crate::state::AppState;

/// 봇 리스너를 백그라운드 태스크로 시작합니다.
///
/// `shutdown`이 취소되면 폴링 루프가 종료되고 태스크가 끝납니다.
pub fn spawn_bot_listener(state: &AppState, shutdown: CancellationToken) -> JoinHandle<()> {
    let handler = Arc::new(SubscriptionHandler::new(state.registry.clone()));
    let bot = TelegramBotHandler::new(state.telegram.clone(), handler, state.sender.clone())
        .with_reply_timeout(state.config.broadcast.delivery_timeout);

    tokio::spawn(async move {
        info!("텔레그램 봇 명령어 리스너 시작");
        bot.start_polling(shutdown).await;
    })
}
