//! # Signal Notification
//!
//! 텔레그램 메시지 전송 및 봇 명령어 처리.
//!
//! - [`telegram`]: Bot API `sendMessage` 전송기
//! - [`broadcast`]: 구독자 전체에 대한 시그널 브로드캐스트
//! - [`bot_handler`]: `getUpdates` long polling 및 구독 명령어 처리
//!
//! # 텔레그램 봇 명령어
//!
//! - `/start` - 환영 메시지
//! - `/subscribe` - 시그널 구독
//! - `/unsubscribe` - 시그널 구독 해지

pub mod bot_handler;
pub mod broadcast;
pub mod telegram;
pub mod types;

pub use bot_handler::*;
pub use broadcast::*;
pub use telegram::*;
pub use types::*;
