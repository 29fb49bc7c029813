//! 백그라운드 서비스 모듈.

pub mod telegram_bot;

pub use telegram_bot::spawn_bot_listener;
