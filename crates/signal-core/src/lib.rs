//! # Signal Core
//!
//! 시그널 브리지의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 다른 크레이트에서 공통으로 사용하는 기본 타입을 제공합니다:
//! - 구독자 레지스트리 (인메모리 채팅 ID 집합)
//! - 시그널 페이로드 검증 및 메시지 템플릿
//! - 환경 변수 기반 설정
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod signal;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use registry::*;
pub use signal::*;
