//! 시그널 브리지의 에러 타입.
//!
//! 설정 로딩 에러와 시그널 페이로드 검증 에러를 정의합니다.

use thiserror::Error;

/// 설정 에러.
///
/// 프로세스 시작 단계에서만 발생하며, 발생 시 프로세스는 시작되지 않습니다.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 필수 환경 변수 누락
    #[error("필수 환경 변수가 설정되지 않았습니다: {0}")]
    Missing(&'static str),

    /// 환경 변수 값 파싱 실패
    #[error("환경 변수 {name}의 값이 잘못되었습니다 ({value:?}): {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// 설정 작업을 위한 Result 타입.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 시그널 페이로드 검증 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// JSON 객체가 아닌 본문
    #[error("요청 본문이 올바른 JSON 객체가 아닙니다: {0}")]
    MalformedBody(String),

    /// 필수 필드 누락 (없음, null, 빈 값, 0)
    #[error("필수 필드가 누락되었습니다: {0}")]
    MissingField(&'static str),

    /// 필드 타입 불일치
    #[error("필드 {field}의 타입이 잘못되었습니다 ({expected} 필요)")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// 시그널 검증을 위한 Result 타입.
pub type SignalResult<T> = Result<T, SignalError>;

impl SignalError {
    /// API 응답에 사용하는 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            SignalError::MalformedBody(_) | SignalError::InvalidField { .. } => "INVALID_BODY",
            SignalError::MissingField(_) => "MISSING_FIELDS",
        }
    }

    /// 문제가 된 필드 이름 (있는 경우).
    pub fn field(&self) -> Option<&'static str> {
        match self {
            SignalError::MalformedBody(_) => None,
            SignalError::MissingField(field) | SignalError::InvalidField { field, .. } => {
                Some(field)
            }
        }
    }
}
