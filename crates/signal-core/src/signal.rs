//! 시그널 페이로드.
//!
//! 외부에서 POST로 전달되는 트레이딩 시그널을 검증하고
//! 구독자에게 보낼 메시지로 변환합니다. 시그널은 요청 처리 동안만 존재하며 저장되지 않습니다.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{SignalError, SignalResult};

/// 검증된 시그널.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    /// 거래 쌍 (예: "EURUSD")
    pub pair: String,
    /// 방향 (예: "up", "down")
    pub direction: String,
    /// 만료 시간 (분)
    pub expiry_minutes: Number,
    /// 메모 (없으면 빈 문자열)
    pub note: String,
}

impl Signal {
    /// 요청 본문 바이트에서 시그널을 파싱합니다.
    pub fn from_slice(body: &[u8]) -> SignalResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| SignalError::MalformedBody(e.to_string()))?;
        Self::from_value(value)
    }

    /// JSON 값에서 시그널을 파싱합니다.
    ///
    /// 필드는 `pair`, `direction`, `expiry_minutes` 순서로 검사합니다.
    /// 알 수 없는 필드는 무시합니다.
    pub fn from_value(value: Value) -> SignalResult<Self> {
        let Value::Object(fields) = value else {
            return Err(SignalError::MalformedBody(
                "JSON 객체가 필요합니다".to_string(),
            ));
        };

        let pair = required_string(&fields, "pair")?;
        let direction = required_string(&fields, "direction")?;
        let expiry_minutes = required_expiry(&fields)?;
        let note = optional_string(&fields, "note")?;

        Ok(Self {
            pair,
            direction,
            expiry_minutes,
            note,
        })
    }

    /// 구독자에게 전송할 메시지를 생성합니다.
    pub fn render_message(&self) -> String {
        format!(
            "📊 Signal\n\
             Pair: {}\n\
             Direction: {}\n\
             Expiry: {}m\n\
             Note: {}",
            self.pair, self.direction, self.expiry_minutes, self.note
        )
    }
}

fn required_string(fields: &Map<String, Value>, name: &'static str) -> SignalResult<String> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(SignalError::MissingField(name)),
        Some(Value::String(s)) if s.is_empty() => Err(SignalError::MissingField(name)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SignalError::InvalidField {
            field: name,
            expected: "string",
        }),
    }
}

fn required_expiry(fields: &Map<String, Value>) -> SignalResult<Number> {
    const NAME: &str = "expiry_minutes";

    match fields.get(NAME) {
        None | Some(Value::Null) => Err(SignalError::MissingField(NAME)),
        Some(Value::Number(n)) => match n.as_f64() {
            // 0은 누락으로 취급
            Some(v) if v == 0.0 => Err(SignalError::MissingField(NAME)),
            Some(v) if v > 0.0 => Ok(n.clone()),
            _ => Err(SignalError::InvalidField {
                field: NAME,
                expected: "positive number",
            }),
        },
        Some(_) => Err(SignalError::InvalidField {
            field: NAME,
            expected: "positive number",
        }),
    }
}

fn optional_string(fields: &Map<String, Value>, name: &'static str) -> SignalResult<String> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SignalError::InvalidField {
            field: name,
            expected: "string",
        }),
    }
}
