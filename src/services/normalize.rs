//! # 백엔드 호환 정규화 유틸리티
//!
//! 외부 API는 옵션 목록 같은 배열 값을 때때로 "JSON이 담긴 문자열"로 돌려줍니다.
//! 예: `"options": "[\"A\",\"B\"]"`
//!
//! 이 모듈은 그런 값을 메모리 안의 정규 형태(배열)로 바꾸는 함수들을 모아둡니다.
//! 원칙은 하나입니다: **절대 실패하지 않는다 (fail open)**.
//! 해석할 수 없는 값은 에러 대신 빈 배열이 됩니다.
//!
//! - `normalize_array()`: 배열/null/JSON 문자열 → 배열
//! - `option_label()`: `"A"` 또는 `{ "label": "A" }` → `"A"`
//! - `parse_list()`: 저장된 응답용. 실패를 로그에 남기고 빈 배열 반환
//! - `lenient_*`: serde의 `deserialize_with`에 꽂아 쓰는 관대한 역직렬화 함수들

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

/// 배열이 와야 할 자리에 들어온 값을 정규 배열로 바꿉니다.
///
/// | 입력 | 결과 |
/// |------|------|
/// | 배열 | 그대로 |
/// | null | `[]` |
/// | `"[1,2]"` 같은 JSON 배열 문자열 | 파싱된 배열 |
/// | 파싱할 수 없는 문자열, 빈 문자열 | `[]` |
/// | 그 밖의 값 (숫자, 객체 등) | `[]` |
///
/// 결과가 항상 배열이므로 두 번 적용해도 한 번 적용한 것과 같습니다 (멱등성).
pub fn normalize_array(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// 옵션 항목 하나를 문자열 라벨로 바꿉니다.
///
/// 옵션은 `"A"`처럼 문자열일 수도, `{ "label": "A" }`처럼 객체일 수도 있습니다.
/// 두 표현은 같은 의미이므로, 사용하는 쪽은 어느 한쪽을 가정하면 안 됩니다.
pub fn option_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
    }
}

/// 저장된 응답의 배열 필드(이미지 URL, 파일, 체크박스 선택)를 해석합니다.
///
/// `normalize_array()`와 같은 규칙이지만, 해석에 실패하면 진단용 로그를 남깁니다.
/// 에러는 호출자에게 전파되지 않습니다 — 사용자에게는 "0개"로 보일 뿐입니다.
pub fn parse_list(value: Option<&Value>, what: &str) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(text)) if text.is_empty() => Vec::new(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items,
            Ok(other) => {
                tracing::warn!(field = what, value = %other, "stored answer is not a JSON array");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(field = what, raw = %text, error = %e, "failed to parse stored answer");
                Vec::new()
            }
        },
        Some(other) => {
            tracing::warn!(field = what, value = %other, "unexpected stored answer shape");
            Vec::new()
        }
    }
}

/// 배열 필드용 관대한 역직렬화 함수
///
/// `normalize_array()`로 정규화한 뒤 각 항목을 `T`로 변환합니다.
/// 변환할 수 없는 항목은 건너뜁니다.
///
/// 사용 예: `#[serde(default, deserialize_with = "lenient_list")]`
pub fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(normalize_array(&raw)
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// 문자열 필드용: null이면 빈 문자열
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// 불리언 필드용: null이면 false, 0/1과 "true"/"1"도 허용
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::Number(n) => n.as_i64().unwrap_or(0) != 0,
        Value::String(text) => matches!(text.as_str(), "true" | "1"),
        _ => false,
    })
}

/// 선택적 정수 ID용: 숫자 또는 숫자 문자열을 받고, null/빈 문자열은 None
pub fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

/// ID를 문자열로 통일: 숫자 ID와 문자열 ID를 같은 타입으로 다룹니다.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
