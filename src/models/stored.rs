//! # 저장된 응답(Stored Response) 읽기 모델
//!
//! 외부 API가 소유하고 저장하는 제출 기록입니다. 이 서버는 읽기만 합니다.
//!
//! 배열이어야 할 필드(`imageUrls`, `files`, `checkboxSelections`)는
//! 네이티브 배열 또는 JSON 문자열로 올 수 있으므로 `Value` 그대로 받아 두고,
//! 해석은 응답 뷰어(`services::viewer`)가 맡습니다.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::normalize::{lenient_id, lenient_list};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Respondent {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormRef {
    pub title: Option<String>,
}

/// 저장된 답변 하나
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnswer {
    /// 질문 텍스트
    pub question: Option<String>,
    /// 보통 문자열이지만 다른 JSON 값일 수도 있습니다.
    pub answer_text: Option<Value>,
    pub image_urls: Option<Value>,
    pub files: Option<Value>,
    pub checkbox_selections: Option<Value>,
    pub multiple_choice_selection: Option<String>,
    pub image_responses: Option<Value>,
}

/// 제출 기록 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResponse {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub respondent: Option<Respondent>,
    #[serde(default)]
    pub form: Option<FormRef>,
    /// null이나 JSON 문자열로 와도 목록 전체를 버리지 않습니다.
    #[serde(default, deserialize_with = "lenient_list")]
    pub answers: Vec<StoredAnswer>,
}
