//! # 응답(Response) 모델 정의
//!
//! 응답자가 폼을 채우는 동안의 상태와, 제출할 때 만들어지는 와이어 페이로드를 정의합니다.
//!
//! ## 흐름
//! ```text
//! ResponseMap (채우는 중, 메모리에만 존재)
//!     │  검증 통과 후 한 번만 변환
//!     ▼
//! Submission (불변) ──→ SubmissionPayload (multipart 텍스트 파트 + 파일 파트) ──→ 외부 API
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{field::FieldType, user::SessionUser};

/// `image_upload` 필드에 딸린 체크박스 하위 응답의 키 접미사
pub const CHECKBOXES_SUFFIX: &str = "_checkboxes";
/// `image_upload` 필드에 딸린 단일 선택 하위 응답의 키 접미사
pub const CHOICE_SUFFIX: &str = "_choice";

/// 제출 전까지 스테이징 디렉토리에 보관되는 업로드 파일 하나
///
/// 브라우저의 미리보기 object URL에 해당합니다.
/// `preview_url`은 파일이 삭제(revoke)되면 더 이상 열리지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedFile {
    /// 응답자가 올린 원래 파일명
    pub name: String,
    pub content_type: String,
    pub size: u64,
    /// 스테이징 루트 기준 상대 경로 (예: "<fill_id>/<uuid>-photo.jpg")
    #[serde(skip)]
    pub stored_path: String,
    pub preview_url: String,
}

/// 응답 맵의 값 — 필드 타입에 따라 모양이 다릅니다.
///
/// - 텍스트/날짜/시간/드롭다운/단일 선택: 문자열
/// - 체크박스: 문자열 목록
/// - 파일/이미지 업로드: 스테이징된 파일 목록
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Selections(Vec<String>),
    Files(Vec<StagedFile>),
}

impl AnswerValue {
    /// "비어 있음" 판정: 공백뿐인 문자열, 원소가 없는 목록
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.trim().is_empty(),
            AnswerValue::Selections(items) => items.is_empty(),
            AnswerValue::Files(files) => files.is_empty(),
        }
    }
}

/// 값이 없거나(None) 비어 있으면 "누락"입니다.
pub fn answer_is_missing(value: Option<&AnswerValue>) -> bool {
    value.map_or(true, AnswerValue::is_empty)
}

/// 응답자 입력 — `PUT /fill/{id}/answers/{key}`의 요청 본문 `value`
///
/// 파일은 이 경로로 받지 않습니다 (multipart 업로드 전용).
/// null이면 해당 키의 응답을 지웁니다.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AnswerInput {
    Text(String),
    Selections(Vec<String>),
}

impl From<AnswerInput> for AnswerValue {
    fn from(input: AnswerInput) -> Self {
        match input {
            AnswerInput::Text(text) => AnswerValue::Text(text),
            AnswerInput::Selections(items) => AnswerValue::Selections(items),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetAnswerRequest {
    pub value: Option<AnswerInput>,
}

/// 응답 맵 — 필드 uid (또는 `uid_checkboxes` / `uid_choice`) → 값
///
/// 한 번의 채우기 세션 동안만 존재하며 직접 저장되지 않습니다.
pub type ResponseMap = BTreeMap<String, AnswerValue>;

/// 첨부 파일 하나의 메타데이터 — answers JSON 안에 들어갑니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
    /// multipart에서 실제 파일 파트의 이름 (예: "image_<uid>_0")
    #[serde(rename = "fileKey")]
    pub file_key: String,
}

/// 답변 텍스트 — 단일 문자열 또는 문자열 목록(체크박스)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerText {
    Single(String),
    Many(Vec<String>),
}

/// answers JSON 배열의 원소 하나
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub question_id: String,
    pub field_uid: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<AnswerText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Vec<FileMeta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<Vec<FileMeta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkbox_selections: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_choice_selection: Option<String>,
}

impl AnswerEntry {
    /// 답변 내용 없이 식별 정보만 채운 항목
    pub fn bare(field_uid: &str, field_type: FieldType) -> Self {
        Self {
            question_id: field_uid.to_string(),
            field_uid: field_uid.to_string(),
            field_type,
            text: None,
            image_data: None,
            file_data: None,
            checkbox_selections: None,
            multiple_choice_selection: None,
        }
    }
}

/// multipart에 붙일 파일 — 키와 스테이징된 파일의 짝
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub key: String,
    pub file: StagedFile,
}

/// 제출 한 건 — 제출 시점에 한 번 만들어지고 이후 바뀌지 않습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub form_id: String,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<AnswerEntry>,
    pub attachments: Vec<Attachment>,
    /// 로그인한 사용자가 제출한 경우에만 Some
    pub submitter: Option<SessionUser>,
}

impl Submission {
    /// multipart의 텍스트 파트들을 만듭니다.
    ///
    /// - `answers`: 답변 목록 JSON 문자열
    /// - `formId`, `submissionTimestamp` (ISO-8601)
    /// - 로그인한 경우 `userId`, `userName`, `userEmail`, `userRole`
    pub fn text_parts(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        let mut parts = vec![
            ("answers".to_string(), serde_json::to_string(&self.answers)?),
            ("formId".to_string(), self.form_id.clone()),
            (
                "submissionTimestamp".to_string(),
                self.submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        ];
        if let Some(user) = &self.submitter {
            parts.push(("userId".to_string(), user.id.clone()));
            parts.push(("userName".to_string(), user.name.clone()));
            parts.push(("userEmail".to_string(), user.email.clone()));
            parts.push(("userRole".to_string(), user.role.clone()));
        }
        Ok(parts)
    }
}

/// multipart 파일 파트 하나 (바이트까지 읽어 들인 상태)
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub key: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 외부 API로 보내는 multipart 페이로드 전체
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPayload {
    pub text_parts: Vec<(String, String)>,
    pub file_parts: Vec<FilePart>,
}

impl SubmissionPayload {
    /// 텍스트 파트 값 조회 (테스트와 로그에서 사용)
    pub fn text(&self, key: &str) -> Option<&str> {
        self.text_parts
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
