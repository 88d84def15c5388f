//! # 필드(Field) 모델 정의
//!
//! 폼 안의 질문 하나(또는 제목/섹션 같은 표시 전용 단위)를 나타냅니다.
//!
//! ## 식별자 두 개
//! - `uid`: 클라이언트(여기서는 이 서버)가 만든 안정적인 식별자. 저장 전에도 존재합니다.
//! - `id`: 외부 API가 저장할 때 부여하는 서버 ID. 처음 저장하기 전까지는 `None`.
//!
//! 외부 API는 옵션 목록을 JSON 문자열로 돌려주기도 하므로,
//! 배열 필드는 모두 `lenient_list`로 역직렬화합니다.

use serde::{Deserialize, Serialize};

use crate::services::normalize::{
    lenient_bool, lenient_id, lenient_list, lenient_opt_i64, lenient_string,
};

/// 필드 종류 — 닫힌 집합(closed set)입니다.
///
/// `#[serde(rename_all = "snake_case")]`: `ShortAnswer` ↔ `"short_answer"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Title,
    Section,
    ShortAnswer,
    Paragraph,
    MultipleChoice,
    Checkboxes,
    Dropdown,
    Date,
    Time,
    FileUpload,
    ImageUpload,
}

impl FieldType {
    /// 파일을 첨부받는 타입인지 여부
    pub fn is_upload(self) -> bool {
        matches!(self, FieldType::FileUpload | FieldType::ImageUpload)
    }

    /// 와이어 상의 이름 (`"short_answer"` 등)
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Title => "title",
            FieldType::Section => "section",
            FieldType::ShortAnswer => "short_answer",
            FieldType::Paragraph => "paragraph",
            FieldType::MultipleChoice => "multiple_choice",
            FieldType::Checkboxes => "checkboxes",
            FieldType::Dropdown => "dropdown",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::FileUpload => "file_upload",
            FieldType::ImageUpload => "image_upload",
        }
    }
}

/// 프론트엔드 타입 이름을 백엔드 타입 이름으로 바꿉니다.
///
/// 현재는 두 어휘가 같으므로 입력을 그대로 돌려줍니다.
/// 백엔드 계약이 바뀌기 전까지는 항등 함수로 유지합니다.
pub fn map_type_to_backend(field_type: FieldType) -> FieldType {
    field_type
}

/// 옵션 항목 — 문자열 `"A"` 또는 객체 `{ "label": "A" }`
///
/// `#[serde(untagged)]`: 태그 없이 모양만 보고 variant를 고릅니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionEntry {
    Text(String),
    Labeled {
        #[serde(default)]
        label: Option<String>,
    },
}

impl OptionEntry {
    /// 두 표현을 하나의 문자열 라벨로 통일합니다. 라벨이 없으면 빈 문자열.
    pub fn label(&self) -> &str {
        match self {
            OptionEntry::Text(text) => text,
            OptionEntry::Labeled { label } => label.as_deref().unwrap_or(""),
        }
    }
}

impl From<&str> for OptionEntry {
    fn from(text: &str) -> Self {
        OptionEntry::Text(text.to_string())
    }
}

/// 폼 작성자가 첨부한 참고 이미지 — 응답자에게 예시로 보여줍니다.
///
/// `url`은 "/uploads/filename.jpg" 같은 불투명한 경로 문자열이며,
/// 저장할 때 다시 인코딩하지 않고 그대로 넘깁니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminImage {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    pub url: String,
}

/// 질문 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// 폼 안에서 유일하며, 삭제된 뒤에도 재사용되지 않습니다.
    /// 외부 데이터에 uid가 없으면 새로 발급합니다.
    #[serde(default = "new_uid", deserialize_with = "uid_or_new")]
    pub uid: String,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub id: Option<i64>,
    /// `type`은 Rust 예약어이므로 필드 이름을 바꾸고 serde로 매핑합니다.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub required: bool,
    /// 입력 힌트. `section`에서는 섹션 본문으로 쓰입니다.
    #[serde(default, deserialize_with = "lenient_string")]
    pub placeholder: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ex_placeholder: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text_number: String,
    /// 업로드 필드 위에 보여주는 안내문
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub options: Vec<OptionEntry>,
    /// `image_upload`에 딸린 체크박스 질문의 옵션
    #[serde(default, deserialize_with = "lenient_list")]
    pub checkbox_options: Vec<OptionEntry>,
    /// `image_upload`에 딸린 단일 선택 질문
    #[serde(default, deserialize_with = "lenient_string")]
    pub choice_question: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub choice_options: Vec<OptionEntry>,
    /// 업로드 최대 개수. None(또는 0)이면 제한 없음, 저장할 때는 1로 채웁니다.
    #[serde(default, deserialize_with = "lenient_max_images")]
    pub max_images: Option<u32>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub image_only: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub enable_checkboxes: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub enable_multiple_choice: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub multiple_choice_label: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub multiple_choice_options: Vec<OptionEntry>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub image_options: Vec<OptionEntry>,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "adminImages", default, deserialize_with = "lenient_list")]
    pub admin_images: Vec<AdminImage>,
    #[serde(rename = "enableAdminImages", default, deserialize_with = "lenient_bool")]
    pub enable_admin_images: bool,
}

impl Field {
    /// 새 uid와 타입별 기본값을 가진 필드를 만듭니다. 네트워크는 쓰지 않습니다.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            uid: new_uid(),
            id: None,
            field_type,
            label: String::new(),
            required: false,
            placeholder: String::new(),
            ex_placeholder: String::new(),
            text_number: String::new(),
            content: String::new(),
            options: Vec::new(),
            checkbox_options: Vec::new(),
            choice_question: String::new(),
            choice_options: Vec::new(),
            // 업로드 타입은 기본 1장, 그 외에는 의미가 없으므로 비워 둡니다.
            max_images: field_type.is_upload().then_some(1),
            image_only: field_type == FieldType::ImageUpload,
            enable_checkboxes: false,
            enable_multiple_choice: false,
            multiple_choice_label: String::new(),
            multiple_choice_options: Vec::new(),
            image_options: Vec::new(),
            image_url: None,
            admin_images: Vec::new(),
            enable_admin_images: false,
        }
    }

    /// 옵션 라벨 목록 (문자열/객체 표현을 통일)
    pub fn option_labels(&self) -> Vec<String> {
        labels(&self.options)
    }

    /// 설정된 업로드 상한. 0은 "제한 없음"과 같습니다.
    pub fn upload_cap(&self) -> Option<usize> {
        self.max_images.filter(|n| *n > 0).map(|n| n as usize)
    }

    /// 응답자에게 보여줄 참고 이미지 — `enableAdminImages`가 꺼져 있으면 비어 있습니다.
    pub fn visible_admin_images(&self) -> &[AdminImage] {
        if self.enable_admin_images {
            &self.admin_images
        } else {
            &[]
        }
    }
}

/// 옵션 목록을 문자열 라벨 목록으로 바꿉니다.
pub fn labels(entries: &[OptionEntry]) -> Vec<String> {
    entries.iter().map(|o| o.label().to_string()).collect()
}

/// UUIDv7 기반의 새 uid
pub fn new_uid() -> String {
    uuid::Uuid::now_v7().to_string()
}

fn uid_or_new<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let uid = lenient_id(deserializer)?;
    Ok(if uid.is_empty() { new_uid() } else { uid })
}

fn lenient_max_images<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient_opt_i64(deserializer)?
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok()))
}
