//! # 폼(Form) 모델 정의
//!
//! - `FormSchema`: 순서가 있는 필드 목록 + 폼 메타데이터 (제목, 설명, 테마, 카테고리)
//! - `GeneralGroup`: 폼과 무관하게 공유되는 필드 묶음 (예: 두 사람의 정보). 항상 폼 필드보다 먼저 표시됩니다.
//! - `CategoryInfo`: 폼이 속한 무비 카테고리와 무비 이름
//! - `FormMetaPatch`: 빌더에서 메타데이터만 부분 수정할 때 쓰는 요청 본문

use serde::{Deserialize, Serialize};

use super::field::Field;
use crate::services::normalize::{lenient_bool, lenient_list, lenient_opt_i64, lenient_string};

/// 제목이 비어 있을 때 쓰는 기본 제목
pub const UNTITLED_FORM: &str = "無題のフォーム";

fn default_theme() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

/// 폼 스키마 — 폼 하나의 순서 있는 타입 정의
///
/// `fields`의 순서가 곧 표시 순서이며, 저장/불러오기를 거쳐도 보존됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    /// 저장 전에는 None
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default = "default_theme", deserialize_with = "lenient_string")]
    pub theme: String,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub fields: Vec<Field>,
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub allow_multiple_responses: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub require_email: bool,
}

impl Default for FormSchema {
    /// 새 폼의 초기 상태
    fn default() -> Self {
        Self {
            id: None,
            title: UNTITLED_FORM.to_string(),
            description: String::new(),
            theme: default_theme(),
            category_id: None,
            fields: Vec::new(),
            allow_multiple_responses: true,
            require_email: false,
        }
    }
}

impl FormSchema {
    /// uid로 필드를 찾습니다.
    pub fn field(&self, uid: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.uid == uid)
    }

    /// uid로 필드의 위치(인덱스)를 찾습니다.
    pub fn position(&self, uid: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.uid == uid)
    }
}

/// 공유 필드 그룹 (`GET general-field-groups`의 원소)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralGroup {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub fields: Vec<Field>,
}

/// 무비 카테고리 — 빌더의 카테고리 선택지와 같은 번호를 씁니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieCategory {
    Opening,
    Profile,
    EndRoll,
}

impl MovieCategory {
    /// 카테고리 번호 → 카테고리. 0(미선택)이나 알 수 없는 번호는 None.
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Opening),
            2 => Some(Self::Profile),
            3 => Some(Self::EndRoll),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Opening => "オープニングムービー",
            Self::Profile => "プロフィールムービー",
            Self::EndRoll => "エンドロール・レタームービーその他",
        }
    }
}

/// `GET category-metadata-by-form-id`의 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub category_id: Option<i64>,
    /// 무비 이름 (예: "ボタニカ")
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
}

impl CategoryInfo {
    pub fn category(&self) -> Option<MovieCategory> {
        self.category_id.and_then(MovieCategory::from_id)
    }

    /// 폼 상단에 보여줄 제목 — 예: `プロフィールムービー 「ボタニカ」`
    pub fn heading(&self) -> String {
        match self.category() {
            Some(category) => format!("{} 「{}」", category.display_name(), self.title),
            None => format!("「{}」", self.title),
        }
    }
}

/// 폼 메타데이터 부분 수정 — `PATCH /admin/drafts/{id}`의 요청 본문
///
/// 본문에 포함된 항목만 바뀝니다.
#[derive(Debug, Default, Deserialize)]
pub struct FormMetaPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub theme: Option<String>,
    /// `Some(None)`이면 카테고리 해제. 0도 "미선택"으로 취급합니다.
    #[serde(default, deserialize_with = "patch_category")]
    pub category_id: Option<Option<i64>>,
    pub allow_multiple_responses: Option<bool>,
    pub require_email: Option<bool>,
}

fn patch_category<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let id = lenient_opt_i64(deserializer)?;
    Ok(Some(id.filter(|id| *id != 0)))
}
