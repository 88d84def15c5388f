//! # 폼 렌더러 (Form Renderer)
//!
//! 저장된 폼 스키마와 공유 필드 그룹을 입력 컨트롤 목록으로 바꾸고,
//! 응답자 한 명의 채우기 세션(응답 맵)을 관리합니다.
//!
//! ## 채우기 세션 상태
//! ```text
//! Editing ──begin_submit()──→ Submitting ──finish_submit(Ok)──→ Succeeded
//!    ▲                            │                                  │
//!    └──── finish_submit(Err) ────┘                                  │
//!    └──────────────────────────── reset() ──────────────────────────┘
//! ```
//!
//! - 필수 항목이 비어 있으면 `Submitting`으로 넘어가지 않고, 응답 맵은 그대로 남습니다.
//! - 제출은 한 번에 하나만 진행됩니다 (`Submitting` 중 재요청은 `Conflict`).
//! - 성공하면 응답 맵을 비우고, 스테이징된 파일은 호출자가 해제(revoke)합니다.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::field_kind::{kind_of, render, RenderedField};
use super::uploads::UploadStore;
use crate::api::{ApiError, IntakeApi};
use crate::error::AppError;
use crate::models::{
    AnswerValue, CategoryInfo, Field, FieldType, FilePart, FormSchema, GeneralGroup, ResponseMap,
    SessionUser, StagedFile, Submission, SubmissionPayload, CHECKBOXES_SUFFIX, CHOICE_SUFFIX,
};

/// 응답자에게 보여줄 폼 — 폼 스키마 + 카테고리 + 공유 필드 그룹
#[derive(Debug, Clone)]
pub struct FillForm {
    pub share_id: String,
    pub form: FormSchema,
    pub category: CategoryInfo,
    pub general: Vec<GeneralGroup>,
}

/// 공유 필드 그룹 하나의 렌더링 결과
#[derive(Debug, Clone, Serialize)]
pub struct RenderedGroup {
    pub title: String,
    pub description: String,
    pub fields: Vec<RenderedField>,
}

/// 섹션 바로가기 목록의 항목
#[derive(Debug, Clone, Serialize)]
pub struct SectionLink {
    pub uid: String,
    pub label: String,
}

/// 폼 전체의 렌더링 결과. 공유 그룹이 항상 폼 필드보다 앞에 옵니다.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedForm {
    pub share_id: String,
    pub heading: String,
    pub title: String,
    pub description: String,
    pub theme: String,
    pub general: Vec<RenderedGroup>,
    pub sections: Vec<SectionLink>,
    pub fields: Vec<RenderedField>,
}

impl FillForm {
    /// 폼, 카테고리, 공유 그룹을 모두 불러옵니다. 하나라도 실패하면 폼을 열 수 없습니다.
    pub async fn load(api: &dyn IntakeApi, share_id: &str) -> Result<Self, AppError> {
        let not_found = |e: ApiError| e.with_fallback("Form not found");

        let form = api.form_by_share_id(share_id).await.map_err(not_found)?;
        let category = api.category_for_form(share_id).await.map_err(not_found)?;
        let general = api.general_groups().await.map_err(not_found)?;

        tracing::debug!(
            share_id,
            fields = form.fields.len(),
            groups = general.len(),
            "loaded form for filling"
        );

        Ok(Self {
            share_id: share_id.to_string(),
            form,
            category,
            general,
        })
    }

    /// uid로 필드를 찾습니다. 폼 필드를 먼저, 그다음 공유 그룹을 찾습니다.
    pub fn find_field(&self, uid: &str) -> Option<&Field> {
        self.form
            .field(uid)
            .or_else(|| self.general_fields().find(|f| f.uid == uid))
    }

    fn general_fields(&self) -> impl Iterator<Item = &Field> {
        self.general.iter().flat_map(|group| group.fields.iter())
    }

    /// 화면에 표시되는 순서 (공유 그룹 → 폼 필드)
    pub fn fields_in_display_order(&self) -> impl Iterator<Item = &Field> {
        self.general_fields().chain(self.form.fields.iter())
    }

    pub fn render(&self) -> RenderedForm {
        RenderedForm {
            share_id: self.share_id.clone(),
            heading: self.category.heading(),
            title: self.form.title.clone(),
            description: self.form.description.clone(),
            theme: self.form.theme.clone(),
            general: self
                .general
                .iter()
                .map(|group| RenderedGroup {
                    title: group.title.clone(),
                    description: group.description.clone(),
                    fields: group.fields.iter().map(render).collect(),
                })
                .collect(),
            sections: self
                .form
                .fields
                .iter()
                .filter(|f| f.field_type == FieldType::Section)
                .map(|f| SectionLink {
                    uid: f.uid.clone(),
                    label: f.label.clone(),
                })
                .collect(),
            fields: self.form.fields.iter().map(render).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    Editing,
    Submitting,
    Succeeded,
}

/// 채우기 세션의 현재 모습 — `GET /fill/{id}`의 응답
#[derive(Debug, Clone, Serialize)]
pub struct FillSnapshot {
    pub id: Uuid,
    pub status: FillStatus,
    pub error: Option<String>,
    pub responses: ResponseMap,
    pub form: RenderedForm,
}

#[derive(Debug)]
pub struct FillSession {
    id: Uuid,
    form: FillForm,
    responses: ResponseMap,
    status: FillStatus,
    error: Option<String>,
}

impl FillSession {
    pub fn new(form: FillForm) -> Self {
        Self {
            id: Uuid::now_v7(),
            form,
            responses: ResponseMap::new(),
            status: FillStatus::Editing,
            error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn form(&self) -> &FillForm {
        &self.form
    }

    pub fn responses(&self) -> &ResponseMap {
        &self.responses
    }

    pub fn status(&self) -> FillStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn ensure_editing(&self) -> Result<(), AppError> {
        match self.status {
            FillStatus::Editing => Ok(()),
            FillStatus::Submitting => Err(AppError::Conflict("submission in progress".into())),
            FillStatus::Succeeded => Err(AppError::Conflict("form already submitted".into())),
        }
    }

    /// 텍스트/선택 응답을 기록합니다. `None`이면 지웁니다.
    ///
    /// `key`는 필드 uid이거나, 이미지 업로드 필드의 하위 응답 키
    /// (`<uid>_checkboxes`, `<uid>_choice`)입니다.
    /// 업로드 필드의 파일은 이 경로로 받지 않습니다.
    pub fn set_answer(&mut self, key: &str, value: Option<AnswerValue>) -> Result<(), AppError> {
        self.ensure_editing()?;

        match self.form.find_field(key) {
            Some(field) if !kind_of(field.field_type).accepts_input() => {
                return Err(AppError::BadRequest(format!("field {key} does not take answers")));
            }
            Some(field) if field.field_type.is_upload() => {
                return Err(AppError::BadRequest(format!("field {key} takes file uploads")));
            }
            Some(_) => {}
            None if self.is_sub_answer_key(key) => {}
            None => return Err(AppError::NotFound),
        }

        match value {
            Some(value) => {
                self.responses.insert(key.to_string(), value);
            }
            None => {
                self.responses.remove(key);
            }
        }
        Ok(())
    }

    fn is_sub_answer_key(&self, key: &str) -> bool {
        [CHECKBOXES_SUFFIX, CHOICE_SUFFIX].iter().any(|suffix| {
            key.strip_suffix(suffix)
                .and_then(|parent| self.form.find_field(parent))
                .is_some_and(|parent| parent.field_type == FieldType::ImageUpload)
        })
    }

    fn upload_field(&self, uid: &str) -> Result<&Field, AppError> {
        let field = self.form.find_field(uid).ok_or(AppError::NotFound)?;
        if !field.field_type.is_upload() {
            return Err(AppError::BadRequest(format!("field {uid} does not accept files")));
        }
        Ok(field)
    }

    /// 새로 고른 파일을 기존 선택 뒤에 붙이고, 상한을 넘는 꼬리는 잘라냅니다.
    ///
    /// 잘려 나간 파일을 돌려주므로 호출자가 해제해야 합니다.
    pub fn attach_files(&mut self, uid: &str, files: Vec<StagedFile>) -> Result<Vec<StagedFile>, AppError> {
        self.ensure_editing()?;
        let cap = self.upload_field(uid)?.upload_cap();

        let mut combined = match self.responses.remove(uid) {
            Some(AnswerValue::Files(existing)) => existing,
            _ => Vec::new(),
        };
        combined.extend(files);

        let dropped = match cap {
            Some(max) if combined.len() > max => combined.split_off(max),
            _ => Vec::new(),
        };
        if !dropped.is_empty() {
            tracing::debug!(uid, kept = combined.len(), dropped = dropped.len(), "upload cap reached");
        }

        if !combined.is_empty() {
            self.responses.insert(uid.to_string(), AnswerValue::Files(combined));
        }
        Ok(dropped)
    }

    /// 선택한 파일 하나를 뺍니다. 뺀 파일은 호출자가 해제해야 합니다.
    pub fn remove_file(&mut self, uid: &str, index: usize) -> Result<StagedFile, AppError> {
        self.ensure_editing()?;
        self.upload_field(uid)?;

        let Some(AnswerValue::Files(files)) = self.responses.get_mut(uid) else {
            return Err(AppError::NotFound);
        };
        if index >= files.len() {
            return Err(AppError::NotFound);
        }
        let removed = files.remove(index);
        if files.is_empty() {
            self.responses.remove(uid);
        }
        Ok(removed)
    }

    /// 비어 있는 필수 항목의 라벨 (표시 순서)
    pub fn missing_required(&self) -> Vec<String> {
        self.form
            .fields_in_display_order()
            .filter(|field| field.required)
            .filter(|field| kind_of(field.field_type).is_missing(self.responses.get(&field.uid)))
            .map(|field| field.label.clone())
            .collect()
    }

    /// 제출을 시작합니다.
    ///
    /// 필수 항목이 비어 있으면 에러 메시지를 세션에 남기고 `Validation`으로 거절합니다.
    pub fn begin_submit(&mut self) -> Result<(), AppError> {
        self.ensure_editing()?;

        let missing = self.missing_required();
        if !missing.is_empty() {
            let err = AppError::Validation { missing };
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.status = FillStatus::Submitting;
        self.error = None;
        Ok(())
    }

    /// 응답 맵을 제출 한 건으로 인코딩합니다.
    ///
    /// 빈 응답과 하위 응답 키는 독립 항목이 되지 않으며,
    /// 어느 필드에도 해당하지 않는 키는 무시됩니다.
    pub fn build_submission(&self, now: DateTime<Utc>, submitter: Option<SessionUser>) -> Submission {
        let mut answers = Vec::new();
        let mut attachments = Vec::new();

        for field in self.form.fields_in_display_order() {
            let Some(value) = self.responses.get(&field.uid) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            if let Some(entry) =
                kind_of(field.field_type).encode(field, value, &self.responses, &mut attachments)
            {
                answers.push(entry);
            }
        }

        Submission {
            form_id: self.form.share_id.clone(),
            submitted_at: now,
            answers,
            attachments,
            submitter,
        }
    }

    /// 제출 결과를 반영합니다.
    ///
    /// 성공: 응답 맵을 비우고 `Succeeded`로. 해제할 스테이징 파일을 돌려줍니다.
    /// 실패: 응답 맵은 그대로, 에러 메시지를 남기고 `Editing`으로.
    pub fn finish_submit(&mut self, result: Result<Value, ApiError>) -> Result<Vec<StagedFile>, AppError> {
        match result {
            Ok(_) => {
                let files = self.staged_files();
                self.responses.clear();
                self.status = FillStatus::Succeeded;
                self.error = None;
                Ok(files)
            }
            Err(e) => {
                let e = e.with_fallback("Failed to submit form");
                self.status = FillStatus::Editing;
                self.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// 외부 API에 닿기 전에 실패한 제출을 되돌립니다 (예: 스테이징 파일 읽기 실패).
    pub fn abort_submit(&mut self, err: &AppError) {
        if self.status == FillStatus::Submitting {
            self.status = FillStatus::Editing;
            self.error = Some(err.to_string());
        }
    }

    /// 처음부터 다시 답합니다 ("もう一度回答する").
    ///
    /// 남아 있던 스테이징 파일을 돌려주므로 호출자가 해제해야 합니다.
    pub fn reset(&mut self) -> Result<Vec<StagedFile>, AppError> {
        if self.status == FillStatus::Submitting {
            return Err(AppError::Conflict("submission in progress".into()));
        }
        let files = self.staged_files();
        self.responses.clear();
        self.status = FillStatus::Editing;
        self.error = None;
        Ok(files)
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// 응답 맵에 들어 있는 모든 스테이징 파일
    pub fn staged_files(&self) -> Vec<StagedFile> {
        self.responses
            .values()
            .filter_map(|value| match value {
                AnswerValue::Files(files) => Some(files.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn snapshot(&self) -> FillSnapshot {
        FillSnapshot {
            id: self.id,
            status: self.status,
            error: self.error.clone(),
            responses: self.responses.clone(),
            form: self.form.render(),
        }
    }
}

/// 제출 한 건을 multipart 페이로드로 만듭니다. 첨부 파일은 스테이징 디렉토리에서 읽습니다.
pub async fn build_payload(
    submission: &Submission,
    uploads: &UploadStore,
) -> Result<SubmissionPayload, AppError> {
    let text_parts = submission
        .text_parts()
        .map_err(|e| AppError::Internal(format!("failed to encode answers: {e}")))?;

    let mut file_parts = Vec::with_capacity(submission.attachments.len());
    for attachment in &submission.attachments {
        file_parts.push(FilePart {
            key: attachment.key.clone(),
            file_name: attachment.file.name.clone(),
            content_type: attachment.file.content_type.clone(),
            bytes: uploads.read(&attachment.file).await?,
        });
    }

    Ok(SubmissionPayload {
        text_parts,
        file_parts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryIntakeApi;
    use crate::models::{AnswerText, OptionEntry};

    fn field(uid: &str, ty: FieldType, label: &str, required: bool) -> Field {
        let mut field = Field::new(ty);
        field.uid = uid.to_string();
        field.label = label.to_string();
        field.required = required;
        field
    }

    fn fill_form(fields: Vec<Field>, general: Vec<Field>) -> FillForm {
        FillForm {
            share_id: "12".into(),
            form: FormSchema {
                id: Some(12),
                fields,
                ..FormSchema::default()
            },
            category: CategoryInfo {
                category_id: Some(2),
                title: "ボタニカ".into(),
            },
            general: vec![GeneralGroup {
                id: Some(1),
                title: "おふたりの情報".into(),
                description: String::new(),
                fields: general,
            }],
        }
    }

    fn staged(name: &str) -> StagedFile {
        StagedFile {
            name: name.into(),
            content_type: "image/jpeg".into(),
            size: 3,
            stored_path: format!("fill/{name}"),
            preview_url: format!("/previews/fill/{name}"),
        }
    }

    fn text(value: &str) -> Option<AnswerValue> {
        Some(AnswerValue::Text(value.into()))
    }

    #[test]
    fn required_field_blocks_until_filled() {
        let mut session = FillSession::new(fill_form(
            vec![
                field("t", FieldType::Title, "はじめに", true),
                field("name", FieldType::ShortAnswer, "新郎のお名前", true),
                field("memo", FieldType::Paragraph, "備考", false),
            ],
            vec![],
        ));
        session.set_answer("name", text("   ")).unwrap();

        let err = session.begin_submit().unwrap_err();
        assert!(matches!(err, AppError::Validation { ref missing } if missing == &vec!["新郎のお名前".to_string()]));
        assert_eq!(session.error(), Some("Please fill in required fields: 新郎のお名前"));
        assert_eq!(session.status(), FillStatus::Editing);
        assert_eq!(session.responses().len(), 1);

        session.set_answer("name", text("太郎")).unwrap();
        session.begin_submit().unwrap();
        assert_eq!(session.status(), FillStatus::Submitting);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn general_group_fields_are_validated_first() {
        let session = FillSession::new(fill_form(
            vec![field("date", FieldType::Date, "挙式日", true)],
            vec![field("bride", FieldType::ShortAnswer, "新婦のお名前", true)],
        ));
        assert_eq!(session.missing_required(), vec!["新婦のお名前", "挙式日"]);
    }

    #[test]
    fn checkbox_selections_encode_exactly() {
        let mut checks = field("c", FieldType::Checkboxes, "演出", false);
        checks.options = vec!["A".into(), "B".into(), "C".into()];
        let mut session = FillSession::new(fill_form(vec![checks], vec![]));
        session
            .set_answer("c", Some(AnswerValue::Selections(vec!["A".into(), "C".into()])))
            .unwrap();

        let submission = session.build_submission(Utc::now(), None);
        assert_eq!(submission.answers.len(), 1);
        let entry = &submission.answers[0];
        assert_eq!(entry.field_type, FieldType::Checkboxes);
        assert_eq!(entry.text, Some(AnswerText::Many(vec!["A".into(), "C".into()])));
    }

    #[test]
    fn upload_cap_keeps_first_files_in_selection_order() {
        let mut photos = field("p", FieldType::ImageUpload, "写真", false);
        photos.max_images = Some(2);
        let mut session = FillSession::new(fill_form(vec![photos], vec![]));

        let mut dropped = Vec::new();
        for name in ["1.jpg", "2.jpg", "3.jpg"] {
            dropped.extend(session.attach_files("p", vec![staged(name)]).unwrap());
        }

        let Some(AnswerValue::Files(kept)) = session.responses().get("p") else {
            panic!("expected files");
        };
        let names: Vec<_> = kept.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["1.jpg", "2.jpg"]);
        assert_eq!(dropped, vec![staged("3.jpg")]);
    }

    #[test]
    fn remove_file_returns_it_for_revocation() {
        let mut session = FillSession::new(fill_form(
            vec![field("f", FieldType::FileUpload, "資料", true)],
            vec![],
        ));
        session.attach_files("f", vec![staged("a.pdf")]).unwrap();
        assert_eq!(session.remove_file("f", 0).unwrap().name, "a.pdf");
        assert!(session.responses().get("f").is_none());
        assert!(session.remove_file("f", 0).is_err());
        assert!(matches!(session.begin_submit(), Err(AppError::Validation { .. })));
    }

    #[test]
    fn answers_are_checked_against_known_fields() {
        let mut photo = field("img", FieldType::ImageUpload, "写真", false);
        photo.checkbox_options = vec![OptionEntry::from("白黒")];
        let mut session = FillSession::new(fill_form(
            vec![photo, field("t", FieldType::Title, "見出し", false)],
            vec![],
        ));

        assert!(matches!(session.set_answer("ghost", text("x")), Err(AppError::NotFound)));
        assert!(matches!(session.set_answer("img", text("x")), Err(AppError::BadRequest(_))));
        assert!(matches!(session.set_answer("t", text("x")), Err(AppError::BadRequest(_))));
        session
            .set_answer("img_checkboxes", Some(AnswerValue::Selections(vec!["白黒".into()])))
            .unwrap();
        assert!(matches!(session.set_answer("t_choice", text("x")), Err(AppError::NotFound)));
    }

    #[test]
    fn sub_answers_fold_into_parent_and_orphans_are_skipped() {
        let mut photo = field("img", FieldType::ImageUpload, "写真", false);
        photo.checkbox_options = vec![OptionEntry::from("白黒")];
        let mut session = FillSession::new(fill_form(
            vec![photo, field("name", FieldType::ShortAnswer, "名前", false)],
            vec![],
        ));
        session.attach_files("img", vec![staged("a.jpg")]).unwrap();
        session
            .set_answer("img_checkboxes", Some(AnswerValue::Selections(vec!["白黒".into()])))
            .unwrap();
        session.set_answer("name", text("")).unwrap();

        let submission = session.build_submission(Utc::now(), None);
        assert_eq!(submission.answers.len(), 1);
        assert_eq!(submission.answers[0].field_uid, "img");
        assert_eq!(
            submission.answers[0].checkbox_selections,
            Some(vec!["白黒".to_string()])
        );
        assert_eq!(submission.attachments[0].key, "image_img_0");
    }

    #[test]
    fn failed_submit_keeps_responses_and_success_clears_them() {
        let mut session = FillSession::new(fill_form(
            vec![
                field("name", FieldType::ShortAnswer, "名前", true),
                field("p", FieldType::ImageUpload, "写真", false),
            ],
            vec![],
        ));
        session.set_answer("name", text("花子")).unwrap();
        session.attach_files("p", vec![staged("a.jpg")]).unwrap();

        session.begin_submit().unwrap();
        assert!(matches!(session.begin_submit(), Err(AppError::Conflict(_))));
        let err = session
            .finish_submit(Err(ApiError::Status {
                status: 500,
                message: String::new(),
            }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to submit form");
        assert_eq!(session.error(), Some("Failed to submit form"));
        assert_eq!(session.status(), FillStatus::Editing);
        assert_eq!(session.responses().len(), 2);

        session.dismiss_error();
        session.begin_submit().unwrap();
        let released = session.finish_submit(Ok(Value::Null)).unwrap();
        assert_eq!(released, vec![staged("a.jpg")]);
        assert!(session.responses().is_empty());
        assert_eq!(session.status(), FillStatus::Succeeded);
        assert!(matches!(session.set_answer("name", text("x")), Err(AppError::Conflict(_))));

        session.reset().unwrap();
        assert_eq!(session.status(), FillStatus::Editing);
    }

    #[test]
    fn render_puts_general_groups_first_with_heading() {
        let form = fill_form(
            vec![
                field("s", FieldType::Section, "新郎パート", false),
                field("d", FieldType::Date, "挙式日", true),
            ],
            vec![field("g", FieldType::ShortAnswer, "新婦のお名前", true)],
        );
        let rendered = form.render();
        assert_eq!(rendered.heading, "プロフィールムービー 「ボタニカ」");
        assert_eq!(rendered.general[0].fields[0].uid, "g");
        assert_eq!(rendered.fields.len(), 2);
        assert_eq!(rendered.sections.len(), 1);
        assert_eq!(rendered.sections[0].label, "新郎パート");
        assert_eq!(form.find_field("g").unwrap().label, "新婦のお名前");
    }

    #[tokio::test]
    async fn load_requires_form_category_and_groups() {
        let api = InMemoryIntakeApi::new();
        let id = api
            .seed_form(FormSchema {
                fields: vec![field("d", FieldType::Date, "挙式日", true)],
                ..FormSchema::default()
            })
            .await;
        api.seed_category(id, CategoryInfo { category_id: Some(1), title: "ボタニカ".into() })
            .await;
        api.seed_general(vec![GeneralGroup {
            id: Some(1),
            title: "おふたりの情報".into(),
            description: String::new(),
            fields: vec![field("g", FieldType::ShortAnswer, "新郎のお名前", true)],
        }])
        .await;

        let loaded = FillForm::load(&api, &id.to_string()).await.unwrap();
        assert_eq!(loaded.form.fields.len(), 1);
        let order: Vec<_> = loaded.fields_in_display_order().map(|f| f.uid.as_str()).collect();
        assert_eq!(order, ["g", "d"]);
        assert_eq!(loaded.render().heading, "オープニングムービー 「ボタニカ」");

        let missing = FillForm::load(&api, "999").await.unwrap_err();
        assert_eq!(missing.to_string(), "Form not found");
    }

    #[tokio::test]
    async fn payload_reads_staged_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadStore::new(dir.path());
        let mut session = FillSession::new(fill_form(
            vec![field("f", FieldType::FileUpload, "資料", false)],
            vec![],
        ));
        let file = uploads
            .stage(session.id(), "plan.pdf", "application/pdf", b"%PDF")
            .await
            .unwrap();
        session.attach_files("f", vec![file]).unwrap();

        let submission = session.build_submission(Utc::now(), None);
        let payload = build_payload(&submission, &uploads).await.unwrap();
        assert_eq!(payload.text("formId"), Some("12"));
        assert_eq!(payload.file_parts[0].key, "file_f_0");
        assert_eq!(payload.file_parts[0].bytes, b"%PDF");
        assert!(payload.text("answers").unwrap().contains("\"fileKey\":\"file_f_0\""));
    }
}
