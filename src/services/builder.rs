//! # 폼 빌더 (Form Builder)
//!
//! 관리자가 편집 중인 폼 스키마를 메모리에 들고 있는 상태 기계입니다.
//!
//! - 필드 추가/수정/삭제/이동/복제는 전부 로컬에서만 일어납니다 (네트워크 호출 없음).
//! - 저장(`save`)만 외부 API를 호출하며, 실패해도 메모리의 스키마는 그대로 남습니다.
//! - 저장이 진행 중이면 두 번째 저장 요청은 `Conflict`로 거절합니다.
//!
//! ```text
//! begin_save()  → saving = true, 저장용 페이로드 스냅샷 반환
//!      │            (락을 놓고 외부 API 호출)
//! finish_save() → saving = false, 성공이면 서버가 준 id만 반영
//! ```

use serde_json::{Map, Value};

use crate::api::{ApiError, IntakeApi};
use crate::error::AppError;
use crate::models::{
    map_type_to_backend, new_uid, Field, FieldType, FormMetaPatch, FormSchema, OptionEntry,
    UNTITLED_FORM,
};

/// 라벨이 비어 있는 필드를 저장할 때 쓰는 기본 라벨
pub const UNTITLED_QUESTION: &str = "無題の質問";

/// `{label}` 객체를 라벨 문자열로 바꿉니다. 라벨이 없으면 빈 문자열.
fn flatten_labels(options: &mut [OptionEntry]) {
    for option in options.iter_mut() {
        if let OptionEntry::Labeled { .. } = option {
            *option = OptionEntry::Text(option.label().to_string());
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormBuilder {
    form: FormSchema,
    saving: bool,
}

impl Default for FormBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FormBuilder {
    /// 빈 새 폼으로 시작합니다.
    pub fn new() -> Self {
        Self::from_form(FormSchema::default())
    }

    /// 기존 폼을 편집합니다.
    pub fn from_form(form: FormSchema) -> Self {
        Self {
            form,
            saving: false,
        }
    }

    pub fn form(&self) -> &FormSchema {
        &self.form
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// 새 필드를 맨 뒤에 추가하고 그 필드를 돌려줍니다.
    pub fn add_field(&mut self, field_type: FieldType) -> &Field {
        self.form.fields.push(Field::new(field_type));
        let last = self.form.fields.len() - 1;
        &self.form.fields[last]
    }

    /// `patch`의 키들을 필드에 덮어씁니다. `uid`는 바꿀 수 없습니다.
    ///
    /// 해당 uid가 없으면 아무 일도 하지 않고 `Ok(false)`를 돌려줍니다.
    /// 병합 결과가 유효한 필드가 아니면 (예: 알 수 없는 `type`) 원래 필드를 유지하고 에러를 냅니다.
    pub fn update_field(&mut self, uid: &str, patch: &Map<String, Value>) -> Result<bool, AppError> {
        let Some(idx) = self.form.position(uid) else {
            return Ok(false);
        };

        let mut merged = match serde_json::to_value(&self.form.fields[idx]) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(AppError::Internal("field did not serialize to an object".into())),
            Err(e) => return Err(AppError::Internal(e.to_string())),
        };
        for (key, value) in patch {
            if key == "uid" {
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }

        let updated: Field = serde_json::from_value(Value::Object(merged))
            .map_err(|e| AppError::BadRequest(format!("invalid field patch: {e}")))?;
        self.form.fields[idx] = updated;
        Ok(true)
    }

    /// 제목/설명/테마/카테고리 등 폼 메타데이터를 수정합니다.
    pub fn update_meta(&mut self, patch: FormMetaPatch) {
        if let Some(title) = patch.title {
            self.form.title = title;
        }
        if let Some(description) = patch.description {
            self.form.description = description;
        }
        if let Some(theme) = patch.theme {
            self.form.theme = theme;
        }
        if let Some(category_id) = patch.category_id {
            self.form.category_id = category_id;
        }
        if let Some(allow) = patch.allow_multiple_responses {
            self.form.allow_multiple_responses = allow;
        }
        if let Some(require) = patch.require_email {
            self.form.require_email = require;
        }
    }

    /// 필드를 삭제합니다. 나머지 필드의 순서는 그대로입니다.
    pub fn remove_field(&mut self, uid: &str) -> Option<Field> {
        let idx = self.form.position(uid)?;
        Some(self.form.fields.remove(idx))
    }

    /// 필드를 `offset`만큼 옮깁니다 (음수면 위로).
    ///
    /// 목표 위치가 범위를 벗어나면 아무 일도 하지 않고 `false`를 돌려줍니다.
    pub fn move_field(&mut self, uid: &str, offset: isize) -> bool {
        let Some(idx) = self.form.position(uid) else {
            return false;
        };
        let Some(target) = idx.checked_add_signed(offset) else {
            return false;
        };
        if target >= self.form.fields.len() || target == idx {
            return false;
        }
        let field = self.form.fields.remove(idx);
        self.form.fields.insert(target, field);
        true
    }

    /// 필드를 복제해 맨 뒤에 붙입니다. 복제본은 새 uid를 받고 `id`는 비웁니다.
    ///
    /// `clone()`은 깊은 복사이므로 이후 어느 쪽을 고쳐도 다른 쪽에 영향이 없습니다.
    pub fn duplicate_field(&mut self, uid: &str) -> Option<&Field> {
        let mut copy = self.form.field(uid)?.clone();
        copy.uid = new_uid();
        copy.id = None;
        self.form.fields.push(copy);
        self.form.fields.last()
    }

    /// 외부 API에 보낼 저장용 스키마를 만듭니다. 메모리의 스키마는 바꾸지 않습니다.
    ///
    /// - 빈 제목 → `無題のフォーム`, 빈 라벨 → `無題の質問`, 빈 테마 → `default`
    /// - 업로드 상한이 없으면 1
    /// - 타입 이름은 `map_type_to_backend()`를 거칩니다
    /// - 선택지는 `{label}` 객체든 문자열이든 모두 문자열 라벨로 보냅니다
    /// - 참고 이미지 URL은 손대지 않고 그대로 넘깁니다
    pub fn save_payload(&self) -> FormSchema {
        let mut payload = self.form.clone();
        if payload.title.trim().is_empty() {
            payload.title = UNTITLED_FORM.to_string();
        }
        if payload.theme.trim().is_empty() {
            payload.theme = "default".to_string();
        }
        for field in &mut payload.fields {
            if field.label.trim().is_empty() {
                field.label = UNTITLED_QUESTION.to_string();
            }
            if field.max_images.is_none() {
                field.max_images = Some(1);
            }
            field.field_type = map_type_to_backend(field.field_type);
            for options in [
                &mut field.options,
                &mut field.checkbox_options,
                &mut field.choice_options,
                &mut field.multiple_choice_options,
                &mut field.image_options,
            ] {
                flatten_labels(options);
            }
        }
        payload
    }

    /// 저장을 시작합니다. 이미 저장 중이면 거절합니다.
    pub fn begin_save(&mut self) -> Result<FormSchema, AppError> {
        if self.saving {
            return Err(AppError::Conflict("save already in progress".into()));
        }
        self.saving = true;
        Ok(self.save_payload())
    }

    /// 저장 결과를 반영합니다.
    ///
    /// 성공하면 서버가 부여한 폼 id와 필드 id만 받아들입니다 (필드는 uid로 짝지음).
    /// 저장을 기다리는 동안 관리자가 고친 내용은 그대로 남습니다.
    /// 실패하면 스키마는 그대로 두고 에러만 돌려줍니다.
    pub fn finish_save(&mut self, result: Result<FormSchema, ApiError>) -> Result<&FormSchema, AppError> {
        self.saving = false;
        let saved = result?;

        if saved.id.is_some() {
            self.form.id = saved.id;
        }
        for field in &mut self.form.fields {
            if let Some(id) = saved.field(&field.uid).and_then(|f| f.id) {
                field.id = Some(id);
            }
        }
        Ok(&self.form)
    }

    /// 저장 전체를 한 번에 수행합니다.
    pub async fn save(&mut self, api: &dyn IntakeApi, token: &str) -> Result<&FormSchema, AppError> {
        let payload = self.begin_save()?;
        let result = api.save_form(&payload, token).await;
        self.finish_save(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryIntakeApi;
    use crate::models::{AdminImage, SessionUser, ADMIN_ROLE};
    use serde_json::json;

    fn builder_with(types: &[FieldType]) -> (FormBuilder, Vec<String>) {
        let mut builder = FormBuilder::new();
        let uids = types
            .iter()
            .map(|ty| builder.add_field(*ty).uid.clone())
            .collect();
        (builder, uids)
    }

    fn order(builder: &FormBuilder) -> Vec<String> {
        builder.form().fields.iter().map(|f| f.uid.clone()).collect()
    }

    fn patch(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("patch must be an object"),
        }
    }

    #[test]
    fn add_field_sets_type_defaults() {
        let mut builder = FormBuilder::new();
        let field = builder.add_field(FieldType::ImageUpload).clone();
        assert_eq!(field.id, None);
        assert_eq!(field.max_images, Some(1));
        assert!(field.image_only);
        assert_eq!(builder.form().fields.len(), 1);
    }

    #[test]
    fn move_then_inverse_restores_order() {
        let (mut builder, uids) = builder_with(&[
            FieldType::Title,
            FieldType::ShortAnswer,
            FieldType::Date,
            FieldType::Checkboxes,
        ]);
        let original = order(&builder);

        for uid in &uids {
            for offset in [-3isize, -2, -1, 1, 2, 3] {
                if builder.move_field(uid, offset) {
                    assert!(builder.move_field(uid, -offset));
                }
                assert_eq!(order(&builder), original);
            }
        }
    }

    #[test]
    fn move_out_of_bounds_is_noop() {
        let (mut builder, uids) = builder_with(&[FieldType::Title, FieldType::Date]);
        assert!(!builder.move_field(&uids[0], -1));
        assert!(!builder.move_field(&uids[1], 1));
        assert!(!builder.move_field(&uids[0], isize::MIN));
        assert!(!builder.move_field("unknown", 1));
        assert_eq!(order(&builder), uids);

        assert!(builder.move_field(&uids[0], 1));
        assert_eq!(order(&builder), vec![uids[1].clone(), uids[0].clone()]);
    }

    #[test]
    fn duplicate_is_independent_copy() {
        let mut builder = FormBuilder::new();
        let uid = builder.add_field(FieldType::Checkboxes).uid.clone();
        builder
            .update_field(&uid, &patch(json!({ "label": "演出", "options": ["A", "B"], "id": 5 })))
            .unwrap();

        let copy_uid = builder.duplicate_field(&uid).unwrap().uid.clone();
        let source = builder.form().field(&uid).unwrap().clone();
        let copy = builder.form().field(&copy_uid).unwrap().clone();

        assert_ne!(copy.uid, source.uid);
        assert_eq!(copy.id, None);
        assert_eq!(source.id, Some(5));
        assert_eq!(copy.label, source.label);
        assert_eq!(copy.options, source.options);
        assert_eq!(builder.form().position(&copy_uid), Some(1));

        builder
            .update_field(&copy_uid, &patch(json!({ "options": ["Z"] })))
            .unwrap();
        assert_eq!(builder.form().field(&uid).unwrap().options.len(), 2);
    }

    #[test]
    fn update_field_merges_and_protects_uid() {
        let mut builder = FormBuilder::new();
        let uid = builder.add_field(FieldType::ShortAnswer).uid.clone();

        let changed = builder
            .update_field(&uid, &patch(json!({ "uid": "hijack", "label": "新郎のお名前", "required": true })))
            .unwrap();
        assert!(changed);
        let field = builder.form().field(&uid).unwrap();
        assert_eq!(field.label, "新郎のお名前");
        assert!(field.required);
        assert!(builder.form().field("hijack").is_none());

        assert!(!builder.update_field("missing", &patch(json!({ "label": "x" }))).unwrap());
        assert!(builder
            .update_field(&uid, &patch(json!({ "type": "hologram" })))
            .is_err());
        assert_eq!(builder.form().field(&uid).unwrap().field_type, FieldType::ShortAnswer);
    }

    #[test]
    fn remove_preserves_remaining_order() {
        let (mut builder, uids) =
            builder_with(&[FieldType::Title, FieldType::Date, FieldType::Time]);
        assert!(builder.remove_field(&uids[1]).is_some());
        assert_eq!(order(&builder), vec![uids[0].clone(), uids[2].clone()]);
        assert!(builder.remove_field(&uids[1]).is_none());
    }

    #[test]
    fn save_payload_fills_defaults_without_touching_state() {
        let mut builder = FormBuilder::new();
        builder.update_meta(FormMetaPatch {
            title: Some("  ".into()),
            theme: Some(String::new()),
            ..Default::default()
        });
        let uid = builder.add_field(FieldType::Dropdown).uid.clone();
        let img = builder.add_field(FieldType::ImageUpload).uid.clone();
        builder
            .update_field(
                &img,
                &patch(json!({
                    "max_images": null,
                    "adminImages": [{ "id": 1, "url": "/uploads/a b.jpg" }],
                    "checkbox_options": "[\"白黒\"]"
                })),
            )
            .unwrap();

        let payload = builder.save_payload();
        assert_eq!(payload.title, UNTITLED_FORM);
        assert_eq!(payload.theme, "default");
        assert_eq!(payload.field(&uid).unwrap().label, UNTITLED_QUESTION);
        let image = payload.field(&img).unwrap();
        assert_eq!(image.max_images, Some(1));
        assert_eq!(
            image.admin_images,
            vec![AdminImage {
                id: "1".into(),
                url: "/uploads/a b.jpg".into()
            }]
        );
        assert_eq!(image.checkbox_options, vec![OptionEntry::from("白黒")]);

        // 메모리의 스키마는 그대로
        assert_eq!(builder.form().title, "  ");
        assert_eq!(builder.form().field(&uid).unwrap().label, "");
    }

    #[test]
    fn save_payload_sends_options_as_plain_labels() {
        let mut builder = FormBuilder::new();
        let uid = builder.add_field(FieldType::Checkboxes).uid.clone();
        builder
            .update_field(
                &uid,
                &patch(json!({
                    "options": [{ "label": "挙式" }, "披露宴", { "label": null }],
                    "image_options": [{}]
                })),
            )
            .unwrap();

        let payload = builder.save_payload();
        let field = payload.field(&uid).unwrap();
        assert_eq!(
            field.options,
            vec![
                OptionEntry::from("挙式"),
                OptionEntry::from("披露宴"),
                OptionEntry::from("")
            ]
        );
        assert_eq!(field.image_options, vec![OptionEntry::from("")]);
        let wire = serde_json::to_value(field).unwrap();
        assert_eq!(wire["options"], json!(["挙式", "披露宴", ""]));

        // 편집 중인 스키마는 원래 표현을 유지
        assert_eq!(
            builder.form().field(&uid).unwrap().options[0],
            OptionEntry::Labeled {
                label: Some("挙式".into())
            }
        );
    }

    async fn admin_token(api: &InMemoryIntakeApi) -> String {
        api.seed_user(
            SessionUser {
                id: "1".into(),
                name: "Planner".into(),
                email: "planner@example.com".into(),
                role: ADMIN_ROLE.into(),
            },
            "secret",
        )
        .await;
        api.login(&crate::models::LoginRequest {
            email: "planner@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap()
        .token
    }

    #[tokio::test]
    async fn save_adopts_server_ids() {
        let api = InMemoryIntakeApi::new();
        let token = admin_token(&api).await;

        let mut builder = FormBuilder::new();
        let uid = builder.add_field(FieldType::ShortAnswer).uid.clone();
        let saved = builder.save(&api, &token).await.unwrap().clone();

        let form_id = saved.id.unwrap();
        assert!(saved.field(&uid).unwrap().id.is_some());
        assert!(!builder.is_saving());
        assert_eq!(api.stored_form(form_id).await.unwrap().fields[0].uid, uid);

        // 두 번째 저장은 같은 폼을 갱신합니다.
        builder.add_field(FieldType::Date);
        let again = builder.save(&api, &token).await.unwrap();
        assert_eq!(again.id, Some(form_id));
        assert_eq!(api.stored_form(form_id).await.unwrap().fields.len(), 2);
    }

    #[tokio::test]
    async fn failed_save_leaves_schema_unchanged() {
        let api = InMemoryIntakeApi::new();
        let token = admin_token(&api).await;

        let mut builder = FormBuilder::new();
        builder.add_field(FieldType::Paragraph);
        let before = builder.form().clone();

        api.fail_next(ApiError::Status {
            status: 500,
            message: "フォームの保存に失敗しました".into(),
        })
        .await;
        let err = builder.save(&api, &token).await.unwrap_err();
        assert_eq!(err.to_string(), "フォームの保存に失敗しました");
        assert_eq!(builder.form(), &before);
        assert!(!builder.is_saving());
    }

    #[test]
    fn second_save_while_in_flight_is_rejected() {
        let mut builder = FormBuilder::new();
        builder.begin_save().unwrap();
        assert!(matches!(builder.begin_save(), Err(AppError::Conflict(_))));
        builder
            .finish_save(Err(ApiError::Transport {
                message: "connection reset".into(),
            }))
            .unwrap_err();
        assert!(builder.begin_save().is_ok());
    }
}
