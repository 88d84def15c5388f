//! 프로세스 내부에서 동작하는 `IntakeApi` 구현
//!
//! 외부 API와 같은 계약(상태 코드, 메시지, ID 부여 규칙)을 흉내 냅니다.
//! 테스트와 `INTAKE_API_URL=memory:` 로컬 개발에서 사용합니다.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use super::{ApiError, IntakeApi};
use crate::models::{
    AuthResponse, CategoryInfo, FormSchema, GeneralGroup, LoginRequest, RegisterRequest,
    SessionUser, StoredResponse, SubmissionPayload, ADMIN_ROLE,
};

#[derive(Default)]
struct Store {
    forms: BTreeMap<i64, FormSchema>,
    next_form_id: i64,
    next_field_id: i64,
    categories: HashMap<i64, CategoryInfo>,
    general: Vec<GeneralGroup>,
    responses: Vec<(i64, StoredResponse)>,
    users: Vec<(SessionUser, String)>,
    tokens: HashMap<String, SessionUser>,
    submissions: Vec<(String, SubmissionPayload)>,
    fail_next: Option<ApiError>,
}

impl Store {
    fn admin(&self, token: &str) -> Result<&SessionUser, ApiError> {
        match self.tokens.get(token) {
            Some(user) if user.is_admin() => Ok(user),
            Some(_) => Err(status(403, "Forbidden")),
            None => Err(status(401, "Unauthorized")),
        }
    }

    fn issue_token(&mut self, user: SessionUser) -> AuthResponse {
        let token = uuid::Uuid::now_v7().simple().to_string();
        self.tokens.insert(token.clone(), user.clone());
        AuthResponse { token, user }
    }
}

fn status(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        message: message.to_string(),
    }
}

fn parse_form_id(share_id: &str) -> Result<i64, ApiError> {
    share_id
        .parse()
        .map_err(|_| status(404, "Form not found"))
}

#[derive(Default)]
pub struct InMemoryIntakeApi {
    store: Mutex<Store>,
}

impl InMemoryIntakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 폼을 미리 넣어 둡니다. ID가 없으면 새로 부여하고, 부여된 ID를 돌려줍니다.
    pub async fn seed_form(&self, mut form: FormSchema) -> i64 {
        let mut store = self.store.lock().await;
        let id = match form.id {
            Some(id) => id,
            None => {
                store.next_form_id += 1;
                store.next_form_id
            }
        };
        store.next_form_id = store.next_form_id.max(id);
        form.id = Some(id);
        store.forms.insert(id, form);
        id
    }

    pub async fn seed_category(&self, form_id: i64, info: CategoryInfo) {
        self.store.lock().await.categories.insert(form_id, info);
    }

    pub async fn seed_general(&self, groups: Vec<GeneralGroup>) {
        self.store.lock().await.general = groups;
    }

    pub async fn seed_response(&self, form_id: i64, response: StoredResponse) {
        self.store.lock().await.responses.push((form_id, response));
    }

    pub async fn seed_user(&self, user: SessionUser, password: &str) {
        self.store
            .lock()
            .await
            .users
            .push((user, password.to_string()));
    }

    /// 다음 호출 한 번을 주어진 에러로 실패시킵니다.
    pub async fn fail_next(&self, error: ApiError) {
        self.store.lock().await.fail_next = Some(error);
    }

    /// 지금까지 받은 제출 페이로드 (폼 ID와 함께)
    pub async fn submissions(&self) -> Vec<(String, SubmissionPayload)> {
        self.store.lock().await.submissions.clone()
    }

    pub async fn stored_form(&self, form_id: i64) -> Option<FormSchema> {
        self.store.lock().await.forms.get(&form_id).cloned()
    }
}

#[async_trait]
impl IntakeApi for InMemoryIntakeApi {
    async fn form_by_share_id(&self, share_id: &str) -> Result<FormSchema, ApiError> {
        let mut store = self.store.lock().await;
        if let Some(e) = store.fail_next.take() {
            return Err(e);
        }
        let id = parse_form_id(share_id)?;
        store
            .forms
            .get(&id)
            .cloned()
            .ok_or_else(|| status(404, "Form not found"))
    }

    async fn category_for_form(&self, share_id: &str) -> Result<CategoryInfo, ApiError> {
        let mut store = self.store.lock().await;
        if let Some(e) = store.fail_next.take() {
            return Err(e);
        }
        let id = parse_form_id(share_id)?;
        if !store.forms.contains_key(&id) {
            return Err(status(404, "Form not found"));
        }
        Ok(store.categories.get(&id).cloned().unwrap_or(CategoryInfo {
            category_id: None,
            title: String::new(),
        }))
    }

    async fn general_groups(&self) -> Result<Vec<GeneralGroup>, ApiError> {
        let mut store = self.store.lock().await;
        if let Some(e) = store.fail_next.take() {
            return Err(e);
        }
        Ok(store.general.clone())
    }

    async fn responses_for_form(
        &self,
        form_id: i64,
        token: &str,
    ) -> Result<Vec<StoredResponse>, ApiError> {
        let mut store = self.store.lock().await;
        if let Some(e) = store.fail_next.take() {
            return Err(e);
        }
        store.admin(token)?;
        Ok(store
            .responses
            .iter()
            .filter(|(id, _)| form_id == 0 || *id == form_id)
            .map(|(_, response)| response.clone())
            .collect())
    }

    async fn submit_form(
        &self,
        form_id: &str,
        payload: SubmissionPayload,
        _token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut store = self.store.lock().await;
        if let Some(e) = store.fail_next.take() {
            return Err(e);
        }
        let id = parse_form_id(form_id)?;
        if !store.forms.contains_key(&id) {
            return Err(status(404, "Form not found"));
        }
        store.submissions.push((form_id.to_string(), payload));
        Ok(json!({ "success": true }))
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let mut store = self.store.lock().await;
        if let Some(e) = store.fail_next.take() {
            return Err(e);
        }
        let user = store
            .users
            .iter()
            .find(|(user, password)| user.email == request.email && *password == request.password)
            .map(|(user, _)| user.clone())
            .ok_or_else(|| status(401, "Invalid email or password"))?;
        Ok(store.issue_token(user))
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let mut store = self.store.lock().await;
        if let Some(e) = store.fail_next.take() {
            return Err(e);
        }
        if store.users.iter().any(|(user, _)| user.email == request.email) {
            return Err(status(409, "Email already registered"));
        }
        let user = SessionUser {
            id: (store.users.len() + 1).to_string(),
            name: request.name.clone(),
            email: request.email.clone(),
            role: "user".to_string(),
        };
        store.users.push((user.clone(), request.password.clone()));
        Ok(store.issue_token(user))
    }

    async fn save_form(&self, form: &FormSchema, token: &str) -> Result<FormSchema, ApiError> {
        let mut store = self.store.lock().await;
        if let Some(e) = store.fail_next.take() {
            return Err(e);
        }
        store.admin(token)?;

        let mut saved = form.clone();
        let id = match saved.id {
            Some(id) if store.forms.contains_key(&id) => id,
            Some(_) => return Err(status(404, "Form not found")),
            None => {
                store.next_form_id += 1;
                store.next_form_id
            }
        };
        saved.id = Some(id);
        for field in saved.fields.iter_mut().filter(|f| f.id.is_none()) {
            store.next_field_id += 1;
            field.id = Some(store.next_field_id);
        }
        store.forms.insert(id, saved.clone());
        Ok(saved)
    }

    async fn delete_form(&self, form_id: i64, token: &str) -> Result<(), ApiError> {
        let mut store = self.store.lock().await;
        if let Some(e) = store.fail_next.take() {
            return Err(e);
        }
        store.admin(token)?;
        store
            .forms
            .remove(&form_id)
            .map(|_| ())
            .ok_or_else(|| status(404, "Form not found"))
    }
}

/// 관리자 한 명이 들어 있는 인메모리 API — 로컬 개발용 시드
pub async fn with_dev_admin(email: &str, password: &str) -> InMemoryIntakeApi {
    let api = InMemoryIntakeApi::new();
    api.seed_user(
        SessionUser {
            id: "1".to_string(),
            name: "Admin".to_string(),
            email: email.to_string(),
            role: ADMIN_ROLE.to_string(),
        },
        password,
    )
    .await;
    api
}
