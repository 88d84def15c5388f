//! # 폼 빌더 라우트 핸들러 (관리자)
//!
//! 드래프트 하나가 `FormBuilder` 하나입니다. 필드 편집은 서버 메모리에서만 일어나고,
//! `save`만 외부 API를 호출합니다.
//!
//! ## 엔드포인트
//! - `POST   /api/v1/admin/drafts`                          → 드래프트 열기 (`{}`는 새 폼, `{"share_id": "12"}`는 기존 폼 편집)
//! - `GET    /api/v1/admin/drafts/{id}`                     → 드래프트 조회
//! - `PATCH  /api/v1/admin/drafts/{id}`                     → 제목/설명/테마/카테고리 수정
//! - `DELETE /api/v1/admin/drafts/{id}`                     → 드래프트 닫기
//! - `POST   /api/v1/admin/drafts/{id}/fields`              → 필드 추가 (`{"type": "short_answer"}`)
//! - `PATCH  /api/v1/admin/drafts/{id}/fields/{uid}`        → 필드 부분 수정
//! - `DELETE /api/v1/admin/drafts/{id}/fields/{uid}`        → 필드 삭제
//! - `POST   /api/v1/admin/drafts/{id}/fields/{uid}/move`   → 위/아래로 이동 (`{"offset": -1}`)
//! - `POST   /api/v1/admin/drafts/{id}/fields/{uid}/duplicate` → 필드 복제
//! - `POST   /api/v1/admin/drafts/{id}/save`                → 외부 API에 저장
//!
//! 드래프트는 연 사람의 세션을 구독합니다. 그 세션이 로그아웃하면 드래프트는 닫히고,
//! 이후 요청은 랜딩 페이지로 리다이렉트됩니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{sync::watch, task::AbortHandle};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::AdminUser,
    models::{Field, FieldType, FormMetaPatch, FormSchema},
    routes::{lookup, AppState, Entry, Registry},
    services::{
        builder::FormBuilder,
        session::{gate, Access, Session, SessionState, LANDING_PAGE},
    },
};

/// 관리자 한 명이 편집 중인 폼
pub struct Draft {
    id: Uuid,
    builder: FormBuilder,
    owner: watch::Receiver<SessionState>,
    owner_hash: String,
    /// 로그아웃을 기다리는 감시 태스크. 드래프트가 사라지면 같이 멈춥니다.
    watcher: Option<AbortHandle>,
}

impl Draft {
    pub fn new(builder: FormBuilder, owner: &Session, owner_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            builder,
            owner: owner.subscribe(),
            owner_hash: owner_hash.into(),
            watcher: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 주인 세션이 아직 관리자로 로그인해 있는지
    pub fn is_open(&self) -> bool {
        matches!(gate(&self.owner.borrow()), Access::Granted(_))
    }

    pub fn view(&self) -> DraftView {
        DraftView {
            id: self.id,
            form: self.builder.form().clone(),
            saving: self.builder.is_saving(),
        }
    }
}

impl Drop for Draft {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

/// 주인 세션이 관리자 상태를 벗어나면 드래프트를 레지스트리에서 뺍니다.
///
/// 세션 자체가 사라져도(`changed()`가 에러) 같은 처리를 합니다.
pub fn watch_owner(
    drafts: Registry<Draft>,
    id: Uuid,
    mut owner: watch::Receiver<SessionState>,
) -> AbortHandle {
    tokio::spawn(async move {
        while owner.changed().await.is_ok() {
            if !matches!(gate(&owner.borrow_and_update()), Access::Granted(_)) {
                break;
            }
        }
        if drafts.write().await.remove(&id).is_some() {
            tracing::info!(draft_id = %id, "draft closed after sign-out");
        }
    })
    .abort_handle()
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub id: Uuid,
    pub form: FormSchema,
    pub saving: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateDraftRequest {
    /// 기존 폼을 편집할 때의 공유 ID
    pub share_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddFieldRequest {
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

#[derive(Debug, Deserialize)]
pub struct MoveFieldRequest {
    pub offset: isize,
}

/// 드래프트를 꺼내고 주인인지 확인합니다.
///
/// - 다른 관리자의 드래프트 → 404
/// - 주인이 이미 로그아웃한 드래프트 → 닫고 랜딩 페이지로 리다이렉트
async fn open_draft(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> Result<Arc<Entry<Draft>>, AppError> {
    let draft = lookup(&state.drafts, id).await?;
    let (owned, open) = {
        let guard = draft.lock().await;
        (guard.owner_hash == admin.token_hash, guard.is_open())
    };
    if !owned {
        return Err(AppError::NotFound);
    }
    if !open {
        state.drafts.write().await.remove(&id);
        return Err(AppError::Redirect(LANDING_PAGE));
    }
    Ok(draft)
}

/// `POST /admin/drafts`
pub async fn create_draft(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(request): Json<CreateDraftRequest>,
) -> Result<(StatusCode, Json<DraftView>), AppError> {
    let builder = match request.share_id.as_deref() {
        Some(share_id) => {
            let form = state
                .api
                .form_by_share_id(share_id)
                .await
                .map_err(|e| e.with_fallback("Form not found"))?;
            FormBuilder::from_form(form)
        }
        None => FormBuilder::new(),
    };

    let mut draft = Draft::new(builder, &admin.session, admin.token_hash.clone());
    let id = draft.id();
    draft.watcher = Some(watch_owner(
        state.drafts.clone(),
        id,
        admin.session.subscribe(),
    ));
    let view = draft.view();
    state
        .drafts
        .write()
        .await
        .insert(id, Entry::new(draft));

    tracing::info!(draft_id = %id, user_id = %admin.user.id, form_id = ?view.form.id, "draft opened");
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /admin/drafts/{id}`
pub async fn get_draft(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, AppError> {
    let draft = open_draft(&state, &admin, id).await?;
    let view = draft.lock().await.view();
    Ok(Json(view))
}

/// `PATCH /admin/drafts/{id}`
pub async fn patch_draft(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<FormMetaPatch>,
) -> Result<Json<DraftView>, AppError> {
    let draft = open_draft(&state, &admin, id).await?;
    let mut draft = draft.lock().await;
    draft.builder.update_meta(patch);
    Ok(Json(draft.view()))
}

/// `DELETE /admin/drafts/{id}` — 저장하지 않은 변경은 버려집니다.
pub async fn delete_draft(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    open_draft(&state, &admin, id).await?;
    state.drafts.write().await.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /admin/drafts/{id}/fields`
pub async fn add_field(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddFieldRequest>,
) -> Result<(StatusCode, Json<Field>), AppError> {
    let draft = open_draft(&state, &admin, id).await?;
    let mut draft = draft.lock().await;
    let field = draft.builder.add_field(req.field_type).clone();
    Ok((StatusCode::CREATED, Json(field)))
}

/// `PATCH /admin/drafts/{id}/fields/{uid}`
///
/// 본문의 키만 덮어씁니다. `uid`는 바꿀 수 없습니다.
pub async fn update_field(
    State(state): State<AppState>,
    admin: AdminUser,
    Path((id, uid)): Path<(Uuid, String)>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<Field>, AppError> {
    let draft = open_draft(&state, &admin, id).await?;
    let mut draft = draft.lock().await;
    if !draft.builder.update_field(&uid, &patch)? {
        return Err(AppError::NotFound);
    }
    let field = draft
        .builder
        .form()
        .field(&uid)
        .cloned()
        .ok_or(AppError::NotFound)?;
    Ok(Json(field))
}

/// `DELETE /admin/drafts/{id}/fields/{uid}`
pub async fn delete_field(
    State(state): State<AppState>,
    admin: AdminUser,
    Path((id, uid)): Path<(Uuid, String)>,
) -> Result<StatusCode, AppError> {
    let draft = open_draft(&state, &admin, id).await?;
    let mut draft = draft.lock().await;
    match draft.builder.remove_field(&uid) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(AppError::NotFound),
    }
}

/// `POST /admin/drafts/{id}/fields/{uid}/move`
///
/// 범위를 벗어나는 이동은 아무 일도 하지 않고 현재 상태를 돌려줍니다.
pub async fn move_field(
    State(state): State<AppState>,
    admin: AdminUser,
    Path((id, uid)): Path<(Uuid, String)>,
    Json(req): Json<MoveFieldRequest>,
) -> Result<Json<DraftView>, AppError> {
    let draft = open_draft(&state, &admin, id).await?;
    let mut draft = draft.lock().await;
    if draft.builder.form().field(&uid).is_none() {
        return Err(AppError::NotFound);
    }
    draft.builder.move_field(&uid, req.offset);
    Ok(Json(draft.view()))
}

/// `POST /admin/drafts/{id}/fields/{uid}/duplicate`
pub async fn duplicate_field(
    State(state): State<AppState>,
    admin: AdminUser,
    Path((id, uid)): Path<(Uuid, String)>,
) -> Result<(StatusCode, Json<Field>), AppError> {
    let draft = open_draft(&state, &admin, id).await?;
    let mut draft = draft.lock().await;
    let copy = draft
        .builder
        .duplicate_field(&uid)
        .cloned()
        .ok_or(AppError::NotFound)?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// `POST /admin/drafts/{id}/save`
///
/// 외부 API를 기다리는 동안에는 드래프트 잠금을 풀어 두므로 편집을 계속할 수 있습니다.
pub async fn save_draft(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, AppError> {
    let draft = open_draft(&state, &admin, id).await?;
    let payload = draft.lock().await.builder.begin_save()?;

    let result = state
        .api
        .save_form(&payload, &admin.token)
        .await
        .map_err(|e| e.with_fallback("フォームの保存に失敗しました"));

    let mut draft = draft.lock().await;
    let saved_id = draft.builder.finish_save(result)?.id;
    tracing::info!(draft_id = %id, form_id = ?saved_id, "form saved");
    Ok(Json(draft.view()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InMemoryIntakeApi, IntakeApi};
    use crate::db;
    use crate::models::{LoginRequest, SessionUser, ADMIN_ROLE};
    use crate::routes::testing;
    use std::time::Duration;

    fn admin() -> SessionUser {
        SessionUser {
            id: "1".into(),
            name: "Planner".into(),
            email: "planner@example.com".into(),
            role: ADMIN_ROLE.into(),
        }
    }

    #[test]
    fn draft_closes_with_owner_session() {
        let session = Session::new();
        session.sign_in(admin());
        let draft = Draft::new(FormBuilder::new(), &session, "hash");
        assert!(draft.is_open());

        session.sign_out();
        assert!(!draft.is_open());
    }

    #[tokio::test]
    async fn watcher_removes_draft_on_sign_out() {
        let session = Session::new();
        session.sign_in(admin());
        let drafts: Registry<Draft> = Arc::default();

        let mut draft = Draft::new(FormBuilder::new(), &session, "hash");
        let id = draft.id();
        draft.watcher = Some(watch_owner(drafts.clone(), id, session.subscribe()));
        drafts.write().await.insert(id, Entry::new(draft));

        session.sign_out();

        let closed = tokio::time::timeout(Duration::from_secs(1), async {
            while drafts.read().await.contains_key(&id) {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(closed.is_ok());
    }

    #[tokio::test]
    async fn watcher_keeps_draft_while_admin_stays_signed_in() {
        let session = Session::new();
        session.sign_in(admin());
        let drafts: Registry<Draft> = Arc::default();

        let mut draft = Draft::new(FormBuilder::new(), &session, "hash");
        let id = draft.id();
        draft.watcher = Some(watch_owner(drafts.clone(), id, session.subscribe()));
        drafts.write().await.insert(id, Entry::new(draft));

        // 같은 관리자로 다시 로그인해도 드래프트는 유지됩니다.
        session.sign_in(admin());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(drafts.read().await.contains_key(&id));
    }

    /// 관리자 한 명을 넣고 로그인시킨 상태를 만듭니다.
    async fn signed_in_admin(
        api: &Arc<InMemoryIntakeApi>,
        state: &AppState,
    ) -> AdminUser {
        api.seed_user(admin(), "secret").await;
        let auth = api
            .login(&LoginRequest {
                email: "planner@example.com".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        let token_hash = db::hash_token(&auth.token);
        let session = state.sessions.sign_in(&token_hash, auth.user.clone()).await;
        AdminUser {
            user: auth.user,
            token: auth.token,
            token_hash,
            session,
        }
    }

    #[tokio::test]
    async fn edit_and_save_draft() {
        let api = Arc::new(InMemoryIntakeApi::new());
        let dir = tempfile::tempdir().unwrap();
        let state = testing::state_with(api.clone(), dir.path()).await;
        let admin = signed_in_admin(&api, &state).await;

        let (status, Json(view)) = create_draft(
            State(state.clone()),
            admin.clone(),
            Json(CreateDraftRequest::default()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(view.form.id, None);
        let id = view.id;

        let (_, Json(first)) = add_field(
            State(state.clone()),
            admin.clone(),
            Path(id),
            Json(AddFieldRequest {
                field_type: FieldType::ShortAnswer,
            }),
        )
        .await
        .unwrap();
        let (_, Json(second)) = add_field(
            State(state.clone()),
            admin.clone(),
            Path(id),
            Json(AddFieldRequest {
                field_type: FieldType::Date,
            }),
        )
        .await
        .unwrap();

        let Json(view) = move_field(
            State(state.clone()),
            admin.clone(),
            Path((id, second.uid.clone())),
            Json(MoveFieldRequest { offset: -1 }),
        )
        .await
        .unwrap();
        let order: Vec<_> = view.form.fields.iter().map(|f| f.uid.clone()).collect();
        assert_eq!(order, vec![second.uid.clone(), first.uid.clone()]);

        let Json(saved) = save_draft(State(state.clone()), admin.clone(), Path(id))
            .await
            .unwrap();
        let form_id = saved.form.id.unwrap();
        assert!(!saved.saving);
        assert!(saved.form.fields.iter().all(|f| f.id.is_some()));

        let stored = api.stored_form(form_id).await.unwrap();
        assert_eq!(stored.fields.len(), 2);
        assert_eq!(stored.fields[0].uid, second.uid);
    }

    #[tokio::test]
    async fn draft_of_signed_out_owner_redirects() {
        let api = Arc::new(InMemoryIntakeApi::new());
        let dir = tempfile::tempdir().unwrap();
        let state = testing::state_with(api.clone(), dir.path()).await;
        let admin = signed_in_admin(&api, &state).await;

        // 감시 태스크 없이 넣어 두고, 요청 시점의 확인만 봅니다.
        let draft = Draft::new(FormBuilder::new(), &admin.session, admin.token_hash.clone());
        let id = draft.id();
        state
            .drafts
            .write()
            .await
            .insert(id, Entry::new(draft));

        admin.session.sign_out();
        let err = get_draft(State(state.clone()), admin.clone(), Path(id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Redirect(LANDING_PAGE)));
        assert!(!state.drafts.read().await.contains_key(&id));
    }

    #[tokio::test]
    async fn other_admins_draft_is_hidden() {
        let api = Arc::new(InMemoryIntakeApi::new());
        let dir = tempfile::tempdir().unwrap();
        let state = testing::state_with(api.clone(), dir.path()).await;
        let owner = signed_in_admin(&api, &state).await;

        let (_, Json(view)) = create_draft(
            State(state.clone()),
            owner.clone(),
            Json(CreateDraftRequest::default()),
        )
        .await
        .unwrap();

        let mut stranger = owner.clone();
        stranger.token_hash = db::hash_token("another-token");
        let err = get_draft(State(state.clone()), stranger, Path(view.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
