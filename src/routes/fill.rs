//! # 채우기 세션 라우트 핸들러
//!
//! 응답자 한 명이 폼을 채우고 제출하는 흐름입니다.
//!
//! ## 엔드포인트
//! - `GET    /api/v1/fill/{id}`                      → 세션 스냅샷
//! - `PUT    /api/v1/fill/{id}/answers/{key}`        → 텍스트/선택 응답 기록 (`{"value": ...}`)
//! - `POST   /api/v1/fill/{id}/files/{uid}`          → 파일 업로드 (multipart)
//! - `DELETE /api/v1/fill/{id}/files/{uid}/{index}`  → 선택한 파일 빼기
//! - `POST   /api/v1/fill/{id}/submit`               → 검증 후 외부 API로 제출
//! - `POST   /api/v1/fill/{id}/dismiss`              → 에러 메시지 닫기
//! - `POST   /api/v1/fill/{id}/reset`                → 다시 답하기
//! - `DELETE /api/v1/fill/{id}`                      → 세션 종료, 스테이징 파일 정리
//!
//! 파일에서 빠진 항목(상한 초과, 삭제, 제출 성공)은 그 자리에서 해제(revoke)합니다.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::CurrentSession,
    models::SetAnswerRequest,
    routes::{lookup, AppState},
    services::renderer::{build_payload, FillSnapshot},
};

/// `GET /fill/{id}`
pub async fn get_fill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FillSnapshot>, AppError> {
    let session = lookup(&state.fills, id).await?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// `PUT /fill/{id}/answers/{key}` — `value`가 null이면 응답을 지웁니다.
pub async fn set_answer(
    State(state): State<AppState>,
    Path((id, key)): Path<(Uuid, String)>,
    Json(req): Json<SetAnswerRequest>,
) -> Result<Json<FillSnapshot>, AppError> {
    let session = lookup(&state.fills, id).await?;
    let mut session = session.lock().await;
    session.set_answer(&key, req.value.map(Into::into))?;
    Ok(Json(session.snapshot()))
}

/// `POST /fill/{id}/files/{uid}` — multipart의 파일 파트들을 기존 선택 뒤에 붙입니다.
///
/// 상한을 넘는 파일은 거절하지 않고 꼬리부터 버립니다.
pub async fn upload_files(
    State(state): State<AppState>,
    Path((id, uid)): Path<(Uuid, String)>,
    mut multipart: Multipart,
) -> Result<Json<FillSnapshot>, AppError> {
    let session = lookup(&state.fills, id).await?;

    let mut staged = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        // 파일이 아닌 파트는 무시
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                state.uploads.revoke_all(&staged).await;
                return Err(AppError::BadRequest(format!("failed to read upload: {e}")));
            }
        };
        match state
            .uploads
            .stage(id, &file_name, &content_type, &bytes)
            .await
        {
            Ok(file) => staged.push(file),
            Err(e) => {
                state.uploads.revoke_all(&staged).await;
                return Err(e);
            }
        }
    }
    if staged.is_empty() {
        return Err(AppError::BadRequest("no files in request".to_string()));
    }

    let mut session = session.lock().await;
    match session.attach_files(&uid, staged.clone()) {
        Ok(dropped) => {
            state.uploads.revoke_all(&dropped).await;
            Ok(Json(session.snapshot()))
        }
        Err(e) => {
            state.uploads.revoke_all(&staged).await;
            Err(e)
        }
    }
}

/// `DELETE /fill/{id}/files/{uid}/{index}`
pub async fn remove_file(
    State(state): State<AppState>,
    Path((id, uid, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<FillSnapshot>, AppError> {
    let session = lookup(&state.fills, id).await?;
    let mut session = session.lock().await;
    let removed = session.remove_file(&uid, index)?;
    state.uploads.revoke(&removed).await?;
    Ok(Json(session.snapshot()))
}

/// `POST /fill/{id}/submit`
///
/// 검증과 인코딩은 세션을 잠근 채로, 외부 API 호출은 잠금을 푼 채로 합니다.
/// 그동안 세션은 `Submitting`이므로 두 번째 제출은 `Conflict`로 거절됩니다.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    current: CurrentSession,
) -> Result<Json<FillSnapshot>, AppError> {
    let session = lookup(&state.fills, id).await?;

    let (share_id, submission) = {
        let mut guard = session.lock().await;
        guard.begin_submit()?;
        let submission = guard.build_submission(Utc::now(), current.user());
        (guard.form().share_id.clone(), submission)
    };

    let payload = match build_payload(&submission, &state.uploads).await {
        Ok(payload) => payload,
        Err(e) => {
            session.lock().await.abort_submit(&e);
            return Err(e);
        }
    };
    tracing::info!(
        fill_id = %id,
        share_id = %share_id,
        answers = submission.answers.len(),
        files = payload.file_parts.len(),
        "submitting form"
    );

    let result = state
        .api
        .submit_form(&share_id, payload, current.token.as_deref())
        .await;

    let mut guard = session.lock().await;
    let released = guard.finish_submit(result)?;
    state.uploads.revoke_all(&released).await;
    Ok(Json(guard.snapshot()))
}

/// `POST /fill/{id}/dismiss`
pub async fn dismiss_error(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FillSnapshot>, AppError> {
    let session = lookup(&state.fills, id).await?;
    let mut session = session.lock().await;
    session.dismiss_error();
    Ok(Json(session.snapshot()))
}

/// `POST /fill/{id}/reset` — 성공 화면에서 "もう一度回答する"
pub async fn reset_fill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FillSnapshot>, AppError> {
    let session = lookup(&state.fills, id).await?;
    let mut session = session.lock().await;
    let released = session.reset()?;
    state.uploads.revoke_all(&released).await;
    Ok(Json(session.snapshot()))
}

/// `DELETE /fill/{id}` — 세션을 닫고 스테이징 디렉토리를 지웁니다.
pub async fn close_fill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = state.fills.write().await.remove(&id);
    if removed.is_none() {
        return Err(AppError::NotFound);
    }
    state.uploads.teardown(id).await?;
    tracing::info!(fill_id = %id, "fill session closed");
    Ok(StatusCode::NO_CONTENT)
}
