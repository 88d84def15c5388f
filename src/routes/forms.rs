//! # 공개 폼 라우트 핸들러
//!
//! 공유 링크(`<origin>/forms/<formId>`)로 들어온 응답자가 폼을 여는 곳입니다.
//! 로그인하지 않아도 됩니다.
//!
//! ## 엔드포인트
//! - `GET  /api/v1/forms/{share_id}`      → 렌더링된 폼 (공유 그룹 + 폼 필드)
//! - `POST /api/v1/forms/{share_id}/fill` → 새 채우기 세션 시작

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use crate::{
    error::AppError,
    routes::{AppState, Entry},
    services::renderer::{FillForm, FillSession, FillSnapshot, RenderedForm},
};

/// `GET /forms/{share_id}` — 폼을 읽기 전용으로 렌더링합니다.
pub async fn get_form(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<RenderedForm>, AppError> {
    let form = FillForm::load(state.api.as_ref(), &share_id).await?;
    Ok(Json(form.render()))
}

/// `POST /forms/{share_id}/fill` — 빈 응답 맵으로 채우기 세션을 엽니다.
///
/// 반환된 `id`로 이후 `/fill/{id}/...` 요청을 보냅니다.
pub async fn start_fill(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<(StatusCode, Json<FillSnapshot>), AppError> {
    let form = FillForm::load(state.api.as_ref(), &share_id).await?;
    let session = FillSession::new(form);
    let snapshot = session.snapshot();

    state
        .fills
        .write()
        .await
        .insert(session.id(), Entry::new(session));
    tracing::info!(fill_id = %snapshot.id, share_id = %share_id, "fill session started");

    Ok((StatusCode::CREATED, Json(snapshot)))
}
