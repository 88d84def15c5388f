//! # 응답 뷰어 라우트 핸들러 (관리자)
//!
//! 외부 API에 저장된 제출 기록을 목록/상세로 보여줍니다.
//! 뷰어는 요청마다 새로 만들어 최신 목록을 불러옵니다.
//!
//! ## 엔드포인트
//! - `GET    /api/v1/admin/forms/{form_id}/responses`        → 응답 목록 (`form_id`가 0이면 전체)
//! - `GET    /api/v1/admin/forms/{form_id}/responses/{id}`   → 응답 상세
//! - `GET    /api/v1/admin/forms/{form_id}/share`            → 공유 링크
//! - `DELETE /api/v1/admin/forms/{form_id}`                  → 폼 삭제

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    error::AppError,
    middleware::auth::AdminUser,
    routes::AppState,
    services::viewer::{ResponseViewer, ViewerSnapshot},
};

/// `GET /admin/forms/{form_id}/responses`
pub async fn list_responses(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(form_id): Path<i64>,
) -> Result<Json<ViewerSnapshot>, AppError> {
    let mut viewer = ResponseViewer::new(form_id);
    viewer.load(state.api.as_ref(), &admin.token).await?;
    tracing::debug!(form_id, count = viewer.responses().len(), "responses loaded");
    Ok(Json(viewer.view()))
}

/// `GET /admin/forms/{form_id}/responses/{response_id}`
pub async fn get_response(
    State(state): State<AppState>,
    admin: AdminUser,
    Path((form_id, response_id)): Path<(i64, String)>,
) -> Result<Json<ViewerSnapshot>, AppError> {
    let mut viewer = ResponseViewer::new(form_id);
    viewer.load(state.api.as_ref(), &admin.token).await?;
    viewer.select(&response_id)?;
    Ok(Json(viewer.view()))
}

/// `DELETE /admin/forms/{form_id}`
pub async fn delete_form(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(form_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state
        .api
        .delete_form(form_id, &admin.token)
        .await
        .map_err(|e| e.with_fallback("Failed to delete form"))?;

    tracing::info!(form_id, user_id = %admin.user.id, "form deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct ShareLink {
    pub url: String,
}

/// 응답자에게 보낼 링크: `<origin>/forms/<formId>`
pub fn share_url(origin: &str, form_id: i64) -> String {
    format!("{}/forms/{}", origin.trim_end_matches('/'), form_id)
}

/// `GET /admin/forms/{form_id}/share`
pub async fn share_link(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(form_id): Path<i64>,
) -> Json<ShareLink> {
    Json(ShareLink {
        url: share_url(&state.public_origin, form_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_url_joins_origin_and_id() {
        assert_eq!(
            share_url("https://intake.example.com", 42),
            "https://intake.example.com/forms/42"
        );
        assert_eq!(
            share_url("http://localhost:5173/", 7),
            "http://localhost:5173/forms/7"
        );
    }
}
