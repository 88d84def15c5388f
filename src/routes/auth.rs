use crate::{
    db,
    error::AppError,
    middleware::auth::CurrentSession,
    models::*,
    routes::AppState,
    services::session::SessionState,
};
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// 외부 API가 발급한 토큰을 로컬에 기록하고 세션을 인증 상태로 만듭니다.
async fn establish(state: &AppState, auth: &AuthResponse) -> Result<(), AppError> {
    let token_hash = db::hash_token(&auth.token);
    db::store_credential(&state.pool, &token_hash, &auth.user).await?;
    state.sessions.sign_in(&token_hash, auth.user.clone()).await;

    tracing::info!(user_id = %auth.user.id, role = %auth.user.role, "signed in");
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // Validate input
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }

    let auth = state
        .api
        .register(&req)
        .await
        .map_err(|e| e.with_fallback("Login failed"))?;
    establish(&state, &auth).await?;

    Ok(Json(auth))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let auth = state
        .api
        .login(&req)
        .await
        .map_err(|e| e.with_fallback("Login failed"))?;
    establish(&state, &auth).await?;

    Ok(Json(auth))
}

/// 로컬 자격증명을 지우고 세션을 익명으로 되돌립니다.
/// 그 세션을 구독하던 빌더 드래프트들도 함께 닫힙니다.
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Json<Value>, AppError> {
    let Some(token_hash) = current.token_hash else {
        return Err(AppError::Unauthorized("Not signed in".to_string()));
    };

    db::delete_credential(&state.pool, &token_hash).await?;
    state.sessions.sign_out(&token_hash).await;

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

pub async fn me(current: CurrentSession) -> Json<SessionState> {
    Json(current.state())
}
