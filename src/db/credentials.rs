//! # 자격증명 저장소 쿼리 모듈
//!
//! 로그인/가입에 성공하면 외부 API가 준 토큰과 사용자 정보를 이 테이블에 보관합니다.
//! 토큰이 있는지가 곧 "로그인했는지"의 유일한 신호입니다.
//!
//! ```text
//! login/register → store_credential() → 요청마다 find_credential() → logout → delete_credential()
//! ```
//!
//! 원본 토큰은 저장하지 않습니다. `hash_token()`으로 만든 SHA-256 해시가 키입니다.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::SessionUser;

/// 토큰의 SHA-256 해시 (소문자 hex)
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 자격증명을 저장합니다. 같은 토큰이 이미 있으면 사용자 정보를 덮어씁니다.
pub async fn store_credential(
    pool: &SqlitePool,
    token_hash: &str,
    user: &SessionUser,
) -> Result<(), AppError> {
    let user_json = serde_json::to_string(user)
        .map_err(|e| AppError::Internal(format!("failed to encode user: {e}")))?;

    sqlx::query(
        r#"
        INSERT INTO credentials (token_hash, user_json)
        VALUES (?, ?)
        ON CONFLICT(token_hash) DO UPDATE SET user_json = excluded.user_json
        "#,
    )
    .bind(token_hash)
    .bind(&user_json)
    .execute(pool)
    .await?;

    Ok(())
}

/// 토큰 해시로 사용자를 찾습니다.
///
/// 저장된 JSON을 해석할 수 없으면 없는 것으로 취급합니다 (로그인을 다시 하면 됩니다).
pub async fn find_credential(
    pool: &SqlitePool,
    token_hash: &str,
) -> Result<Option<SessionUser>, AppError> {
    let user_json = sqlx::query_scalar::<_, String>(
        "SELECT user_json FROM credentials WHERE token_hash = ?",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(user_json.and_then(|json| match serde_json::from_str(&json) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable stored credential");
            None
        }
    }))
}

/// 자격증명을 지웁니다. 지운 행이 있으면 true.
pub async fn delete_credential(pool: &SqlitePool, token_hash: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM credentials WHERE token_hash = ?")
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
