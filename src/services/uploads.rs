//! # 업로드 스테이징 서비스
//!
//! 응답자가 올린 파일을 제출 전까지 디스크에 보관합니다.
//! 브라우저에서 미리보기용 object URL을 만들고 해제(revoke)하던 것과 같은 역할입니다:
//!
//! ```text
//! stage()   → 파일 저장 + 미리보기 URL 발급   (URL.createObjectURL)
//! revoke()  → 파일 삭제, URL은 더 이상 열리지 않음 (URL.revokeObjectURL)
//! teardown()→ 채우기 세션의 모든 파일 삭제      (컴포넌트 언마운트)
//! ```
//!
//! 해제하지 않은 파일은 디스크에 계속 쌓이므로,
//! 필드에서 파일을 지우거나 세션을 끝낼 때 반드시 해제해야 합니다.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::StagedFile;

/// 미리보기 URL의 경로 접두사 — main.rs에서 ServeDir를 이 경로에 붙입니다.
pub const PREVIEW_PREFIX: &str = "/previews";

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 파일 하나를 채우기 세션 디렉토리에 저장하고 미리보기 URL을 발급합니다.
    ///
    /// 디스크 파일명은 "<uuid>-<slug>.<ext>" 형태입니다.
    /// 원래 파일명은 `StagedFile::name`에 그대로 남습니다.
    pub async fn stage(
        &self,
        fill_id: Uuid,
        name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StagedFile, AppError> {
        let dir = self.root.join(fill_id.to_string());
        fs::create_dir_all(&dir).await?;

        let file_name = disk_name(name);
        let relative = format!("{fill_id}/{file_name}");
        fs::write(self.root.join(&relative), bytes).await?;

        tracing::debug!(%fill_id, name, size = bytes.len(), "staged upload");

        Ok(StagedFile {
            name: name.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
            preview_url: format!("{PREVIEW_PREFIX}/{relative}"),
            stored_path: relative,
        })
    }

    /// 스테이징된 파일의 내용을 읽습니다 (제출 직전).
    pub async fn read(&self, file: &StagedFile) -> Result<Vec<u8>, AppError> {
        Ok(fs::read(self.root.join(&file.stored_path)).await?)
    }

    /// 파일 하나를 해제합니다. 이미 없으면 조용히 넘어갑니다.
    pub async fn revoke(&self, file: &StagedFile) -> Result<(), AppError> {
        match fs::remove_file(self.root.join(&file.stored_path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// 여러 파일을 해제합니다. 실패는 로그만 남기고 계속 진행합니다.
    pub async fn revoke_all(&self, files: &[StagedFile]) {
        for file in files {
            if let Err(e) = self.revoke(file).await {
                tracing::warn!(path = %file.stored_path, error = %e, "failed to revoke staged upload");
            }
        }
    }

    /// 채우기 세션 디렉토리를 통째로 지웁니다.
    pub async fn teardown(&self, fill_id: Uuid) -> Result<(), AppError> {
        match fs::remove_dir_all(self.root.join(fill_id.to_string())).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// 원래 파일명에서 디스크에 안전한 이름을 만듭니다.
///
/// slug는 비ASCII 문자를 음역하므로 결과는 항상 ASCII입니다.
/// 예: "Wedding Photo.JPG" → "<uuid>-wedding-photo.jpg"
fn disk_name(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(slug::slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "upload".to_string());
    let id = Uuid::now_v7().simple();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{id}-{stem}.{}", slug::slugify(ext)),
        None => format!("{id}-{stem}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stage_read_revoke() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let fill_id = Uuid::now_v7();

        let file = store
            .stage(fill_id, "前撮り 1.JPG", "image/jpeg", b"jpeg-bytes")
            .await
            .unwrap();
        assert_eq!(file.name, "前撮り 1.JPG");
        assert_eq!(file.size, 10);
        assert!(file.preview_url.starts_with(&format!("/previews/{fill_id}/")));
        assert!(file.stored_path.ends_with(".jpg"));
        assert_eq!(store.read(&file).await.unwrap(), b"jpeg-bytes");

        store.revoke(&file).await.unwrap();
        assert!(store.read(&file).await.is_err());
        // 두 번 해제해도 에러가 아닙니다.
        store.revoke(&file).await.unwrap();
    }

    #[tokio::test]
    async fn teardown_removes_session_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let fill_id = Uuid::now_v7();
        store.stage(fill_id, "a.png", "image/png", b"1").await.unwrap();
        store.stage(fill_id, "b.png", "image/png", b"2").await.unwrap();

        store.teardown(fill_id).await.unwrap();
        assert!(!dir.path().join(fill_id.to_string()).exists());
        store.teardown(fill_id).await.unwrap();
    }

    #[test]
    fn disk_name_keeps_extension_without_path_parts() {
        let name = disk_name("../../etc/passwd");
        assert!(!name.contains('/'));
        assert!(name.ends_with("-passwd"));
        assert!(disk_name("").ends_with("-upload"));
    }
}
