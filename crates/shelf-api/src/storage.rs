//! 로컬 디스크 표지 저장소.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shelf_core::{CoverStorage, StorageError};

/// 업로드 디렉토리에 표지 파일을 씁니다.
///
/// 디렉토리가 없으면 첫 쓰기에서 생성합니다.
#[derive(Debug, Clone)]
pub struct LocalCoverStorage {
    root: PathBuf,
}

impl LocalCoverStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let is_plain = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\']);
        if !is_plain {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }
        Ok(self.root.join(file_name))
    }
}

#[async_trait]
impl CoverStorage for LocalCoverStorage {
    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(file_name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }
}
