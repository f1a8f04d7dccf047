//! On-disk document store: raw uploaded files, one per filename.
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! listing never shows a half-written document. A second upload under the
//! same name replaces the first (last write wins).

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::IngestError;

const TEMP_PREFIX: &str = ".docqa-upload-";

#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Reduce a client-supplied filename to a bare file name.
    ///
    /// Directory components are dropped so uploads cannot escape the store.
    pub fn sanitize_name(filename: &str) -> Result<String, IngestError> {
        let name = Path::new(filename.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| IngestError::InvalidFilename(filename.to_string()))?;
        if name.starts_with(TEMP_PREFIX) {
            return Err(IngestError::InvalidFilename(filename.to_string()));
        }
        Ok(name)
    }

    /// Write `bytes` as `name`. Returns `true` if an existing file was replaced.
    pub async fn save(&self, name: &str, bytes: &[u8]) -> io::Result<bool> {
        self.ensure_dir().await?;
        let target = self.dir.join(name);
        let existed = tokio::fs::try_exists(&target).await.unwrap_or(false);

        let temp = self.dir.join(format!("{}{}", TEMP_PREFIX, Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&temp, bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        Ok(existed)
    }

    /// Names of the regular files in the store, sorted.
    pub async fn list(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_plain_names() {
        assert_eq!(DocumentStore::sanitize_name("notes.txt").unwrap(), "notes.txt");
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(
            DocumentStore::sanitize_name("../../etc/passwd.txt").unwrap(),
            "passwd.txt"
        );
        assert_eq!(
            DocumentStore::sanitize_name("/tmp/report.pdf").unwrap(),
            "report.pdf"
        );
    }

    #[test]
    fn test_sanitize_rejects_empty_and_dots() {
        assert!(DocumentStore::sanitize_name("").is_err());
        assert!(DocumentStore::sanitize_name("..").is_err());
        assert!(DocumentStore::sanitize_name(".docqa-upload-x.txt").is_err());
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("docs"));

        assert!(store.list().await.unwrap().is_empty());

        assert!(!store.save("b.txt", b"bee").await.unwrap());
        assert!(!store.save("a.pdf", b"%PDF").await.unwrap());
        std::fs::create_dir_all(store.dir().join("subdir")).unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a.pdf", "b.txt"]);
    }

    #[tokio::test]
    async fn test_save_overwrites_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        store.save("a.txt", b"first").await.unwrap();
        assert!(store.save("a.txt", b"second").await.unwrap());

        let content = std::fs::read(dir.path().join("a.txt")).unwrap();
        assert_eq!(content, b"second");
        assert_eq!(store.list().await.unwrap(), vec!["a.txt"]);
    }
}
