//! JSON-file history store

use super::{ChatEntry, HistoryStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// History persisted as a pretty-printed JSON array
///
/// Every append re-reads the file, pushes the entry and rewrites the whole
/// array. Writes from one process go through `write_lock` and land via a
/// temp file + rename, so concurrent appends never drop entries and a crash
/// mid-write leaves the previous file intact.
pub struct JsonFileHistory {
    path: PathBuf,
    backup: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl JsonFileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Also mirror every write to `backup`, read when the primary is empty
    pub fn with_backup(mut self, backup: Option<PathBuf>) -> Self {
        self.backup = backup;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(path: &Path) -> Vec<ChatEntry> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("No history at {}: {}", path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Ignoring unreadable history {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    async fn write_entries(path: &Path, entries: &[ChatEntry]) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)?;
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || write_atomic(&path, &content)).await?
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl HistoryStore for JsonFileHistory {
    async fn load(&self) -> Vec<ChatEntry> {
        let entries = Self::read_entries(&self.path).await;
        if !entries.is_empty() {
            return entries;
        }
        match &self.backup {
            Some(backup) => Self::read_entries(backup).await,
            None => entries,
        }
    }

    async fn append(&self, entry: ChatEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await;
        entries.push(entry);
        Self::write_entries(&self.path, &entries).await?;

        if let Some(backup) = &self.backup {
            if let Err(e) = Self::write_entries(backup, &entries).await {
                tracing::warn!("Failed to mirror history to {}: {}", backup.display(), e);
            }
        }

        tracing::debug!("History now has {} entries", entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileHistory::new(dir.path().join("chatHistory.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chatHistory.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = JsonFileHistory::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_appends_persist_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("chatHistory.json");
        let store = JsonFileHistory::new(&path);

        for i in 0..7 {
            store.append(ChatEntry::you(format!("msg {}", i))).await.unwrap();
        }

        let raw = std::fs::read_to_string(&path).unwrap();
        let on_disk: Vec<ChatEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk.len(), 7);
        for (i, entry) in on_disk.iter().enumerate() {
            assert_eq!(entry.text, format!("msg {}", i));
        }
        // pretty-printed
        assert!(raw.contains("\n  {"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileHistory::new(dir.path().join("chatHistory.json")));

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(ChatEntry::twin(format!("reply {}", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.len(), 20);
    }

    #[tokio::test]
    async fn test_backup_used_when_primary_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chatHistory.json");
        let backup = dir.path().join("chatHistory.backup.json");
        let store = JsonFileHistory::new(&path).with_backup(Some(backup.clone()));

        store.append(ChatEntry::you("kept")).await.unwrap();
        assert!(backup.exists());

        std::fs::write(&path, "garbage").unwrap();
        assert_eq!(store.load().await, vec![ChatEntry::you("kept")]);

        store.append(ChatEntry::twin("after")).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let on_disk: Vec<ChatEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk.len(), 2);
    }

    #[tokio::test]
    async fn test_append_continues_backup_when_primary_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chatHistory.json");
        let backup = dir.path().join("chatHistory.backup.json");
        std::fs::write(&path, "[]").unwrap();
        std::fs::write(
            &backup,
            serde_json::to_string(&vec![ChatEntry::you("old question")]).unwrap(),
        )
        .unwrap();
        let store = JsonFileHistory::new(&path).with_backup(Some(backup.clone()));

        store.append(ChatEntry::twin("new answer")).await.unwrap();

        let expected = vec![ChatEntry::you("old question"), ChatEntry::twin("new answer")];
        for file in [&path, &backup] {
            let on_disk: Vec<ChatEntry> =
                serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
            assert_eq!(on_disk, expected);
        }
    }
}
