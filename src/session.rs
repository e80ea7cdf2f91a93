use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::Result;

static SESSION_KEY: &str = "sessionid";

type Entries = HashMap<String, String>;

/// JSON-file backed key/value store for the TradingView session. Loaded
/// lazily on first access; a missing file starts the store empty. Cloning
/// shares the same in-memory state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    entries: Arc<Mutex<Option<Entries>>>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut slot = self.entries.lock().await;
        let entries = Self::loaded(&self.path, &mut slot).await?;
        Ok(entries.get(key).cloned())
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut slot = self.entries.lock().await;
        let entries = Self::loaded(&self.path, &mut slot).await?;
        entries.insert(key.to_owned(), value.to_owned());
        Self::save(&self.path, entries).await?;
        debug!(key, "session data updated");
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut slot = self.entries.lock().await;
        let entries = Self::loaded(&self.path, &mut slot).await?;
        entries.remove(key);
        Self::save(&self.path, entries).await?;
        debug!(key, "session data deleted");
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        let mut slot = self.entries.lock().await;
        let entries = slot.get_or_insert_with(Entries::new);
        entries.clear();
        Self::save(&self.path, entries).await?;
        info!("session storage cleared");
        Ok(())
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut slot = self.entries.lock().await;
        let entries = Self::loaded(&self.path, &mut slot).await?;
        Ok(entries.keys().cloned().collect())
    }

    pub async fn session_id(&self) -> Result<Option<String>> {
        self.get(SESSION_KEY).await
    }

    pub async fn set_session_id(&self, session_id: &str) -> Result<()> {
        self.set(SESSION_KEY, session_id).await
    }

    async fn loaded<'a>(path: &Path, slot: &'a mut Option<Entries>) -> Result<&'a mut Entries> {
        if slot.is_none() {
            let entries = match fs::read_to_string(path).await {
                Ok(content) => {
                    let entries = serde_json::from_str(&content)?;
                    info!(path = %path.display(), "session storage loaded");
                    entries
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no session file yet, starting empty");
                    Entries::new()
                }
                Err(e) => return Err(e.into()),
            };
            *slot = Some(entries);
        }
        match slot {
            Some(entries) => Ok(entries),
            None => unreachable!(),
        }
    }

    async fn save(path: &Path, entries: &Entries) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("session.json"))
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.session_id().await.unwrap(), None);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_session_id("abc123").await.unwrap();
        assert_eq!(store.session_id().await.unwrap().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        store_in(&dir).set_session_id("abc123").await.unwrap();

        let reopened = store_in(&dir);
        assert_eq!(
            reopened.session_id().await.unwrap().as_deref(),
            Some("abc123")
        );
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set("sessionid", "abc").await.unwrap();
        store.set("other", "value").await.unwrap();

        store.delete("other").await.unwrap();
        assert_eq!(store.get("other").await.unwrap(), None);

        store.clear().await.unwrap();
        assert_eq!(store.session_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = SessionStore::new(path);
        assert!(store.session_id().await.is_err());
    }
}
