//! File-backed session store
//!
//! Persists sessions as one JSON object mapping phone numbers to sessions.
//! Writes are read-modify-write over the whole file, serialized by an
//! internal mutex, and land via temp-file + rename so a crash mid-write
//! cannot corrupt the file. The file carries bearer tokens, so it is
//! created with owner-only permissions on Unix.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::auth::Session;
use crate::error::{LkdrError, Result};
use crate::providers::SessionStore;

/// [`SessionStore`] over a single JSON file.
///
/// Suitable for CLI tools and single-process services; concurrent stores
/// pointed at the same file are not coordinated.
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at the platform config directory (`lkdr/sessions.json`)
    #[must_use]
    pub fn default_path() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lkdr");
        Self::new(dir.join("sessions.json"))
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, Session>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| LkdrError::storage(format!("decode session file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(LkdrError::storage(format!("read session file: {e}"))),
        }
    }

    async fn write_all(&self, sessions: &HashMap<String, Session>) -> Result<()> {
        let json = serde_json::to_string_pretty(sessions)
            .map_err(|e| LkdrError::storage(format!("encode session file: {e}")))?;

        let dir = self
            .path
            .parent()
            .ok_or_else(|| LkdrError::storage("session file path has no parent directory"))?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| LkdrError::storage(format!("create session directory: {e}")))?;

        let tmp_path = dir.join(format!(".sessions.tmp.{}", std::process::id()));
        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| LkdrError::storage(format!("write temp session file: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, perms)
                .await
                .map_err(|e| LkdrError::storage(format!("set session file permissions: {e}")))?;
        }

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| LkdrError::storage(format!("rename temp session file: {e}")))?;

        tracing::debug!(path = %self.path.display(), "persisted sessions");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, phone: &str) -> Result<Option<Session>> {
        let sessions = self.read_all().await?;
        Ok(sessions.get(phone).cloned())
    }

    async fn persist(&self, phone: &str, session: Option<&Session>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.read_all().await?;
        match session {
            Some(session) => {
                sessions.insert(phone.to_string(), session.clone());
            }
            None => {
                sessions.remove(phone);
            }
        }
        self.write_all(&sessions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};

    use crate::types::DateTimeTz;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.into(),
            access_token_expires_at: DateTimeTz(Utc::now() + TimeDelta::hours(1)),
            refresh_token: "rt".into(),
            refresh_token_expires_at: Some(DateTimeTz(Utc::now() + TimeDelta::days(30))),
        }
    }

    #[tokio::test]
    async fn missing_file_means_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions.json"));
        assert!(store.load("+7999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn persist_and_reload_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sessions.json");

        let store = FileSessionStore::new(&path);
        store.persist("+7999", Some(&session("at-1"))).await.unwrap();

        // A fresh store instance sees the durable state
        let store2 = FileSessionStore::new(&path);
        let loaded = store2.load("+7999").await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "at-1");
        assert!(store2.load("+7000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn persist_none_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions.json"));

        store.persist("+7999", Some(&session("at-1"))).await.unwrap();
        store.persist("+7000", Some(&session("at-2"))).await.unwrap();
        store.persist("+7999", None).await.unwrap();

        assert!(store.load("+7999").await.unwrap().is_none());
        assert!(store.load("+7000").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn whole_entry_replace() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions.json"));

        store.persist("+7999", Some(&session("old"))).await.unwrap();
        let mut renewed = session("new");
        renewed.refresh_token_expires_at = None;
        store.persist("+7999", Some(&renewed)).await.unwrap();

        let loaded = store.load("+7999").await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "new");
        assert!(loaded.refresh_token_expires_at.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        let store = FileSessionStore::new(&path);
        store.persist("+7999", Some(&session("at"))).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "session file must be 0600, got {mode:o}");
    }

    #[tokio::test]
    async fn concurrent_persists_do_not_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            std::sync::Arc::new(FileSessionStore::new(dir.path().join("sessions.json")));

        let mut handles = vec![];
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .persist(&format!("+7{i:03}"), Some(&session(&format!("at-{i}"))))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..10 {
            assert!(store.load(&format!("+7{i:03}")).await.unwrap().is_some());
        }
    }
}
