use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use kj_core::traits::KeyValueStore;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Key-value store persisted as a single JSON object on disk.
///
/// Every mutation rewrites the whole document to a sibling temp file and
/// renames it over the original, so the file is always either the old or the
/// new state. The in-memory copy only changes after the rename succeeds.
pub struct LocalFileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl LocalFileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let entries: BTreeMap<String, String> = match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .with_context(|| format!("{} is not a JSON object of strings", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };

        info!(path = %path.display(), keys = entries.len(), "opened local store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let raw = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");

        fs::write(&tmp, &raw)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;

        debug!(path = %self.path.display(), bytes = raw.len(), "store persisted");
        Ok(())
    }

    async fn mutate<F>(&self, apply: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) + Send,
    {
        let mut guard = self.entries.write().await;
        let mut next = guard.clone();
        apply(&mut next);
        self.persist(&next).await?;
        *guard = next;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for LocalFileStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
        let key = key.to_string();
        self.mutate(move |entries| {
            entries.insert(key, value);
        })
        .await
    }

    async fn set_many(&self, batch: Vec<(String, String)>) -> anyhow::Result<()> {
        self.mutate(move |entries| entries.extend(batch)).await
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let key = key.to_string();
        self.mutate(move |entries| {
            entries.remove(&key);
        })
        .await
    }
}
