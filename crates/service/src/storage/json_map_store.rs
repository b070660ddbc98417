use std::{collections::HashMap, hash::Hash, path::{Path, PathBuf}, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::warn;

use crate::errors::ServiceError;

/// JSON file-backed key-value map.
///
/// The whole map lives in memory and is rewritten to disk after every
/// mutation (write to a sibling temp file, then rename).
pub struct JsonMapStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
    file_path: PathBuf,
}

fn io_err(path: &Path, e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Db(format!("{}: {}", path.display(), e))
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Load the map from `path`, creating an empty file if it does not exist.
    /// A file that does not parse is treated as empty and left untouched until the next write.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_err(parent, e))?;
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), error = %e, "unreadable store file; starting empty");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<K, V> = HashMap::new();
                let data = serde_json::to_vec(&empty).map_err(|e| io_err(&file_path, e))?;
                fs::write(&file_path, data).await.map_err(|e| io_err(&file_path, e))?;
                empty
            }
            Err(e) => return Err(io_err(&file_path, e)),
        };

        Ok(Arc::new(Self { inner: RwLock::new(map), file_path }))
    }

    pub fn path(&self) -> &Path { &self.file_path }

    async fn persist(&self, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(map).map_err(|e| io_err(&self.file_path, e))?;
        let tmp = self.file_path.with_extension("json.tmp");
        fs::write(&tmp, data).await.map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, &self.file_path).await.map_err(|e| io_err(&self.file_path, e))?;
        Ok(())
    }

    pub async fn values(&self) -> Vec<V> {
        self.inner.read().await.values().cloned().collect()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        map.insert(key, value);
        self.persist(&map).await
    }

    /// Replace the value under `key` with `f(old)`; `None` if the key is absent.
    pub async fn update<F>(&self, key: &K, f: F) -> Result<Option<V>, ServiceError>
    where
        F: FnOnce(&V) -> V,
    {
        let mut map = self.inner.write().await;
        let Some(old) = map.get(key) else { return Ok(None) };
        let next = f(old);
        map.insert(key.clone(), next.clone());
        self.persist(&map).await?;
        Ok(Some(next))
    }

    /// Remove a key; returns whether it existed.
    pub async fn remove(&self, key: &K) -> Result<bool, ServiceError> {
        let mut map = self.inner.write().await;
        let existed = map.remove(key).is_some();
        if existed {
            self.persist(&map).await?;
        }
        Ok(existed)
    }
}
