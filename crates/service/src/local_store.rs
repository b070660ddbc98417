//! File-backed demo collections (`ppo_*`) edited from the admin panel.
//!
//! Each collection is a JSON file under the data directory holding free-form
//! objects; the server assigns `id`, `created_at` and `updated_at`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalCollection {
    Companies,
    Professionals,
    BlogPosts,
    Team,
    Jobs,
}

impl LocalCollection {
    pub const ALL: [LocalCollection; 5] = [
        LocalCollection::Companies,
        LocalCollection::Professionals,
        LocalCollection::BlogPosts,
        LocalCollection::Team,
        LocalCollection::Jobs,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LocalCollection::Companies => "ppo_companies",
            LocalCollection::Professionals => "ppo_professionals",
            LocalCollection::BlogPosts => "ppo_blog_posts",
            LocalCollection::Team => "ppo_team",
            LocalCollection::Jobs => "ppo_jobs",
        }
    }
}

impl FromStr for LocalCollection {
    type Err = ServiceError;

    /// Accepts the storage key (`ppo_jobs`) or the bare name (`jobs`, `blog-posts`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches("ppo_").replace('-', "_");
        LocalCollection::ALL
            .into_iter()
            .find(|c| c.key().trim_start_matches("ppo_") == name)
            .ok_or_else(|| ServiceError::not_found("collection"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const RESERVED: [&str; 3] = ["id", "created_at", "updated_at"];

fn into_fields(data: Value) -> Result<Map<String, Value>, ServiceError> {
    let Value::Object(mut map) = data else {
        return Err(ServiceError::Validation("record must be a JSON object".into()));
    };
    for key in RESERVED {
        map.remove(key);
    }
    Ok(map)
}

pub struct LocalStore {
    dir: PathBuf,
    collections: HashMap<LocalCollection, Arc<JsonMapStore<Uuid, LocalRecord>>>,
}

impl LocalStore {
    /// Open (or create) every collection file under `dir`.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let dir = dir.as_ref().to_path_buf();
        let mut collections = HashMap::new();
        for c in LocalCollection::ALL {
            let store = JsonMapStore::open(dir.join(format!("{}.json", c.key()))).await?;
            collections.insert(c, store);
        }
        info!(dir = %dir.display(), "local collections opened");
        Ok(Self { dir, collections })
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn store(&self, c: LocalCollection) -> Result<&JsonMapStore<Uuid, LocalRecord>, ServiceError> {
        self.collections
            .get(&c)
            .map(Arc::as_ref)
            .ok_or_else(|| ServiceError::not_found("collection"))
    }

    /// Oldest first.
    pub async fn list(&self, c: LocalCollection) -> Result<Vec<LocalRecord>, ServiceError> {
        let mut rows = self.store(c)?.values().await;
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    pub async fn get(&self, c: LocalCollection, id: Uuid) -> Result<LocalRecord, ServiceError> {
        self.store(c)?.get(&id).await.ok_or_else(|| ServiceError::not_found("record"))
    }

    pub async fn create(&self, c: LocalCollection, data: Value) -> Result<LocalRecord, ServiceError> {
        let now = Utc::now();
        let record = LocalRecord { id: Uuid::new_v4(), data: into_fields(data)?, created_at: now, updated_at: now };
        self.store(c)?.insert(record.id, record.clone()).await?;
        info!(collection = c.key(), id = %record.id, "local record created");
        Ok(record)
    }

    /// Shallow merge: keys in `data` overwrite, a `null` value removes the key.
    pub async fn update(&self, c: LocalCollection, id: Uuid, data: Value) -> Result<LocalRecord, ServiceError> {
        let patch = into_fields(data)?;
        let updated = self
            .store(c)?
            .update(&id, |old| {
                let mut next = old.clone();
                for (k, v) in &patch {
                    if v.is_null() {
                        next.data.remove(k);
                    } else {
                        next.data.insert(k.clone(), v.clone());
                    }
                }
                next.updated_at = Utc::now();
                next
            })
            .await?;
        updated.ok_or_else(|| ServiceError::not_found("record"))
    }

    pub async fn delete(&self, c: LocalCollection, id: Uuid) -> Result<(), ServiceError> {
        if !self.store(c)?.remove(&id).await? {
            return Err(ServiceError::not_found("record"));
        }
        info!(collection = c.key(), id = %id, "local record deleted");
        Ok(())
    }
}
