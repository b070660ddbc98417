use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::{category, CategoryType};

use super::repository::CategoryRepository;
use crate::errors::ServiceError;
use crate::schema::{insert_tolerant, missing_column, update_tolerant};
use crate::slug::insert_with_unique_slug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<CategoryType>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub order_index: i32,
    pub is_active: Option<bool>,
}

/// A top-level category with its direct children.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: category::Model,
    pub children: Vec<category::Model>,
}

pub struct CategoryService<R: CategoryRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: CategoryRepository + ?Sized> CategoryService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    pub async fn get(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("category"))
    }

    /// Active categories of one type. When the table lacks one of the
    /// filtered columns every row is fetched and filtered here instead:
    /// rows without a type are kept, inactive rows are dropped.
    #[instrument(skip(self))]
    pub async fn get_categories_by_type(&self, kind: CategoryType) -> Result<Vec<category::Model>, ServiceError> {
        let err = match self.repo.list_active(Some(kind)).await {
            Ok(rows) => return Ok(rows),
            Err(e) => e,
        };
        let Some(column) = err.db_message().and_then(missing_column) else { return Err(err) };
        warn!(column = %column, "category query failed on missing column; filtering locally");
        common::metrics::record_schema_fallback("categories", &column);

        let mut rows: Vec<_> = self
            .repo
            .list_all_raw()
            .await?
            .into_iter()
            .filter(|c| c.is_active && c.kind.as_deref().map_or(true, |k| k == kind.as_str()))
            .collect();
        rows.sort_by(|a, b| a.order_index.cmp(&b.order_index).then_with(|| a.name.cmp(&b.name)));
        Ok(rows)
    }

    pub async fn list_all(&self) -> Result<Vec<category::Model>, ServiceError> {
        self.repo.list_active(None).await
    }

    /// One level of nesting: parents with their children. Children whose
    /// parent is not in the list are shown at the top level.
    pub async fn tree(&self, kind: CategoryType) -> Result<Vec<CategoryNode>, ServiceError> {
        let rows = self.get_categories_by_type(kind).await?;
        let (roots, children): (Vec<_>, Vec<_>) = rows.into_iter().partition(|c| c.parent_id.is_none());
        let mut nodes: Vec<CategoryNode> =
            roots.into_iter().map(|category| CategoryNode { category, children: Vec::new() }).collect();
        for child in children {
            match nodes.iter_mut().find(|n| Some(n.category.id) == child.parent_id) {
                Some(node) => node.children.push(child),
                None => nodes.push(CategoryNode { category: child, children: Vec::new() }),
            }
        }
        Ok(nodes)
    }

    async fn check_parent(&self, id: Option<Uuid>, input: &CategoryInput) -> Result<(), ServiceError> {
        let Some(parent_id) = input.parent_id else { return Ok(()) };
        if Some(parent_id) == id {
            return Err(ServiceError::Validation("category cannot be its own parent".into()));
        }
        let parent = self
            .repo
            .get(parent_id)
            .await?
            .ok_or_else(|| ServiceError::Validation("parent category does not exist".into()))?;
        if parent.parent_id.is_some() {
            return Err(ServiceError::Validation("categories nest one level only".into()));
        }
        if input.kind.is_some() && parent.category_type().is_some() && parent.category_type() != input.kind {
            return Err(ServiceError::Validation("parent category has a different type".into()));
        }
        Ok(())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CategoryInput) -> Result<category::Model, ServiceError> {
        self.check_parent(None, &input).await?;
        let now = Utc::now().into();
        let created = insert_with_unique_slug(&*self.repo, "categories", &input.name, |slug| {
            let row = category::Model {
                id: Uuid::new_v4(),
                name: input.name.trim().to_string(),
                slug,
                kind: input.kind.map(|k| k.as_str().to_string()),
                parent_id: input.parent_id,
                order_index: input.order_index,
                is_active: input.is_active.unwrap_or(true),
                created_at: now,
                updated_at: now,
            };
            let repo = self.repo.clone();
            async move {
                category::validate(&row)?;
                insert_tolerant(&*repo, row).await
            }
        })
        .await?;
        info!(id = %created.id, slug = %created.slug, "category created");
        Ok(created)
    }

    /// Slug stays as created so existing links keep working.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: CategoryInput) -> Result<category::Model, ServiceError> {
        let current = self.get(id).await?;
        self.check_parent(Some(id), &input).await?;
        let mut next = current.clone();
        next.name = input.name.trim().to_string();
        next.kind = input.kind.map(|k| k.as_str().to_string());
        next.parent_id = input.parent_id;
        next.order_index = input.order_index;
        if let Some(active) = input.is_active {
            next.is_active = active;
        }
        next.updated_at = Utc::now().into();
        category::validate(&next)?;
        update_tolerant(&*self.repo, &current, next).await
    }

    /// Soft delete.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        let current = self.get(id).await?;
        let mut next = current.clone();
        next.is_active = false;
        next.updated_at = Utc::now().into();
        let stored = update_tolerant(&*self.repo, &current, next).await?;
        info!(id = %id, active = stored.is_active, "category deactivated");
        Ok(stored)
    }
}
