use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::schema::SchemaTolerant;
use crate::{category, tenant, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "news")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub cover_image: Option<String>,
    /// JSON array of image URLs.
    #[sea_orm(column_type = "JsonBinary")]
    #[serde(default = "crate::empty_array")]
    pub gallery: Json,
    /// JSON array of `{ "title", "url" }` objects.
    #[sea_orm(column_type = "JsonBinary")]
    #[serde(default = "crate::empty_array")]
    pub related_links: Json,
    pub is_published: bool,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub views: i64,
    #[serde(default = "crate::default_true")]
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Tenant, Author, Category }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Tenant => Entity::belongs_to(tenant::Entity).from(Column::TenantId).to(tenant::Column::Id).into(),
            Relation::Author => Entity::belongs_to(user::Entity).from(Column::AuthorId).to(user::Column::Id).into(),
            Relation::Category => Entity::belongs_to(category::Entity).from(Column::CategoryId).to(category::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl SchemaTolerant for Model {
    const TABLE: &'static str = "news";
    const OPTIONAL_COLUMNS: &'static [&'static str] = &["gallery", "related_links", "is_active"];

    fn clear_column(&mut self, column: &str) {
        match column {
            "gallery" => self.gallery = crate::empty_array(),
            "related_links" => self.related_links = crate::empty_array(),
            "is_active" => self.is_active = true,
            _ => {}
        }
    }

    fn copy_column(&mut self, source: &Self, column: &str) {
        match column {
            "gallery" => self.gallery = source.gallery.clone(),
            "related_links" => self.related_links = source.related_links.clone(),
            "is_active" => self.is_active = source.is_active,
            _ => {}
        }
    }

    fn column_default(column: &str) -> Option<sea_orm::Value> {
        match column {
            "gallery" | "related_links" => Some(crate::empty_array().into()),
            "is_active" => Some(true.into()),
            _ => None,
        }
    }
}

pub fn active_model(m: &Model) -> ActiveModel {
    ActiveModel {
        id: Set(m.id),
        tenant_id: Set(m.tenant_id),
        author_id: Set(m.author_id),
        category_id: Set(m.category_id),
        title: Set(m.title.clone()),
        slug: Set(m.slug.clone()),
        excerpt: Set(m.excerpt.clone()),
        content: Set(m.content.clone()),
        cover_image: Set(m.cover_image.clone()),
        gallery: Set(m.gallery.clone()),
        related_links: Set(m.related_links.clone()),
        is_published: Set(m.is_published),
        published_at: Set(m.published_at),
        views: Set(m.views),
        is_active: Set(m.is_active),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    crate::validation::validate_title(&m.title)?;
    if m.content.trim().is_empty() {
        return Err(ModelError::Validation("content required".into()));
    }
    crate::validate_string_array(&m.gallery, "gallery")?;
    if !m.related_links.is_array() {
        return Err(ModelError::Validation("related_links must be an array".into()));
    }
    Ok(())
}
