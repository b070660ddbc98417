use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::schema::SchemaTolerant;
use crate::{category, tenant, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub location: Option<String>,
    pub cover_image: Option<String>,
    pub starts_at: DateTimeWithTimeZone,
    pub ends_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "JsonBinary")]
    #[serde(default = "crate::empty_array")]
    pub gallery: Json,
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
    const TABLE: &'static str = "events";
    const OPTIONAL_COLUMNS: &'static [&'static str] = &["gallery", "is_active"];

    fn clear_column(&mut self, column: &str) {
        match column {
            "gallery" => self.gallery = crate::empty_array(),
            "is_active" => self.is_active = true,
            _ => {}
        }
    }

    fn copy_column(&mut self, source: &Self, column: &str) {
        match column {
            "gallery" => self.gallery = source.gallery.clone(),
            "is_active" => self.is_active = source.is_active,
            _ => {}
        }
    }

    fn column_default(column: &str) -> Option<sea_orm::Value> {
        match column {
            "gallery" => Some(crate::empty_array().into()),
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
        description: Set(m.description.clone()),
        location: Set(m.location.clone()),
        cover_image: Set(m.cover_image.clone()),
        starts_at: Set(m.starts_at),
        ends_at: Set(m.ends_at),
        gallery: Set(m.gallery.clone()),
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
    if let Some(ends_at) = m.ends_at {
        if ends_at < m.starts_at {
            return Err(ModelError::Validation("event ends before it starts".into()));
        }
    }
    crate::validate_string_array(&m.gallery, "gallery")?;
    Ok(())
}
