use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::CategoryType;
use crate::errors::ModelError;
use crate::schema::SchemaTolerant;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default = "crate::default_true")]
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Parent }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Parent => Entity::belongs_to(Entity)
                .from(Column::ParentId)
                .to(Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// `None` when the column is absent or holds a value this build does not know.
    pub fn category_type(&self) -> Option<CategoryType> {
        self.kind.as_deref().and_then(|k| k.parse().ok())
    }
}

impl SchemaTolerant for Model {
    const TABLE: &'static str = "categories";
    const OPTIONAL_COLUMNS: &'static [&'static str] = &["type", "parent_id", "order_index", "is_active"];

    fn clear_column(&mut self, column: &str) {
        match column {
            "type" => self.kind = None,
            "parent_id" => self.parent_id = None,
            "order_index" => self.order_index = 0,
            "is_active" => self.is_active = true,
            _ => {}
        }
    }

    fn copy_column(&mut self, source: &Self, column: &str) {
        match column {
            "type" => self.kind = source.kind.clone(),
            "parent_id" => self.parent_id = source.parent_id,
            "order_index" => self.order_index = source.order_index,
            "is_active" => self.is_active = source.is_active,
            _ => {}
        }
    }

    fn column_default(column: &str) -> Option<sea_orm::Value> {
        match column {
            "type" => Some(Option::<String>::None.into()),
            "parent_id" => Some(Option::<Uuid>::None.into()),
            "order_index" => Some(0i32.into()),
            "is_active" => Some(true.into()),
            _ => None,
        }
    }
}

pub fn active_model(m: &Model) -> ActiveModel {
    ActiveModel {
        id: Set(m.id),
        name: Set(m.name.clone()),
        slug: Set(m.slug.clone()),
        kind: Set(m.kind.clone()),
        parent_id: Set(m.parent_id),
        order_index: Set(m.order_index),
        is_active: Set(m.is_active),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    crate::validation::validate_name(&m.name)?;
    if let Some(kind) = &m.kind {
        kind.parse::<CategoryType>().map_err(ModelError::Validation)?;
    }
    if m.parent_id == Some(m.id) {
        return Err(ModelError::Validation("category cannot be its own parent".into()));
    }
    Ok(())
}
