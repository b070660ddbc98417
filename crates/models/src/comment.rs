use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{CommentStatus, CommentTarget};
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub target_type: String,
    pub target_id: Uuid,
    pub author_name: String,
    pub author_email: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub status: String,
    pub moderated_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_approved(&self) -> bool {
        self.status.parse::<CommentStatus>() == Ok(CommentStatus::Approved)
    }
}

pub fn active_model(m: &Model) -> ActiveModel {
    ActiveModel {
        id: Set(m.id),
        target_type: Set(m.target_type.clone()),
        target_id: Set(m.target_id),
        author_name: Set(m.author_name.clone()),
        author_email: Set(m.author_email.clone()),
        body: Set(m.body.clone()),
        status: Set(m.status.clone()),
        moderated_at: Set(m.moderated_at),
        created_at: Set(m.created_at),
    }
}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    m.target_type.parse::<CommentTarget>().map_err(ModelError::Validation)?;
    crate::validation::validate_name(&m.author_name)?;
    crate::validation::validate_email(&m.author_email)?;
    let len = m.body.trim().chars().count();
    if len == 0 {
        return Err(ModelError::Validation("comment body required".into()));
    }
    if len > 2000 {
        return Err(ModelError::Validation("comment too long (<=2000)".into()));
    }
    Ok(())
}
