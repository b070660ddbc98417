use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::subscriber;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub promo_price_cents: Option<i64>,
    pub is_promotion: bool,
    pub stock: i32,
    /// JSON array of tag strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Subscriber }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Subscriber => Entity::belongs_to(subscriber::Entity)
                .from(Column::SubscriberId)
                .to(subscriber::Column::Id)
                .into(),
        }
    }
}

impl Related<subscriber::Entity> for Entity {
    fn to() -> RelationDef { Relation::Subscriber.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Price charged at checkout: the promotional price while the promotion flag is on.
    pub fn effective_price_cents(&self) -> i64 {
        match (self.is_promotion, self.promo_price_cents) {
            (true, Some(promo)) => promo,
            _ => self.price_cents,
        }
    }
}

pub fn active_model(m: &Model) -> ActiveModel {
    ActiveModel {
        id: Set(m.id),
        subscriber_id: Set(m.subscriber_id),
        name: Set(m.name.clone()),
        slug: Set(m.slug.clone()),
        description: Set(m.description.clone()),
        price_cents: Set(m.price_cents),
        promo_price_cents: Set(m.promo_price_cents),
        is_promotion: Set(m.is_promotion),
        stock: Set(m.stock),
        tags: Set(m.tags.clone()),
        is_active: Set(m.is_active),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    crate::validation::validate_name(&m.name)?;
    crate::validation::validate_price_cents(m.price_cents)?;
    if let Some(promo) = m.promo_price_cents {
        crate::validation::validate_price_cents(promo)?;
        if promo >= m.price_cents {
            return Err(ModelError::Validation("promo price must be below the regular price".into()));
        }
    }
    if m.is_promotion && m.promo_price_cents.is_none() {
        return Err(ModelError::Validation("promotion requires a promo price".into()));
    }
    if m.stock < 0 {
        return Err(ModelError::Validation("stock must be >= 0".into()));
    }
    crate::validate_string_array(&m.tags, "tags")?;
    Ok(())
}
