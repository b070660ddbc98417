use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::OrderStatus;
use crate::{order_item, subscriber};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Seller.
    pub subscriber_id: Uuid,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub payment_method: String,
    pub status: String,
    pub total_cents: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Subscriber, Items }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Subscriber => Entity::belongs_to(subscriber::Entity)
                .from(Column::SubscriberId)
                .to(subscriber::Column::Id)
                .into(),
            Relation::Items => Entity::has_many(order_item::Entity).into(),
        }
    }
}

impl Related<order_item::Entity> for Entity {
    fn to() -> RelationDef { Relation::Items.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn order_status(&self) -> Option<OrderStatus> {
        self.status.parse().ok()
    }
}

pub fn active_model(m: &Model) -> ActiveModel {
    ActiveModel {
        id: Set(m.id),
        subscriber_id: Set(m.subscriber_id),
        buyer_name: Set(m.buyer_name.clone()),
        buyer_email: Set(m.buyer_email.clone()),
        buyer_phone: Set(m.buyer_phone.clone()),
        shipping_address: Set(m.shipping_address.clone()),
        payment_method: Set(m.payment_method.clone()),
        status: Set(m.status.clone()),
        total_cents: Set(m.total_cents),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}
