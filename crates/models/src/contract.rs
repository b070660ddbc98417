use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::ContractStatus;
use crate::subscriber;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub from_plan: String,
    pub to_plan: String,
    pub payment_method: String,
    pub amount_cents: i64,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub activated_at: Option<DateTimeWithTimeZone>,
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

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn contract_status(&self) -> Option<ContractStatus> {
        self.status.parse().ok()
    }
}

pub fn active_model(m: &Model) -> ActiveModel {
    ActiveModel {
        id: Set(m.id),
        subscriber_id: Set(m.subscriber_id),
        from_plan: Set(m.from_plan.clone()),
        to_plan: Set(m.to_plan.clone()),
        payment_method: Set(m.payment_method.clone()),
        amount_cents: Set(m.amount_cents),
        status: Set(m.status.clone()),
        created_at: Set(m.created_at),
        activated_at: Set(m.activated_at),
    }
}
