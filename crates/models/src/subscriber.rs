use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{PlanType, ProfileType, SubscriberStatus};
use crate::errors::ModelError;
use crate::schema::SchemaTolerant;
use crate::{category, tenant, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscribers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_type: String,
    pub plan_type: String,
    pub status: String,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub views: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Tenant, User, Category }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Tenant => Entity::belongs_to(tenant::Entity).from(Column::TenantId).to(tenant::Column::Id).into(),
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
            Relation::Category => Entity::belongs_to(category::Entity).from(Column::CategoryId).to(category::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Unknown plan strings are treated as the free tier.
    pub fn plan(&self) -> PlanType {
        self.plan_type.parse().unwrap_or_default()
    }

    pub fn profile(&self) -> Option<ProfileType> {
        self.profile_type.parse().ok()
    }

    pub fn is_active(&self) -> bool {
        self.status.parse::<SubscriberStatus>() == Ok(SubscriberStatus::Active)
    }
}

impl SchemaTolerant for Model {
    const TABLE: &'static str = "subscribers";
    const OPTIONAL_COLUMNS: &'static [&'static str] = &["category_id", "description"];

    fn clear_column(&mut self, column: &str) {
        match column {
            "category_id" => self.category_id = None,
            "description" => self.description = None,
            _ => {}
        }
    }

    fn copy_column(&mut self, source: &Self, column: &str) {
        match column {
            "category_id" => self.category_id = source.category_id,
            "description" => self.description = source.description.clone(),
            _ => {}
        }
    }

    fn column_default(column: &str) -> Option<sea_orm::Value> {
        match column {
            "category_id" => Some(Option::<Uuid>::None.into()),
            "description" => Some(Option::<String>::None.into()),
            _ => None,
        }
    }
}

pub fn active_model(m: &Model) -> ActiveModel {
    ActiveModel {
        id: Set(m.id),
        tenant_id: Set(m.tenant_id),
        user_id: Set(m.user_id),
        name: Set(m.name.clone()),
        email: Set(m.email.clone()),
        phone: Set(m.phone.clone()),
        profile_type: Set(m.profile_type.clone()),
        plan_type: Set(m.plan_type.clone()),
        status: Set(m.status.clone()),
        category_id: Set(m.category_id),
        slug: Set(m.slug.clone()),
        description: Set(m.description.clone()),
        views: Set(m.views),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    crate::validation::validate_name(&m.name)?;
    crate::validation::validate_email(&m.email)?;
    if let Some(phone) = &m.phone {
        crate::validation::validate_phone(phone)?;
    }
    m.profile_type.parse::<ProfileType>().map_err(ModelError::Validation)?;
    m.plan_type.parse::<PlanType>().map_err(ModelError::Validation)?;
    Ok(())
}
