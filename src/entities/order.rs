use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, message = "Customer name must not be empty"))]
    pub customer_name: String,

    #[validate(length(min = 1, message = "Customer phone must not be empty"))]
    pub customer_phone: String,

    pub customer_address: Option<String>,
    pub order_date: NaiveDate,
    pub rental_start_date: NaiveDate,
    pub rental_end_date: NaiveDate,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

// Timestamps are set explicitly by the service layer so that item
// insertion order survives the created_at sort.
impl ActiveModelBehavior for ActiveModel {}
