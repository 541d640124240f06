use crate::{
    db::DbPool,
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity},
    entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
    pricing,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Incoming order payload, shared by create and edit.
///
/// An edit submits the same shape as a create: the order's scalar fields
/// plus the complete set of line items that should exist afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderDraft {
    #[validate(length(min = 1, message = "customer name is required"))]
    #[schema(example = "Budi")]
    pub customer_name: String,

    #[validate(length(min = 1, message = "customer phone is required"))]
    #[schema(example = "0812xxx")]
    pub customer_phone: String,

    pub customer_address: Option<String>,

    /// Defaults to today when omitted on create; left unchanged when
    /// omitted on edit.
    pub order_date: Option<NaiveDate>,

    pub rental_start_date: NaiveDate,
    pub rental_end_date: NaiveDate,

    pub notes: Option<String>,

    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<OrderItemDraft>,
}

/// One rental line in an incoming order payload.
///
/// Subtotals are never accepted from the client; they are recomputed from
/// quantity, daily rate, and days on every save.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderItemDraft {
    #[validate(length(min = 1, message = "car type is required"))]
    #[schema(example = "Avanza")]
    pub car_type: String,

    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    #[schema(example = 2)]
    pub quantity: i32,

    #[validate(custom = "validate_daily_rate")]
    #[schema(example = "300000")]
    pub daily_rate: Decimal,

    #[validate(range(min = 1, message = "days must be at least 1"))]
    #[schema(example = 2)]
    pub days: i32,
}

fn validate_daily_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate < Decimal::ZERO {
        let mut err = ValidationError::new("daily_rate");
        err.message = Some("daily rate must not be negative".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub order_date: NaiveDate,
    pub rental_start_date: NaiveDate,
    pub rental_end_date: NaiveDate,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub car_type: String,
    pub quantity: i32,
    pub daily_rate: Decimal,
    pub days: i32,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Service for managing rental orders and their line items.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new order together with its line items.
    ///
    /// The order row and every item row are written in one transaction;
    /// a failure anywhere leaves no partial order behind.
    #[instrument(skip(self, draft), fields(customer_name = %draft.customer_name))]
    pub async fn create_order(&self, draft: OrderDraft) -> Result<OrderResponse, ServiceError> {
        Self::validate_draft(&draft)?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order_date = draft.order_date.unwrap_or_else(|| now.date_naive());

        let item_rows = Self::build_item_rows(order_id, &draft.items, now);
        let total_amount = pricing::order_total(item_rows.iter().map(|row| row.subtotal));

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order_active_model = OrderActiveModel {
            id: Set(order_id),
            customer_name: Set(draft.customer_name.clone()),
            customer_phone: Set(draft.customer_phone),
            customer_address: Set(draft.customer_address),
            order_date: Set(order_date),
            rental_start_date: Set(draft.rental_start_date),
            rental_end_date: Set(draft.rental_end_date),
            total_amount: Set(total_amount),
            notes: Set(draft.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let order_model = order_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order in database");
            ServiceError::DatabaseError(e)
        })?;

        OrderItemEntity::insert_many(item_rows.iter().cloned().map(order_item::ActiveModel::from))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to create order items in database");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            customer_name = %draft.customer_name,
            total_amount = %total_amount,
            item_count = item_rows.len(),
            "Order created successfully"
        );

        if let Err(e) = self.event_sender.send(Event::OrderCreated(order_id)).await {
            warn!(error = %e, order_id = %order_id, "Failed to send order created event");
        }

        Ok(Self::model_to_response(order_model, item_rows))
    }

    /// Retrieves an order with its items, ordered by item creation time.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order from database");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found");
                ServiceError::NotFound(format!("Order {}", order_id))
            })?;

        let items = self.fetch_items(order_id).await?;

        Ok(Self::model_to_response(order, items))
    }

    /// Lists all orders, newest order date first, each with its items.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let orders = OrderEntity::find()
            .order_by_desc(order::Column::OrderDate)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch orders from database");
                ServiceError::DatabaseError(e)
            })?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();

        if !order_ids.is_empty() {
            let items = OrderItemEntity::find()
                .filter(order_item::Column::OrderId.is_in(order_ids))
                .order_by_asc(order_item::Column::CreatedAt)
                .all(db)
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to fetch order items from database");
                    ServiceError::DatabaseError(e)
                })?;

            for item in items {
                items_by_order.entry(item.order_id).or_default().push(item);
            }
        }

        let responses: Vec<OrderResponse> = orders
            .into_iter()
            .map(|order_model| {
                let items = items_by_order.remove(&order_model.id).unwrap_or_default();
                Self::model_to_response(order_model, items)
            })
            .collect();

        info!(count = responses.len(), "Orders listed successfully");

        Ok(responses)
    }

    /// Replaces an order and its entire item set.
    ///
    /// Scalar fields are updated in place, then every existing item row is
    /// deleted and the submitted items are inserted fresh with new ids and
    /// recomputed subtotals. Items carry no identity across edits. All of
    /// it happens in one transaction.
    #[instrument(skip(self, draft), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        draft: OrderDraft,
    ) -> Result<OrderResponse, ServiceError> {
        Self::validate_draft(&draft)?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let item_rows = Self::build_item_rows(order_id, &draft.items, now);
        let total_amount = pricing::order_total(item_rows.iter().map(|row| row.subtotal));

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start transaction for order update");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to find order for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for update");
                ServiceError::NotFound(format!("Order {}", order_id))
            })?;

        let mut order_active_model: OrderActiveModel = order.into();
        order_active_model.customer_name = Set(draft.customer_name);
        order_active_model.customer_phone = Set(draft.customer_phone);
        order_active_model.customer_address = Set(draft.customer_address);
        if let Some(order_date) = draft.order_date {
            order_active_model.order_date = Set(order_date);
        }
        order_active_model.rental_start_date = Set(draft.rental_start_date);
        order_active_model.rental_end_date = Set(draft.rental_end_date);
        order_active_model.total_amount = Set(total_amount);
        order_active_model.notes = Set(draft.notes);
        order_active_model.updated_at = Set(now);

        let updated_order = order_active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order");
            ServiceError::DatabaseError(e)
        })?;

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to delete existing order items");
                ServiceError::DatabaseError(e)
            })?;

        OrderItemEntity::insert_many(item_rows.iter().cloned().map(order_item::ActiveModel::from))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to insert replacement order items");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            total_amount = %total_amount,
            item_count = item_rows.len(),
            "Order updated successfully"
        );

        if let Err(e) = self.event_sender.send(Event::OrderUpdated(order_id)).await {
            warn!(error = %e, order_id = %order_id, "Failed to send order updated event");
        }

        Ok(Self::model_to_response(updated_order, item_rows))
    }

    /// Deletes an order and its items in one transaction.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start transaction for order deletion");
            ServiceError::DatabaseError(e)
        })?;

        OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to find order for deletion");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for deletion");
                ServiceError::NotFound(format!("Order {}", order_id))
            })?;

        // Items first, then the order row; the FK restricts the reverse order.
        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to delete order items");
                ServiceError::DatabaseError(e)
            })?;

        OrderEntity::delete_by_id(order_id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to delete order");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order deletion transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, "Order deleted successfully");

        if let Err(e) = self.event_sender.send(Event::OrderDeleted(order_id)).await {
            warn!(error = %e, order_id = %order_id, "Failed to send order deleted event");
        }

        Ok(())
    }

    /// Validates a draft before anything touches the database.
    fn validate_draft(draft: &OrderDraft) -> Result<(), ServiceError> {
        draft.validate()?;

        for (index, item) in draft.items.iter().enumerate() {
            item.validate().map_err(|e| {
                ServiceError::ValidationError(format!("items[{}]: {}", index, e))
            })?;
        }

        Ok(())
    }

    /// Materializes draft items into full rows with fresh ids and computed
    /// subtotals. Timestamps are staggered by one microsecond per item so
    /// the created_at sort preserves submission order.
    fn build_item_rows(
        order_id: Uuid,
        items: &[OrderItemDraft],
        now: DateTime<Utc>,
    ) -> Vec<OrderItemModel> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| OrderItemModel {
                id: Uuid::new_v4(),
                order_id,
                car_type: item.car_type.clone(),
                quantity: item.quantity,
                daily_rate: item.daily_rate,
                days: item.days,
                subtotal: pricing::line_subtotal(item.quantity, item.daily_rate, item.days),
                created_at: now + Duration::microseconds(index as i64),
            })
            .collect()
    }

    async fn fetch_items(&self, order_id: Uuid) -> Result<Vec<OrderItemModel>, ServiceError> {
        let db = &*self.db_pool;

        OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order items from database");
                ServiceError::DatabaseError(e)
            })
    }

    fn model_to_response(order: order::Model, items: Vec<OrderItemModel>) -> OrderResponse {
        OrderResponse {
            id: order.id,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            customer_address: order.customer_address,
            order_date: order.order_date,
            rental_start_date: order.rental_start_date,
            rental_end_date: order.rental_end_date,
            total_amount: order.total_amount,
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: items.into_iter().map(Self::item_to_response).collect(),
        }
    }

    fn item_to_response(item: OrderItemModel) -> OrderItemResponse {
        OrderItemResponse {
            id: item.id,
            car_type: item.car_type,
            quantity: item.quantity,
            daily_rate: item.daily_rate,
            days: item.days,
            subtotal: item.subtotal,
            created_at: item.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn draft_with_items(items: Vec<OrderItemDraft>) -> OrderDraft {
        OrderDraft {
            customer_name: "Budi".into(),
            customer_phone: "0812xxx".into(),
            customer_address: None,
            order_date: None,
            rental_start_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            rental_end_date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            notes: None,
            items,
        }
    }

    fn item(car_type: &str, quantity: i32, daily_rate: Decimal, days: i32) -> OrderItemDraft {
        OrderItemDraft {
            car_type: car_type.into(),
            quantity,
            daily_rate,
            days,
        }
    }

    #[test]
    fn valid_draft_passes_the_guard() {
        let draft = draft_with_items(vec![item("Avanza", 2, dec!(300000), 2)]);
        assert!(OrderService::validate_draft(&draft).is_ok());
    }

    #[test]
    fn draft_without_items_is_rejected() {
        let draft = draft_with_items(vec![]);
        assert!(OrderService::validate_draft(&draft).is_err());
    }

    #[test]
    fn blank_customer_name_is_rejected() {
        let mut draft = draft_with_items(vec![item("Avanza", 1, dec!(300000), 1)]);
        draft.customer_name = String::new();
        assert!(OrderService::validate_draft(&draft).is_err());
    }

    #[rstest]
    #[case::blank_car_type(item("", 1, dec!(300000), 1))]
    #[case::zero_quantity(item("Avanza", 0, dec!(300000), 1))]
    #[case::negative_quantity(item("Avanza", -2, dec!(300000), 1))]
    #[case::negative_rate(item("Avanza", 1, dec!(-1), 1))]
    #[case::zero_days(item("Avanza", 1, dec!(300000), 0))]
    fn invalid_items_are_rejected(#[case] bad_item: OrderItemDraft) {
        let draft = draft_with_items(vec![item("Xenia", 1, dec!(250000), 1), bad_item]);
        let err = OrderService::validate_draft(&draft).unwrap_err();
        assert!(
            matches!(err, ServiceError::ValidationError(ref msg) if msg.contains("items[1]")),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn zero_daily_rate_is_allowed() {
        let draft = draft_with_items(vec![item("Avanza", 1, Decimal::ZERO, 1)]);
        assert!(OrderService::validate_draft(&draft).is_ok());
    }

    #[test]
    fn item_rows_get_fresh_ids_and_computed_subtotals() {
        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let rows = OrderService::build_item_rows(
            order_id,
            &[
                item("Avanza", 2, dec!(300000), 2),
                item("Xenia", 1, dec!(250000), 3),
            ],
            now,
        );

        assert_eq!(rows.len(), 2);
        assert_ne!(rows[0].id, rows[1].id);
        assert_eq!(rows[0].subtotal, dec!(1200000));
        assert_eq!(rows[1].subtotal, dec!(750000));
        assert!(rows[0].created_at < rows[1].created_at);
        assert!(rows.iter().all(|row| row.order_id == order_id));
    }
}
