use crate::{
    config::{AppConfig, CompanyConfig},
    db::DbPool,
    entities::order::Entity as OrderEntity,
    entities::order_item::{self, Entity as OrderItemEntity},
    errors::ServiceError,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Company block printed at the top of an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyInfo {
    pub name: String,
    pub tagline: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl From<&CompanyConfig> for CompanyInfo {
    fn from(cfg: &CompanyConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            tagline: cfg.tagline.clone(),
            address: cfg.address.clone(),
            phone: cfg.phone.clone(),
            email: cfg.email.clone(),
        }
    }
}

/// Customer block on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
}

/// One priced rental line on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvoiceLine {
    pub car_type: String,
    pub quantity: i32,
    pub daily_rate: Decimal,
    pub days: i32,
    pub subtotal: Decimal,
}

/// Printable invoice assembled from a stored order.
///
/// The document repeats the stored totals rather than recomputing them,
/// so an invoice always matches what the order was saved with.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvoiceDocument {
    /// Short invoice code derived from the order id
    #[schema(example = "550E8400")]
    pub invoice_number: String,
    pub order_id: Uuid,
    /// Invoice date (the order's order_date)
    pub order_date: NaiveDate,
    pub company: CompanyInfo,
    pub customer: CustomerInfo,
    pub rental_start_date: NaiveDate,
    pub rental_end_date: NaiveDate,
    pub lines: Vec<InvoiceLine>,
    pub total_amount: Decimal,
    #[schema(example = "IDR")]
    pub currency: String,
    pub notes: Option<String>,
}

/// Service assembling invoice documents for stored orders.
#[derive(Clone)]
pub struct InvoiceService {
    db_pool: Arc<DbPool>,
    company: CompanyInfo,
    currency: String,
}

impl InvoiceService {
    /// Creates a new invoice service instance
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            db_pool,
            company: CompanyInfo::from(&config.company),
            currency: config.currency.clone(),
        }
    }

    /// Builds the invoice document for an order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn invoice_for_order(&self, order_id: Uuid) -> Result<InvoiceDocument, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order for invoice");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for invoice");
                ServiceError::NotFound(format!("Order {}", order_id))
            })?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order items for invoice");
                ServiceError::DatabaseError(e)
            })?;

        let invoice_number = Self::invoice_number(order_id);

        info!(
            order_id = %order_id,
            invoice_number = %invoice_number,
            line_count = items.len(),
            "Invoice assembled"
        );

        Ok(InvoiceDocument {
            invoice_number,
            order_id: order.id,
            order_date: order.order_date,
            company: self.company.clone(),
            customer: CustomerInfo {
                name: order.customer_name,
                phone: order.customer_phone,
                address: order.customer_address,
            },
            rental_start_date: order.rental_start_date,
            rental_end_date: order.rental_end_date,
            lines: items
                .into_iter()
                .map(|item| InvoiceLine {
                    car_type: item.car_type,
                    quantity: item.quantity,
                    daily_rate: item.daily_rate,
                    days: item.days,
                    subtotal: item.subtotal,
                })
                .collect(),
            total_amount: order.total_amount,
            currency: self.currency.clone(),
            notes: order.notes,
        })
    }

    /// First eight hex digits of the order id, uppercased.
    fn invoice_number(order_id: Uuid) -> String {
        let hex = order_id.simple().to_string();
        hex[..8].to_ascii_uppercase()
    }
}
