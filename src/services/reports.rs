use crate::{
    db::DbPool,
    entities::order::{self, Entity as OrderEntity},
    errors::ServiceError,
    reports::{self, MonthlyStatistic, OrderRevenue, ReportTotals},
};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, QuerySelect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

/// Monthly revenue report for a single year.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthlyReportResponse {
    /// The year this report covers
    #[schema(example = 2024)]
    pub year: i32,
    /// Every year that has at least one order, newest first
    pub available_years: Vec<i32>,
    /// Months of `year` that had orders, ascending
    pub months: Vec<MonthlyStatistic>,
    /// Totals across the reported months
    pub totals: ReportTotals,
}

/// Service producing revenue statistics from stored orders.
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    /// Creates a new report service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Builds the monthly revenue report for `year`, defaulting to the
    /// current year when none is given.
    ///
    /// Only `order_date` and `total_amount` are pulled from the database;
    /// the bucketing itself happens in [`crate::reports`].
    #[instrument(skip(self))]
    pub async fn monthly_report(
        &self,
        year: Option<i32>,
    ) -> Result<MonthlyReportResponse, ServiceError> {
        let db = &*self.db_pool;

        let rows: Vec<(NaiveDate, Decimal)> = OrderEntity::find()
            .select_only()
            .column(order::Column::OrderDate)
            .column(order::Column::TotalAmount)
            .into_tuple()
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch order revenue rows from database");
                ServiceError::DatabaseError(e)
            })?;

        let revenues: Vec<OrderRevenue> = rows
            .into_iter()
            .map(|(order_date, total_amount)| OrderRevenue {
                order_date,
                total_amount,
            })
            .collect();

        let year = year.unwrap_or_else(|| Utc::now().year());
        let months = reports::monthly_rollup(&revenues, year);
        let totals = reports::summarize(&months);
        let available_years = reports::available_years(&revenues);

        info!(
            year,
            month_count = months.len(),
            order_count = totals.total_orders,
            "Monthly report generated"
        );

        Ok(MonthlyReportResponse {
            year,
            available_years,
            months,
            totals,
        })
    }
}
