use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::services::reports::MonthlyReportResponse;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthlyReportParams {
    /// Calendar year to report on; defaults to the current year.
    pub year: Option<i32>,
}

/// Order counts and revenue per month for one year, with totals
#[utoipa::path(
    get,
    path = "/api/v1/reports/monthly",
    params(MonthlyReportParams),
    responses(
        (status = 200, description = "Report returned", body = ApiResponse<MonthlyReportResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn monthly_report(
    State(state): State<AppState>,
    Query(params): Query<MonthlyReportParams>,
) -> Result<Json<ApiResponse<MonthlyReportResponse>>, ServiceError> {
    let report = state.services.reports.monthly_report(params.year).await?;
    Ok(Json(ApiResponse::success(report)))
}
