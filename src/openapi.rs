use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rental API",
        version = "0.1.0",
        description = r#"
# Car Rental Order Management API

Backend API for a car rental shop: rental orders with per-car line items,
printable invoices, and monthly revenue reporting.

## Features

- **Order Management**: Create, update, and delete rental orders; saving an
  order replaces its full set of line items and recomputes all amounts
- **Invoices**: Printable invoice documents with company and customer details
- **Reports**: Monthly order counts and revenue per calendar year

## Error Handling

The API uses consistent error response formats with appropriate HTTP status codes:

```json
{
  "error": "Not Found",
  "message": "Order not found",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Rental order management endpoints"),
        (name = "Reports", description = "Revenue reporting endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::get_order_invoice,

        // Reports
        crate::handlers::reports::monthly_report,

        // Health intentionally omitted from OpenAPI paths for now
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,

            // Order types
            crate::services::orders::OrderDraft,
            crate::services::orders::OrderItemDraft,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,

            // Invoice types
            crate::services::invoices::InvoiceDocument,
            crate::services::invoices::InvoiceLine,
            crate::services::invoices::CompanyInfo,
            crate::services::invoices::CustomerInfo,

            // Report types
            crate::services::reports::MonthlyReportResponse,
            crate::reports::MonthlyStatistic,
            crate::reports::ReportTotals,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
