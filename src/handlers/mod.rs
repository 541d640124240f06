pub mod orders;
pub mod reports;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<crate::services::orders::OrderService>,
    pub reports: Arc<crate::services::reports::ReportService>,
    pub invoices: Arc<crate::services::invoices::InvoiceService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, config: &AppConfig) -> Self {
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            event_sender,
        ));
        let reports = Arc::new(crate::services::reports::ReportService::new(db_pool.clone()));
        let invoices = Arc::new(crate::services::invoices::InvoiceService::new(
            db_pool, config,
        ));

        Self {
            orders,
            reports,
            invoices,
        }
    }
}
