// Core services
pub mod invoices;
pub mod orders;
pub mod reports;
