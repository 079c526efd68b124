pub mod analytics_service;
pub mod balance_service;
pub mod csv_service;
pub mod sync_service;
