pub mod account;
pub mod analytics;
pub mod balance;
pub mod category;
pub mod pending;
pub mod settings;
pub mod timestamp;
pub mod transaction;
