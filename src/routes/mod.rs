pub mod health;
pub mod metrics;
pub mod notify;
pub mod upload;
pub mod validate;
