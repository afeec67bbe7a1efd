pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod output;
pub mod provider;
pub mod service;

pub use config::AppConfig;
pub use db::{create_pool, PgSalesSource};
pub use error::{AuditError, ProviderError};
pub use provider::EvolutionClient;
pub use service::DeliveryAuditor;
