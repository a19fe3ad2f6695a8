//! HTTP API handlers for filing-ingest

pub mod health;
pub mod records;
pub mod sessions;
pub mod validation;

pub use health::health_routes;
pub use records::record_routes;
pub use sessions::session_routes;
pub use validation::validation_routes;
