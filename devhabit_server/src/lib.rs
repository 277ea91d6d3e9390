//! HTTP layer for DevHabit: axum router, handlers and problem-details errors.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod request_id;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
