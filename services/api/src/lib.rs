//! Gallery API service: uploads, image metadata and user profiles

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upload;
pub mod validation;

pub use config::Settings;
pub use routes::create_router;
pub use state::AppState;
