pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod routes;
pub mod state;

pub use routes::configure;
pub use state::AppState;
