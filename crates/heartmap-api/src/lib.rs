//! HeartMap API crate - axum HTTP server and route handlers.
//!
//! Serves filtered health records and the filter values the map front-end
//! uses to populate its select boxes.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
