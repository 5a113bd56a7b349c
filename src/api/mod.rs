//! HTTP API layer.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult};
pub use routes::{create_router, create_router_with_origins};
pub use state::AppState;
