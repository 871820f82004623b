//! JSON HTTP surface over a provider.
//!
//! Exposes location suggestions, nearby search, departures and paginated
//! trip planning. Pagination contexts travel to clients as opaque tokens.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
