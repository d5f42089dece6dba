pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::{OrderRepo, PgOrderRepo};
pub use repo_types::{OrderItem, OrderStatus, OrderType, PaymentMethod};

/// A pending order may be cancelled for this many seconds after creation.
pub const CANCEL_WINDOW_SECS: i64 = 600;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::order_routes())
}
