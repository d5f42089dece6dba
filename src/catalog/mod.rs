mod dto;
pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub use repo::{CatalogRepo, PgCatalogRepo};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::catalog_routes())
}
