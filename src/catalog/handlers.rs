use axum::{extract::State, routing::post, Form, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    catalog::dto::{PopularityForm, ReduceStockForm},
    error::ApiError,
    orders::dto::StatusResponse,
    state::AppState,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/stock", post(reduce_stock))
        .route("/catalog/popularity", post(bump_popularity))
}

#[instrument(skip(state))]
pub async fn reduce_stock(
    State(state): State<AppState>,
    Form(form): Form<ReduceStockForm>,
) -> Result<Json<StatusResponse>, ApiError> {
    let item_name = form.item_name.trim();
    let quantity = form.quantity.trim().parse::<i32>().unwrap_or(0);
    if item_name.is_empty() || quantity <= 0 {
        return Err(ApiError::Validation("Invalid item name or quantity.".into()));
    }

    if state.catalog.reduce_stock(item_name, quantity).await? == 0 {
        warn!(item_name, "stock not changed");
        return Err(ApiError::NotFound(
            "Item not found or stock not changed.".into(),
        ));
    }
    info!(item_name, quantity, "stock reduced");
    Ok(Json(StatusResponse {
        success: true,
        message: "Stock level updated successfully.".into(),
    }))
}

#[instrument(skip(state))]
pub async fn bump_popularity(
    State(state): State<AppState>,
    Form(form): Form<PopularityForm>,
) -> Result<Json<StatusResponse>, ApiError> {
    let food_id: i64 = form
        .food_id
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation("Invalid or missing food_id.".into()))?;

    if state.catalog.bump_popularity(food_id).await? == 0 {
        return Err(ApiError::NotFound("Food item not found.".into()));
    }
    Ok(Json(StatusResponse {
        success: true,
        message: "Popularity updated successfully".into(),
    }))
}
