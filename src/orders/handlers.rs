use axum::{extract::State, routing::post, Form, Json, Router};
use tracing::instrument;

use crate::{
    error::ApiError,
    orders::{
        dto::{
            CreateOrderForm, CreateOrderResponse, ListOrdersForm, OrderListResponse,
            StatusResponse, UpdateStatusForm, UserOrdersForm,
        },
        services,
    },
    state::AppState,
};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/list", post(list_orders))
        .route("/orders/mine", post(list_user_orders))
        .route("/orders/status", post(update_status))
}

#[instrument(skip(state, form))]
pub async fn create_order(
    State(state): State<AppState>,
    Form(form): Form<CreateOrderForm>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let res = services::create_order(state.orders.as_ref(), form).await?;
    Ok(Json(res))
}

#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    Form(form): Form<ListOrdersForm>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let data = services::list_orders(state.orders.as_ref(), form.status).await?;
    let message = data.is_empty().then(|| "No orders found.".to_string());
    Ok(Json(OrderListResponse {
        success: true,
        data,
        message,
    }))
}

#[instrument(skip(state))]
pub async fn list_user_orders(
    State(state): State<AppState>,
    Form(form): Form<UserOrdersForm>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let data = services::list_user_orders(state.orders.as_ref(), &form.phone_number).await?;
    let message = data
        .is_empty()
        .then(|| "No orders found for this number.".to_string());
    Ok(Json(OrderListResponse {
        success: true,
        data,
        message,
    }))
}

#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    Form(form): Form<UpdateStatusForm>,
) -> Result<Json<StatusResponse>, ApiError> {
    let message = services::update_status(state.orders.as_ref(), &form.id, &form.status).await?;
    Ok(Json(StatusResponse {
        success: true,
        message,
    }))
}
