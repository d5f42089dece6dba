use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Form body of the order-creation request. Everything arrives as text;
/// `cartItems` is a JSON array of `{name, quantity, price}` encoded as a string.
/// The client side serializes the same struct when submitting.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOrderForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub user_name: String,
    pub phone_number: String,
    pub address: String,
    pub description: String,
    pub order_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<String>,
    pub total_items: String,
    pub total_price: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub cart_items: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub message: String,
    pub order_id: i64,
    pub duplicate: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersForm {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOrdersForm {
    #[serde(default)]
    pub phone_number: String,
}

/// Single form for every status mutation. `orderId` is accepted as an alias
/// of `id` for clients built against the old cancel endpoint.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateStatusForm {
    #[serde(default, alias = "orderId")]
    pub id: String,
    #[serde(default)]
    pub status: String,
}

/// An order as listed to admins and users. `cart_items` is the display
/// string derived on read from the stored structured items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderView {
    pub id: i64,
    pub user_name: String,
    pub phone_number: String,
    pub address: String,
    pub description: String,
    pub order_type: String,
    pub delivery_date: Option<String>,
    pub delivery_time: Option<String>,
    pub total_items: i32,
    pub total_price: String,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub cart_items: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub data: Vec<OrderView>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}
