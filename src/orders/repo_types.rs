use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

/// Lifecycle of a persisted order. Stored lowercase; parsed
/// case-insensitively because older rows were written capitalised.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Cancelled,
    Delivered,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            "delivered" => Ok(OrderStatus::Delivered),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    #[serde(rename = "Google Pay")]
    GooglePay,
    #[serde(rename = "Cash on Delivery")]
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::GooglePay => "Google Pay",
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "googlepay" | "gpay" => Ok(PaymentMethod::GooglePay),
            "cashondelivery" | "cod" => Ok(PaymentMethod::CashOnDelivery),
            _ => Err(format!("unknown payment method: {}", s.trim())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderType {
    Regular,
    Bulk,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::Regular => "Regular",
            OrderType::Bulk => "Bulk",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(OrderType::Regular),
            "bulk" => Ok(OrderType::Bulk),
            other => Err(format!("unknown order type: {}", other)),
        }
    }
}

/// One purchased line as it travels in `cartItems` and as it is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub name: String,
    pub quantity: i64,
    pub price: Decimal,
}

/// Row of the `orders` table.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub request_id: Option<Uuid>,
    pub user_name: String,
    pub phone_number: String,
    pub address: String,
    pub description: String,
    pub order_type: String,
    pub delivery_date: Option<Date>,
    pub delivery_time: Option<Time>,
    pub total_items: i32,
    pub total_price: i64,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub cart_items: Json<Vec<OrderItem>>,
    pub status: String,
    pub created_at: OffsetDateTime,
}

/// Validated input for a single insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub request_id: Option<Uuid>,
    pub user_name: String,
    pub phone_number: String,
    pub address: String,
    pub description: String,
    pub order_type: OrderType,
    pub delivery_date: Option<Date>,
    pub delivery_time: Option<Time>,
    pub total_items: i32,
    pub total_price: i64,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub cart_items: Vec<OrderItem>,
}

/// Outcome of an insert. `duplicate` is set when the request id was already
/// used and the existing order was returned instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedOrder {
    pub id: i64,
    pub created_at: OffsetDateTime,
    pub duplicate: bool,
}
