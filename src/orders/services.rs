use lazy_static::lazy_static;
use regex::Regex;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date, Time};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    orders::{
        dto::{CreateOrderForm, CreateOrderResponse, OrderView},
        repo::OrderRepo,
        repo_types::{NewOrder, OrderItem, OrderRow, OrderStatus, OrderType, PaymentMethod},
        CANCEL_WINDOW_SECS,
    },
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const SHORT_TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
    }
    PHONE_RE.is_match(phone)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_date(raw: &str) -> Result<Date, ApiError> {
    Date::parse(raw.trim(), DATE_FORMAT)
        .map_err(|_| ApiError::Validation(format!("Invalid delivery date: {}", raw)))
}

pub fn parse_time(raw: &str) -> Result<Time, ApiError> {
    let raw = raw.trim();
    Time::parse(raw, TIME_FORMAT)
        .or_else(|_| Time::parse(raw, SHORT_TIME_FORMAT))
        .map_err(|_| ApiError::Validation(format!("Invalid delivery time: {}", raw)))
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

pub fn format_time(t: Time) -> String {
    t.format(TIME_FORMAT).unwrap_or_else(|_| t.to_string())
}

/// Human-readable summary of the purchased lines, e.g.
/// `Veg Biryani (x1, ₹200), Paneer Butter Masala (x2, ₹250)`.
/// Derived on read; the stored items stay structured.
pub fn format_cart_items(items: &[OrderItem]) -> String {
    items
        .iter()
        .map(|i| format!("{} (x{}, ₹{})", i.name, i.quantity, i.price.normalize()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<OrderRow> for OrderView {
    fn from(r: OrderRow) -> Self {
        Self {
            cart_items: format_cart_items(&r.cart_items.0),
            id: r.id,
            user_name: r.user_name,
            phone_number: r.phone_number,
            address: r.address,
            description: r.description,
            order_type: r.order_type,
            delivery_date: r.delivery_date.map(format_date),
            delivery_time: r.delivery_time.map(format_time),
            total_items: r.total_items,
            total_price: r.total_price.to_string(),
            payment_method: r.payment_method,
            transaction_id: r.transaction_id,
            created_at: r.created_at,
            status: r.status.to_ascii_lowercase(),
        }
    }
}

/// Turns the raw form into an insertable order, rejecting anything the
/// client should have caught itself.
pub fn validate_new_order(form: CreateOrderForm) -> Result<NewOrder, ApiError> {
    let phone_number = form.phone_number.trim().to_string();
    if !is_valid_phone(&phone_number) {
        return Err(ApiError::Validation("Invalid phone number.".into()));
    }

    let address = form.address.trim().to_string();
    if address.is_empty() {
        return Err(ApiError::Validation("Address is required.".into()));
    }

    let order_type: OrderType = form.order_type.parse().map_err(ApiError::Validation)?;
    let payment_method: PaymentMethod = form.payment_method.parse().map_err(ApiError::Validation)?;

    let transaction_id = match payment_method {
        PaymentMethod::GooglePay => Some(non_blank(form.transaction_id).ok_or_else(|| {
            ApiError::Validation("Transaction ID is required for Google Pay.".into())
        })?),
        PaymentMethod::CashOnDelivery => None,
    };

    let delivery_date = non_blank(form.delivery_date)
        .map(|d| parse_date(&d))
        .transpose()?;
    let delivery_time = non_blank(form.delivery_time)
        .map(|t| parse_time(&t))
        .transpose()?;
    if order_type == OrderType::Bulk && delivery_date.is_none() {
        return Err(ApiError::Validation(
            "Delivery date is required for bulk orders.".into(),
        ));
    }

    let total_items: i32 = form
        .total_items
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation("Invalid totalItems.".into()))?;
    let total_price: i64 = form
        .total_price
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation("Invalid totalPrice.".into()))?;
    if total_items < 0 || total_price < 0 {
        return Err(ApiError::Validation("Totals must not be negative.".into()));
    }

    let cart_items: Vec<OrderItem> = serde_json::from_str(&form.cart_items)
        .map_err(|e| ApiError::Validation(format!("Invalid cartItems: {}", e)))?;
    if cart_items.is_empty() {
        return Err(ApiError::Validation("cartItems must not be empty.".into()));
    }
    if cart_items.iter().any(|i| i.quantity < 1) {
        return Err(ApiError::Validation(
            "cartItems quantities must be at least 1.".into(),
        ));
    }
    let summed: i64 = cart_items.iter().map(|i| i.quantity).sum();
    if summed != i64::from(total_items) {
        return Err(ApiError::Validation(
            "totalItems does not match cartItems.".into(),
        ));
    }

    let request_id = non_blank(form.request_id)
        .map(|r| {
            Uuid::parse_str(&r).map_err(|_| ApiError::Validation("Invalid requestId.".into()))
        })
        .transpose()?;

    Ok(NewOrder {
        request_id,
        user_name: form.user_name.trim().to_string(),
        phone_number,
        address,
        description: form.description.trim().to_string(),
        order_type,
        delivery_date,
        delivery_time,
        total_items,
        total_price,
        payment_method,
        transaction_id,
        cart_items,
    })
}

pub async fn create_order(
    repo: &dyn OrderRepo,
    form: CreateOrderForm,
) -> Result<CreateOrderResponse, ApiError> {
    let order = validate_new_order(form)?;
    let inserted = repo.insert(&order).await?;
    if inserted.duplicate {
        info!(order_id = inserted.id, request_id = ?order.request_id, "duplicate order submission");
    } else {
        info!(
            order_id = inserted.id,
            phone = %order.phone_number,
            total_price = order.total_price,
            "order placed"
        );
    }
    Ok(CreateOrderResponse {
        success: true,
        message: "Order placed successfully".into(),
        order_id: inserted.id,
        duplicate: inserted.duplicate,
    })
}

pub async fn list_orders(
    repo: &dyn OrderRepo,
    status: Option<String>,
) -> Result<Vec<OrderView>, ApiError> {
    let status = non_blank(status)
        .map(|s| s.parse::<OrderStatus>().map_err(ApiError::Validation))
        .transpose()?;
    let rows = repo.list(status).await?;
    Ok(rows.into_iter().map(OrderView::from).collect())
}

pub async fn list_user_orders(
    repo: &dyn OrderRepo,
    phone_number: &str,
) -> Result<Vec<OrderView>, ApiError> {
    let phone_number = phone_number.trim();
    if phone_number.is_empty() {
        return Err(ApiError::Validation("Phone number is required.".into()));
    }
    let rows = repo.list_by_phone(phone_number).await?;
    Ok(rows.into_iter().map(OrderView::from).collect())
}

/// Applies `target` to order `id`. The cancellation window is checked by the
/// repository against the clock that stamped the order.
pub async fn update_status(
    repo: &dyn OrderRepo,
    id: &str,
    target: &str,
) -> Result<String, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::Validation("Missing order id.".into()));
    }
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::Validation("Invalid order id.".into()))?;
    let target: OrderStatus = target
        .parse()
        .map_err(|_| ApiError::Validation("Invalid status.".into()))?;

    match target {
        OrderStatus::Cancelled => cancel_order(repo, id).await,
        OrderStatus::Delivered => mark_delivered(repo, id).await,
        OrderStatus::Refunded => refund_order(repo, id).await,
        OrderStatus::Pending => Err(ApiError::Validation("Invalid status.".into())),
    }
}

pub async fn cancel_order(repo: &dyn OrderRepo, id: i64) -> Result<String, ApiError> {
    if repo.cancel(id, CANCEL_WINDOW_SECS).await? == 1 {
        info!(order_id = id, "order cancelled");
        return Ok("Order status updated to cancelled.".into());
    }
    let row = load_for_diagnosis(repo, id).await?;
    let reason = match row.status.parse::<OrderStatus>() {
        Ok(OrderStatus::Cancelled) => "Order is already cancelled.",
        Ok(OrderStatus::Delivered) => "Delivered orders cannot be cancelled.",
        Ok(OrderStatus::Refunded) => "Refunded orders cannot be cancelled.",
        Ok(OrderStatus::Pending) => "Cancellation period has expired (10 minutes limit).",
        Err(_) => "Status update failed or already set.",
    };
    warn!(order_id = id, status = %row.status, reason, "cancel rejected");
    Err(ApiError::Conflict(reason.into()))
}

pub async fn mark_delivered(repo: &dyn OrderRepo, id: i64) -> Result<String, ApiError> {
    if repo.mark_delivered(id).await? == 1 {
        info!(order_id = id, "order delivered");
        return Ok("Status updated to delivered.".into());
    }
    let row = load_for_diagnosis(repo, id).await?;
    let reason = match row.status.parse::<OrderStatus>() {
        Ok(OrderStatus::Delivered) => "Order is already delivered.",
        Ok(OrderStatus::Cancelled) => "Cancelled orders cannot be delivered.",
        Ok(OrderStatus::Refunded) => "Refunded orders cannot be delivered.",
        Ok(OrderStatus::Pending) | Err(_) => "Status update failed or already set.",
    };
    warn!(order_id = id, status = %row.status, reason, "deliver rejected");
    Err(ApiError::Conflict(reason.into()))
}

pub async fn refund_order(repo: &dyn OrderRepo, id: i64) -> Result<String, ApiError> {
    if repo.refund(id).await? == 1 {
        info!(order_id = id, "order refunded");
        return Ok("Status updated to refunded.".into());
    }
    let row = load_for_diagnosis(repo, id).await?;
    let reason = match row.status.parse::<OrderStatus>() {
        Ok(OrderStatus::Refunded) => "Order is already refunded.",
        Ok(OrderStatus::Cancelled) => "Only Google Pay orders can be refunded.",
        Ok(OrderStatus::Pending) | Ok(OrderStatus::Delivered) => {
            "Only cancelled orders can be refunded."
        }
        Err(_) => "Status update failed or already set.",
    };
    warn!(order_id = id, status = %row.status, reason, "refund rejected");
    Err(ApiError::Conflict(reason.into()))
}

async fn load_for_diagnosis(repo: &dyn OrderRepo, id: i64) -> Result<OrderRow, ApiError> {
    repo.find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found.".into()))
}
