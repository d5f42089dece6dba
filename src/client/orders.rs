use std::sync::Arc;

use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    client::gateway::{GatewayError, OrderGateway},
    orders::{dto::OrderView, OrderStatus, CANCEL_WINDOW_SECS},
};

/// "My orders" screen: lists the user's orders and cancels them.
pub struct OrdersClient {
    gateway: Arc<dyn OrderGateway>,
}

impl OrdersClient {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }

    /// Newest first, as the server returns them.
    #[instrument(skip(self))]
    pub async fn my_orders(&self, phone_number: &str) -> Result<Vec<OrderView>, GatewayError> {
        self.gateway.list_user_orders(phone_number.trim()).await
    }

    /// The server has the final word on the window; [`can_cancel`] only
    /// decides whether to offer the button.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: i64) -> Result<String, GatewayError> {
        self.gateway
            .update_status(order_id, OrderStatus::Cancelled)
            .await
    }
}

pub fn can_cancel(order: &OrderView, now: OffsetDateTime) -> bool {
    let pending = order
        .status
        .parse::<OrderStatus>()
        .map(|s| s == OrderStatus::Pending)
        .unwrap_or(false);
    pending && (now - order.created_at).whole_seconds() <= CANCEL_WINDOW_SECS
}

/// Status as shown to the user.
pub fn status_label(status: &str) -> String {
    match status.parse::<OrderStatus>() {
        Ok(OrderStatus::Pending) => "Pending".to_string(),
        Ok(OrderStatus::Cancelled) => "Refund in Process".to_string(),
        Ok(OrderStatus::Delivered) => "Delivered".to_string(),
        Ok(OrderStatus::Refunded) => "Refunded".to_string(),
        Err(_) => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use time::{macros::datetime, Duration};

    use super::*;
    use crate::client::gateway::fake::FakeGateway;

    fn order(id: i64, phone: &str, status: &str) -> OrderView {
        OrderView {
            id,
            user_name: "Asha".into(),
            phone_number: phone.into(),
            address: "12 MG Road".into(),
            description: String::new(),
            order_type: "Regular".into(),
            delivery_date: None,
            delivery_time: Some("16:00:00".into()),
            total_items: 3,
            total_price: "560".into(),
            payment_method: "Google Pay".into(),
            transaction_id: Some("TXN42".into()),
            cart_items: "Paneer (x2, ₹250), Biryani (x1, ₹200)".into(),
            created_at: datetime!(2024-05-10 14:00:00 UTC),
            status: status.into(),
        }
    }

    #[test]
    fn cancel_button_only_within_window_and_pending() {
        let o = order(1, "9876543210", "pending");
        let created = o.created_at;
        assert!(can_cancel(&o, created + Duration::seconds(599)));
        assert!(can_cancel(&o, created + Duration::seconds(600)));
        assert!(!can_cancel(&o, created + Duration::seconds(601)));
        assert!(!can_cancel(&order(2, "9876543210", "Delivered"), created));
    }

    #[test]
    fn cancelled_reads_as_refund_in_process() {
        assert_eq!(status_label("cancelled"), "Refund in Process");
        assert_eq!(status_label("Refunded"), "Refunded");
        assert_eq!(status_label("on hold"), "on hold");
    }

    #[tokio::test]
    async fn lists_own_orders_and_cancels_through_status_endpoint() {
        let gateway = Arc::new(FakeGateway::default());
        gateway.orders.lock().unwrap().extend([
            order(1, "9876543210", "pending"),
            order(2, "9000000000", "pending"),
        ]);
        let client = OrdersClient::new(gateway.clone());

        let mine = client.my_orders(" 9876543210 ").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, 1);

        let msg = client.cancel(1).await.unwrap();
        assert_eq!(msg, "Order status updated to cancelled.");
        assert_eq!(
            gateway.status_calls.lock().unwrap().as_slice(),
            &[(1, OrderStatus::Cancelled)]
        );
    }

    #[tokio::test]
    async fn expired_cancel_surfaces_server_message() {
        let gateway = Arc::new(FakeGateway::default());
        *gateway.status_result.lock().unwrap() = Some(Err(GatewayError::Rejected(
            "Cancellation period has expired (10 minutes limit).".into(),
        )));
        let err = OrdersClient::new(gateway).cancel(7).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cancellation period has expired (10 minutes limit)."
        );
    }
}
