use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    client::{
        cart::{CartLine, CartStore},
        checkout::{self, CheckoutError, OrderDraft},
        gateway::{GatewayError, OrderGateway},
    },
    orders::{
        dto::CreateOrderForm,
        services::{format_date, format_time},
        OrderItem, PaymentMethod,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("could not encode cart items: {0}")]
    Encode(String),
}

/// Server acknowledgement of a placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlaced {
    pub order_id: i64,
    pub message: String,
    /// The server had already stored this draft under the same request id.
    pub duplicate: bool,
}

pub struct PaymentSubmitter {
    gateway: Arc<dyn OrderGateway>,
}

impl PaymentSubmitter {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }

    /// Places `draft` with the chosen payment method. The cart is cleared
    /// only after the server confirms; any failure leaves it intact for a
    /// retry, which reuses the draft's request id.
    #[instrument(skip(self, cart, draft, transaction_id), fields(request_id = %draft.request_id()))]
    pub async fn submit(
        &self,
        cart: &mut CartStore,
        draft: &OrderDraft,
        method: PaymentMethod,
        transaction_id: Option<&str>,
    ) -> Result<OrderPlaced, SubmitError> {
        let transaction_id = checkout::check_payment(method, transaction_id)?;
        let form = order_form(draft, method, transaction_id)?;

        let res = match self.gateway.create_order(&form).await {
            Ok(res) if res.success => res,
            Ok(res) => return Err(GatewayError::Rejected(res.message).into()),
            Err(e) => {
                warn!(error = %e, "order submission failed; cart kept");
                return Err(e.into());
            }
        };

        cart.clear();
        info!(order_id = res.order_id, duplicate = res.duplicate, "order placed");
        Ok(OrderPlaced {
            order_id: res.order_id,
            message: res.message,
            duplicate: res.duplicate,
        })
    }
}

/// Builds the order-creation form from a frozen draft.
pub fn order_form(
    draft: &OrderDraft,
    method: PaymentMethod,
    transaction_id: Option<String>,
) -> Result<CreateOrderForm, SubmitError> {
    let items: Vec<OrderItem> = draft.lines().iter().map(CartLine::to_order_item).collect();
    let cart_items = serde_json::to_string(&items).map_err(|e| SubmitError::Encode(e.to_string()))?;

    Ok(CreateOrderForm {
        request_id: Some(draft.request_id().to_string()),
        user_name: draft.user_name().to_string(),
        phone_number: draft.phone_number().to_string(),
        address: draft.address().to_string(),
        description: draft.description().to_string(),
        order_type: draft.order_type().to_string(),
        delivery_date: draft.scheduled_date().map(format_date),
        delivery_time: Some(format_time(draft.scheduled_time())),
        total_items: draft.total_items().to_string(),
        total_price: draft.total_price().to_string(),
        payment_method: method.to_string(),
        transaction_id,
        cart_items,
    })
}
