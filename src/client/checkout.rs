use rust_decimal::{prelude::ToPrimitive, Decimal};
use thiserror::Error;
use time::{Date, Duration, OffsetDateTime, Time};
use tracing::debug;
use uuid::Uuid;

use crate::{
    client::{
        cart::{CartLine, CartStore},
        coupons::{self, CouponResult},
    },
    orders::{OrderType, PaymentMethod},
};

/// Orders at or below this payable amount pay [`DELIVERY_CHARGE`].
pub const FREE_DELIVERY_ABOVE: i64 = 100;
pub const DELIVERY_CHARGE: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("address required")]
    BlankAddress,
    #[error("schedule 2 days ahead")]
    BulkTooSoon,
    #[error("schedule 1 hour ahead")]
    RegularTooSoon,
    #[error("transaction id required for Google Pay")]
    MissingTransactionId,
    #[error("cart is empty")]
    EmptyCart,
}

/// How a Regular order's time-of-day is placed on the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegularSchedule {
    /// Always today's date, even when that time has already passed.
    #[default]
    SameDay,
    /// Today if the time is still ahead, otherwise tomorrow.
    NextOccurrence,
}

/// What the user filled in on the checkout page.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_name: String,
    pub phone_number: String,
    pub address: String,
    pub order_type: OrderType,
    pub scheduled_date: Option<Date>,
    pub scheduled_time: Time,
    pub description: String,
    pub coupon: Option<String>,
}

/// Snapshot of a checkout, frozen when the user proceeds to payment.
/// Later cart edits do not reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    request_id: Uuid,
    lines: Vec<CartLine>,
    user_name: String,
    phone_number: String,
    address: String,
    description: String,
    order_type: OrderType,
    scheduled_date: Option<Date>,
    scheduled_time: Time,
    coupon: CouponResult,
    subtotal: i64,
    total_items: u32,
    total_price: i64,
}

impl OrderDraft {
    /// Client-generated id the server uses to recognise a retried submission.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn scheduled_date(&self) -> Option<Date> {
        self.scheduled_date
    }

    pub fn scheduled_time(&self) -> Time {
        self.scheduled_time
    }

    pub fn coupon(&self) -> &CouponResult {
        &self.coupon
    }

    pub fn subtotal(&self) -> i64 {
        self.subtotal
    }

    pub fn discount(&self) -> Decimal {
        self.coupon.discount_amount
    }

    pub fn total_items(&self) -> u32 {
        self.total_items
    }

    /// Amount submitted as `totalPrice`.
    pub fn total_price(&self) -> i64 {
        self.total_price
    }

    /// Shown on the summary only; never part of `totalPrice`.
    pub fn delivery_charge(&self) -> i64 {
        if self.total_price <= FREE_DELIVERY_ABOVE {
            DELIVERY_CHARGE
        } else {
            0
        }
    }

    pub fn amount_due(&self) -> i64 {
        self.total_price + self.delivery_charge()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutAssembler {
    regular_schedule: RegularSchedule,
}

impl CheckoutAssembler {
    pub fn new(regular_schedule: RegularSchedule) -> Self {
        Self { regular_schedule }
    }

    /// Validates the request against `now` and freezes the cart into a draft.
    /// Checks run in a fixed order: address, bulk date, regular time.
    pub fn assemble(
        &self,
        cart: &CartStore,
        req: CheckoutRequest,
        now: OffsetDateTime,
    ) -> Result<OrderDraft, CheckoutError> {
        let address = req.address.trim().to_string();
        if address.is_empty() {
            return Err(CheckoutError::BlankAddress);
        }

        let scheduled_date = match req.order_type {
            OrderType::Bulk => {
                let earliest = (now + Duration::days(2)).date();
                match req.scheduled_date {
                    Some(d) if d >= earliest => Some(d),
                    _ => return Err(CheckoutError::BulkTooSoon),
                }
            }
            OrderType::Regular => {
                if !self.regular_time_ok(req.scheduled_time, now) {
                    return Err(CheckoutError::RegularTooSoon);
                }
                None
            }
        };

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let subtotal = cart.total().trunc().to_i64().unwrap_or(i64::MAX);
        let coupon = match req.coupon.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => coupons::evaluate(subtotal, code),
            _ => CouponResult::none(),
        };
        let total_price = (Decimal::from(subtotal) - coupon.discount_amount)
            .max(Decimal::ZERO)
            .trunc()
            .to_i64()
            .unwrap_or(0);

        let draft = OrderDraft {
            request_id: Uuid::new_v4(),
            lines: cart.lines().to_vec(),
            user_name: req.user_name.trim().to_string(),
            phone_number: req.phone_number.trim().to_string(),
            address,
            description: req.description.trim().to_string(),
            order_type: req.order_type,
            scheduled_date,
            scheduled_time: req.scheduled_time,
            coupon,
            subtotal,
            total_items: cart.total_items(),
            total_price,
        };
        debug!(
            request_id = %draft.request_id,
            subtotal,
            total_price,
            "order draft assembled"
        );
        Ok(draft)
    }

    fn regular_time_ok(&self, time: Time, now: OffsetDateTime) -> bool {
        let earliest = now + Duration::hours(1);
        let today = now.replace_time(time);
        let at = match self.regular_schedule {
            RegularSchedule::SameDay => today,
            RegularSchedule::NextOccurrence if today < now => today + Duration::days(1),
            RegularSchedule::NextOccurrence => today,
        };
        at >= earliest
    }
}

/// The payment method may still change on the payment page, so the
/// transaction id rule is checked again at submission.
pub fn check_payment(
    method: PaymentMethod,
    transaction_id: Option<&str>,
) -> Result<Option<String>, CheckoutError> {
    match method {
        PaymentMethod::GooglePay => transaction_id
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Some(t.to_string()))
            .ok_or(CheckoutError::MissingTransactionId),
        PaymentMethod::CashOnDelivery => Ok(None),
    }
}
