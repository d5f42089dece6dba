//! Local discount rules. Nothing here touches the network.

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponResult {
    pub code: String,
    pub discount_amount: Decimal,
    pub message: String,
    pub valid: bool,
}

impl CouponResult {
    pub fn none() -> Self {
        Self {
            code: String::new(),
            discount_amount: Decimal::ZERO,
            message: String::new(),
            valid: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponInfo {
    pub code: &'static str,
    pub description: &'static str,
    /// Smallest subtotal the coupon applies to; 0 means always.
    pub min_subtotal: i64,
}

pub const COUPONS: [CouponInfo; 3] = [
    CouponInfo {
        code: "CASHBACK100",
        description: "₹100 cashback on orders above ₹1000",
        min_subtotal: 1001,
    },
    CouponInfo {
        code: "20PERCENT",
        description: "20% off on orders above ₹500",
        min_subtotal: 501,
    },
    CouponInfo {
        code: "FIRST10",
        description: "10% off for first order",
        min_subtotal: 0,
    },
];

/// Computes the discount `code` grants on `subtotal`. Never fails: an
/// unknown or ineligible code yields a zero discount and a message saying so.
pub fn evaluate(subtotal: i64, code: &str) -> CouponResult {
    let code = code.trim().to_ascii_uppercase();
    let base = Decimal::from(subtotal.max(0));
    let (discount, message, valid) = match code.as_str() {
        "CASHBACK100" if subtotal > 1000 => (Decimal::from(100), "₹100 cashback applied!", true),
        "20PERCENT" if subtotal > 500 => {
            (base * Decimal::new(2, 1), "20% discount applied!", true)
        }
        "FIRST10" => (base * Decimal::new(1, 1), "10% discount applied!", true),
        _ => (Decimal::ZERO, "Invalid or inapplicable coupon.", false),
    };
    CouponResult {
        code,
        discount_amount: discount,
        message: message.to_string(),
        valid,
    }
}

/// Code to pre-fill for `subtotal`. It is only a suggestion; callers still
/// have to [`evaluate`] it.
pub fn best_coupon(subtotal: i64) -> &'static str {
    if subtotal > 1000 {
        "CASHBACK100"
    } else if subtotal > 500 {
        "20PERCENT"
    } else {
        "FIRST10"
    }
}

/// Coupons the user could apply, narrowed by what they have typed so far.
pub fn suggestions(subtotal: i64, typed: &str) -> Vec<CouponInfo> {
    let typed = typed.trim().to_ascii_lowercase();
    COUPONS
        .iter()
        .filter(|c| c.min_subtotal == 0 || subtotal >= c.min_subtotal)
        .filter(|c| typed.is_empty() || c.code.to_ascii_lowercase().contains(&typed))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cashback_needs_more_than_a_thousand() {
        assert_eq!(evaluate(1200, "CASHBACK100").discount_amount, Decimal::from(100));
        let r = evaluate(1000, "CASHBACK100");
        assert_eq!(r.discount_amount, Decimal::ZERO);
        assert!(!r.valid);
    }

    #[test]
    fn twenty_percent_over_five_hundred() {
        assert_eq!(evaluate(1200, "20PERCENT").discount_amount, Decimal::from(240));
        let r = evaluate(400, "20PERCENT");
        assert_eq!(r.discount_amount, Decimal::ZERO);
        assert!(!r.valid);
        assert_eq!(r.message, "Invalid or inapplicable coupon.");
    }

    #[test]
    fn first10_is_a_tenth_of_any_subtotal() {
        for x in [0_i64, 1, 15, 99, 400, 1234, 99_999] {
            let r = evaluate(x, "FIRST10");
            assert!(r.valid);
            assert_eq!(r.discount_amount, Decimal::from(x) / Decimal::from(10));
        }
    }

    #[test]
    fn codes_are_case_insensitive() {
        let r = evaluate(700, " 20percent ");
        assert_eq!(r.code, "20PERCENT");
        assert_eq!(r.discount_amount, Decimal::from(140));
    }

    #[test]
    fn applied_coupons_are_valid_with_their_own_message() {
        let r = evaluate(2000, "CASHBACK100");
        assert!(r.valid);
        assert_eq!(r.message, "₹100 cashback applied!");
        let r = evaluate(0, "FIRST10");
        assert!(r.valid);
        assert_eq!(r.discount_amount, Decimal::ZERO);
    }

    #[test]
    fn unknown_code_is_invalid_with_zero_discount() {
        let r = evaluate(5000, "BULK20");
        assert!(!r.valid);
        assert_eq!(r.discount_amount, Decimal::ZERO);
    }

    #[test]
    fn best_coupon_follows_subtotal_bands() {
        assert_eq!(best_coupon(1001), "CASHBACK100");
        assert_eq!(best_coupon(1000), "20PERCENT");
        assert_eq!(best_coupon(501), "20PERCENT");
        assert_eq!(best_coupon(500), "FIRST10");
    }

    #[test]
    fn suggestions_respect_eligibility_and_typed_text() {
        let codes = |v: Vec<CouponInfo>| v.into_iter().map(|c| c.code).collect::<Vec<_>>();
        assert_eq!(codes(suggestions(300, "")), vec!["FIRST10"]);
        assert_eq!(codes(suggestions(700, "")), vec!["20PERCENT", "FIRST10"]);
        assert_eq!(codes(suggestions(2000, "cash")), vec!["CASHBACK100"]);
        assert!(suggestions(2000, "zzz").is_empty());
    }
}
