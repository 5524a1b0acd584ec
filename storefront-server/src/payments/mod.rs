//! Payment reconciliation rules
//!
//! The gateway adapter lives in `crate::stripe`; this module holds the
//! pure business rules applied before touching the gateway or the
//! database, so they are testable in isolation.

use rust_decimal::Decimal;

use shared::error::{AppError, ErrorCode};
use shared::models::{Payment, PaymentState};

/// A refund request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct RefundPlan {
    /// Gateway intent to refund against
    pub intent_id: String,
    /// Amount to refund
    pub amount: Decimal,
    /// Whether this refund covers everything still refundable
    pub is_full: bool,
}

/// Validate a refund request against the payment record.
///
/// Only completed (PAID) payments with a gateway reference can be
/// refunded; a missing amount means "refund the remainder".
pub fn plan_refund(payment: &Payment, requested: Option<Decimal>) -> Result<RefundPlan, AppError> {
    if payment.state() != PaymentState::Paid {
        return Err(AppError::with_message(
            ErrorCode::PaymentNotCompleted,
            "Can only refund completed payments",
        ));
    }

    let Some(intent_id) = payment
        .gateway_intent_id
        .as_deref()
        .filter(|id| !id.is_empty())
    else {
        return Err(AppError::with_message(
            ErrorCode::PaymentIntentMissing,
            "Payment intent ID not found",
        ));
    };

    let remaining = payment.amount - payment.refunded_amount;
    let amount = requested.unwrap_or(remaining);

    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Refund amount must be positive"));
    }
    if amount > remaining {
        return Err(AppError::new(ErrorCode::RefundExceedsAmount)
            .with_detail("remaining", remaining.to_string())
            .with_detail("requested", amount.to_string()));
    }

    Ok(RefundPlan {
        intent_id: intent_id.to_string(),
        amount,
        is_full: amount == remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn payment(status: &str, intent: Option<&str>, amount: &str, refunded: &str) -> Payment {
        Payment {
            id: 1,
            tenant_id: "t1".into(),
            order_id: 10,
            gateway_intent_id: intent.map(String::from),
            amount: Decimal::from_str(amount).unwrap(),
            currency: "USD".into(),
            status: status.into(),
            refunded_amount: Decimal::from_str(refunded).unwrap(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_refund_requires_completed_payment() {
        for status in ["PENDING", "FAILED", "REFUNDED"] {
            let err = plan_refund(&payment(status, Some("pi_1"), "100", "0"), None)
                .expect_err("non-PAID payment must be rejected");
            assert_eq!(err.code, ErrorCode::PaymentNotCompleted);
            assert_eq!(err.message, "Can only refund completed payments");
        }
    }

    #[test]
    fn test_refund_requires_gateway_reference() {
        let err = plan_refund(&payment("PAID", None, "100", "0"), None)
            .expect_err("missing intent must be rejected");
        assert_eq!(err.code, ErrorCode::PaymentIntentMissing);
        assert_eq!(err.message, "Payment intent ID not found");

        let err = plan_refund(&payment("PAID", Some(""), "100", "0"), None)
            .expect_err("empty intent must be rejected");
        assert_eq!(err.code, ErrorCode::PaymentIntentMissing);
    }

    #[test]
    fn test_full_refund_by_default() {
        let plan = plan_refund(&payment("PAID", Some("pi_1"), "100", "0"), None).unwrap();
        assert_eq!(plan.amount, Decimal::from(100));
        assert!(plan.is_full);
        assert_eq!(plan.intent_id, "pi_1");
    }

    #[test]
    fn test_partial_refund() {
        let plan = plan_refund(
            &payment("PAID", Some("pi_1"), "100", "0"),
            Some(Decimal::from(30)),
        )
        .unwrap();
        assert_eq!(plan.amount, Decimal::from(30));
        assert!(!plan.is_full);
    }

    #[test]
    fn test_refund_caps_at_remaining() {
        let err = plan_refund(
            &payment("PAID", Some("pi_1"), "100", "80"),
            Some(Decimal::from(30)),
        )
        .expect_err("over-refund must be rejected");
        assert_eq!(err.code, ErrorCode::RefundExceedsAmount);

        let plan = plan_refund(
            &payment("PAID", Some("pi_1"), "100", "80"),
            Some(Decimal::from(20)),
        )
        .unwrap();
        assert!(plan.is_full);
    }

    #[test]
    fn test_zero_refund_rejected() {
        let err = plan_refund(
            &payment("PAID", Some("pi_1"), "100", "0"),
            Some(Decimal::ZERO),
        )
        .expect_err("zero refund must be rejected");
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
