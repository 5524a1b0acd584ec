//! Order status transition planning
//!
//! `plan_transition` is pure: it checks the requested transition against
//! the lifecycle table, validates transition-specific input (tracking
//! number for SHIPPED), and produces the column changes plus the
//! post-commit events the caller dispatches after the database update.

use shared::error::{AppError, ErrorCode};
use shared::models::{OrderStatus, ShippingStatus};

use super::events::OrderEvent;

/// Requested status change
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TransitionRequest {
    pub new_status: OrderStatus,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub admin_note: Option<String>,
}

/// Column changes to apply in one UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub shipping_status: Option<ShippingStatus>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub set_fulfilled_at: bool,
    pub set_canceled_at: bool,
    /// Pre-formatted `[timestamp] note` line to append to the history
    pub note_line: Option<String>,
}

/// A validated transition: the mutation plus its post-commit events
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub change: TransitionChange,
    pub events: Vec<OrderEvent>,
}

/// Validate and plan a status transition. Nothing is persisted here; a
/// rejected request leaves no trace.
pub fn plan_transition(
    current: OrderStatus,
    req: &TransitionRequest,
    now: i64,
) -> Result<TransitionPlan, AppError> {
    if !current.can_transition_to(req.new_status) {
        return Err(AppError::with_message(
            ErrorCode::InvalidOrderTransition,
            format!(
                "Invalid status transition from {} to {}",
                current, req.new_status
            ),
        )
        .with_detail("from", current.as_db())
        .with_detail("to", req.new_status.as_db()));
    }

    let tracking_number = req
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);

    if req.new_status == OrderStatus::Shipped && tracking_number.is_none() {
        return Err(AppError::new(ErrorCode::TrackingNumberRequired));
    }

    let mut change = TransitionChange {
        from: current,
        to: req.new_status,
        shipping_status: None,
        tracking_number: None,
        tracking_url: None,
        set_fulfilled_at: false,
        set_canceled_at: false,
        note_line: req.admin_note.as_deref().map(|note| note_line(note, now)),
    };
    let mut events = Vec::new();

    match req.new_status {
        OrderStatus::Processing => {
            events.push(OrderEvent::OrderConfirmationEmail);
        }
        OrderStatus::Shipped => {
            change.shipping_status = Some(ShippingStatus::InTransit);
            change.tracking_number = tracking_number;
            change.tracking_url = req.tracking_url.clone();
            events.push(OrderEvent::ShippingConfirmationEmail);
            events.push(OrderEvent::ShippedNotification);
        }
        OrderStatus::Delivered => {
            change.shipping_status = Some(ShippingStatus::Delivered);
            change.set_fulfilled_at = true;
        }
        OrderStatus::Canceled => {
            change.shipping_status = Some(ShippingStatus::Pending);
            change.set_canceled_at = true;
        }
        _ => {}
    }

    Ok(TransitionPlan { change, events })
}

/// Format one append-only admin note line with a UTC timestamp prefix.
fn note_line(note: &str, now: i64) -> String {
    let ts = chrono::DateTime::from_timestamp_millis(now)
        .unwrap_or_default()
        .format("%Y-%m-%dT%H:%M:%SZ");
    format!("[{ts}] {note}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: OrderStatus) -> TransitionRequest {
        TransitionRequest {
            new_status: status,
            tracking_number: None,
            tracking_url: None,
            admin_note: None,
        }
    }

    #[test]
    fn test_disallowed_transitions_rejected_for_every_pair() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let mut req = request(to);
                req.tracking_number = Some("TRK-1".into());
                let result = plan_transition(from, &req, 0);
                if from.can_transition_to(to) {
                    assert!(result.is_ok(), "{from} -> {to} should be allowed");
                } else {
                    let err = result.expect_err("transition must be rejected");
                    assert_eq!(err.code, ErrorCode::InvalidOrderTransition);
                    assert!(err.message.contains(from.as_db()));
                    assert!(err.message.contains(to.as_db()));
                }
            }
        }
    }

    #[test]
    fn test_transition_error_names_both_states() {
        let err = plan_transition(OrderStatus::Pending, &request(OrderStatus::Shipped), 0)
            .expect_err("PENDING -> SHIPPED is not allowed");
        assert_eq!(
            err.message,
            "Invalid status transition from PENDING to SHIPPED"
        );
    }

    #[test]
    fn test_shipped_requires_tracking_number() {
        let err = plan_transition(OrderStatus::Processing, &request(OrderStatus::Shipped), 0)
            .expect_err("missing tracking number must fail");
        assert_eq!(err.code, ErrorCode::TrackingNumberRequired);

        let mut req = request(OrderStatus::Shipped);
        req.tracking_number = Some("   ".into());
        let err = plan_transition(OrderStatus::Processing, &req, 0)
            .expect_err("blank tracking number must fail");
        assert_eq!(err.code, ErrorCode::TrackingNumberRequired);
    }

    #[test]
    fn test_shipped_effects() {
        let mut req = request(OrderStatus::Shipped);
        req.tracking_number = Some("TRK-123".into());
        req.tracking_url = Some("https://carrier.example/TRK-123".into());
        let plan = plan_transition(OrderStatus::Processing, &req, 0).unwrap();

        assert_eq!(plan.change.shipping_status, Some(ShippingStatus::InTransit));
        assert_eq!(plan.change.tracking_number.as_deref(), Some("TRK-123"));
        assert!(!plan.change.set_fulfilled_at);
        assert!(plan.events.contains(&OrderEvent::ShippingConfirmationEmail));
        assert!(plan.events.contains(&OrderEvent::ShippedNotification));
    }

    #[test]
    fn test_delivered_effects() {
        let plan = plan_transition(OrderStatus::Shipped, &request(OrderStatus::Delivered), 0)
            .unwrap();
        assert_eq!(plan.change.shipping_status, Some(ShippingStatus::Delivered));
        assert!(plan.change.set_fulfilled_at);
        assert!(plan.events.is_empty());
    }

    #[test]
    fn test_canceled_effects() {
        let plan =
            plan_transition(OrderStatus::Paid, &request(OrderStatus::Canceled), 0).unwrap();
        assert_eq!(plan.change.shipping_status, Some(ShippingStatus::Pending));
        assert!(plan.change.set_canceled_at);
    }

    #[test]
    fn test_processing_sends_confirmation_email() {
        let plan =
            plan_transition(OrderStatus::Paid, &request(OrderStatus::Processing), 0).unwrap();
        assert_eq!(plan.events, vec![OrderEvent::OrderConfirmationEmail]);
    }

    #[test]
    fn test_note_line_format() {
        let mut req = request(OrderStatus::Paid);
        req.admin_note = Some("customer called".into());
        // 2026-01-02T03:04:05Z
        let now = 1_767_323_045_000;
        let plan = plan_transition(OrderStatus::Pending, &req, now).unwrap();
        assert_eq!(
            plan.change.note_line.as_deref(),
            Some("[2026-01-02T03:04:05Z] customer called")
        );
    }
}
