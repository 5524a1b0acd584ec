//! Post-commit order events
//!
//! Transitions return the side effects they owe as an explicit event list.
//! The dispatcher runs after the mutation has committed; failures are
//! logged and dropped, never unwound into the committed order state.

use shared::models::Order;

use crate::state::AppState;
use crate::{db, email};

/// Side effect owed after a committed order mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    /// Confirmation email when the order enters PROCESSING
    OrderConfirmationEmail,
    /// Shipping email when the order enters SHIPPED
    ShippingConfirmationEmail,
    /// In-app notification when the order enters SHIPPED
    ShippedNotification,
}

/// Dispatch post-commit events, best-effort.
pub async fn dispatch(state: &AppState, order: &Order, events: &[OrderEvent]) {
    for event in events {
        match event {
            OrderEvent::OrderConfirmationEmail => {
                if let Err(e) = email::send_order_confirmation(
                    &state.ses,
                    &state.ses_from_email,
                    &order.customer_email,
                    &order.order_number,
                    &order.total.to_string(),
                )
                .await
                {
                    tracing::error!(
                        order_number = %order.order_number,
                        error = %e,
                        "Failed to send order confirmation email"
                    );
                }
            }
            OrderEvent::ShippingConfirmationEmail => {
                if let Err(e) = email::send_shipping_confirmation(
                    &state.ses,
                    &state.ses_from_email,
                    &order.customer_email,
                    &order.order_number,
                    order.tracking_number.as_deref().unwrap_or(""),
                    order.tracking_url.as_deref(),
                )
                .await
                {
                    tracing::error!(
                        order_number = %order.order_number,
                        error = %e,
                        "Failed to send shipping confirmation email"
                    );
                }
            }
            OrderEvent::ShippedNotification => {
                let body = format!(
                    "Order {} is on its way to {}",
                    order.order_number, order.customer_name
                );
                if let Err(e) = db::notifications::insert(
                    &state.pool,
                    &order.tenant_id,
                    "order_shipped",
                    "Order shipped",
                    &body,
                    Some(order.id),
                    shared::util::now_millis(),
                )
                .await
                {
                    tracing::error!(
                        order_number = %order.order_number,
                        error = %e,
                        "Failed to record shipped notification"
                    );
                }
            }
        }
    }
}
