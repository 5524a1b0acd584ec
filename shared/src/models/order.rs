//! Order model and the status lifecycle state machine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// Transitions are restricted to the table in [`OrderStatus::allowed_next`].
/// `CANCELED` and `REFUNDED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    PaymentFailed,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Canceled,
    Refunded,
}

/// Allowed transitions, kept as data so tests can enumerate them exhaustively.
const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (
        OrderStatus::Pending,
        &[
            OrderStatus::Paid,
            OrderStatus::PaymentFailed,
            OrderStatus::Canceled,
        ],
    ),
    (
        OrderStatus::PaymentFailed,
        &[OrderStatus::Paid, OrderStatus::Canceled],
    ),
    (
        OrderStatus::Paid,
        &[
            OrderStatus::Processing,
            OrderStatus::Canceled,
            OrderStatus::Refunded,
        ],
    ),
    (
        OrderStatus::Processing,
        &[
            OrderStatus::Shipped,
            OrderStatus::Canceled,
            OrderStatus::Refunded,
        ],
    ),
    (
        OrderStatus::Shipped,
        &[OrderStatus::Delivered, OrderStatus::Canceled],
    ),
    (OrderStatus::Delivered, &[OrderStatus::Refunded]),
    (OrderStatus::Canceled, &[]),
    (OrderStatus::Refunded, &[]),
];

impl OrderStatus {
    /// All lifecycle states
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::PaymentFailed,
        OrderStatus::Paid,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
        OrderStatus::Refunded,
    ];

    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PAYMENT_FAILED" => Some(Self::PaymentFailed),
            "PAID" => Some(Self::Paid),
            "PROCESSING" => Some(Self::Processing),
            "SHIPPED" => Some(Self::Shipped),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELED" => Some(Self::Canceled),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::Paid => "PAID",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Canceled => "CANCELED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// States this status may transition into
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        TRANSITIONS
            .iter()
            .find(|(from, _)| from == self)
            .map(|(_, to)| *to)
            .unwrap_or(&[])
    }

    /// Whether the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Terminal states have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Payment reconciliation status on the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PAID" => Some(Self::Paid),
            "FAILED" => Some(Self::Failed),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

/// Fulfilment status on the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingStatus {
    Pending,
    InTransit,
    Delivered,
}

impl ShippingStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "IN_TRANSIT" => Some(Self::InTransit),
            "DELIVERED" => Some(Self::Delivered),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
        }
    }
}

/// Order entity
///
/// Monetary invariant: `total = subtotal + tax + shipping - discount`.
/// Orders are soft-deleted (`deleted_at`) and mutated only through the
/// status transition engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub tenant_id: String,
    pub order_number: String,
    pub status: String,
    pub payment_status: String,
    pub shipping_status: String,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: serde_json::Value,
    pub billing_address: serde_json::Value,
    pub payment_method: Option<String>,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    /// Append-only note history, one `[timestamp] note` line per entry
    pub admin_notes: Option<String>,
    pub fulfilled_at: Option<i64>,
    pub canceled_at: Option<i64>,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Parsed lifecycle status (defaults to Pending on unknown values)
    pub fn order_status(&self) -> OrderStatus {
        OrderStatus::from_db(&self.status).unwrap_or(OrderStatus::Pending)
    }
}

/// Immutable line-item snapshot taken at purchase time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub tax: Decimal,
    pub discount: Decimal,
    /// unit_price * quantity + tax - discount
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_state_has_a_table_entry() {
        for status in OrderStatus::ALL {
            assert!(
                TRANSITIONS.iter().any(|(from, _)| *from == status),
                "missing transition entry for {status}"
            );
        }
    }

    #[test]
    fn test_allowed_transitions_exhaustive() {
        use OrderStatus::*;
        let expected: &[(OrderStatus, &[OrderStatus])] = &[
            (Pending, &[Paid, PaymentFailed, Canceled]),
            (PaymentFailed, &[Paid, Canceled]),
            (Paid, &[Processing, Canceled, Refunded]),
            (Processing, &[Shipped, Canceled, Refunded]),
            (Shipped, &[Delivered, Canceled]),
            (Delivered, &[Refunded]),
            (Canceled, &[]),
            (Refunded, &[]),
        ];

        for (from, allowed) in expected {
            for to in OrderStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&to),
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        for status in [
            OrderStatus::Pending,
            OrderStatus::PaymentFailed,
            OrderStatus::Paid,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            assert!(!status.is_terminal(), "{status} must not be terminal");
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_db_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(OrderStatus::from_db("ACTIVE"), None);
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PaymentFailed).unwrap();
        assert_eq!(json, "\"PAYMENT_FAILED\"");
        let parsed: OrderStatus = serde_json::from_str("\"SHIPPED\"").unwrap();
        assert_eq!(parsed, OrderStatus::Shipped);
        let shipping: ShippingStatus = serde_json::from_str("\"IN_TRANSIT\"").unwrap();
        assert_eq!(shipping, ShippingStatus::InTransit);
    }
}
