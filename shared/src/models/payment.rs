//! Payment model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Gateway payment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentState {
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

/// Payment record, one-to-many with orders.
///
/// Created when a gateway intent is issued and updated in place on
/// webhook confirmation; never replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub tenant_id: String,
    pub order_id: i64,
    /// Gateway transaction/intent reference
    pub gateway_intent_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub refunded_amount: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Payment {
    /// Parsed state (defaults to Pending on unknown values)
    pub fn state(&self) -> PaymentState {
        PaymentState::from_db(&self.status).unwrap_or(PaymentState::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_roundtrip() {
        for state in [
            PaymentState::Pending,
            PaymentState::Paid,
            PaymentState::Failed,
            PaymentState::Refunded,
        ] {
            assert_eq!(PaymentState::from_db(state.as_db()), Some(state));
        }
        assert_eq!(PaymentState::from_db("VOID"), None);
    }
}
