//! Shipping and tax estimation
//!
//! Pure lookup-table computations over (address, subtotal); no
//! persistence, no error paths beyond returning zero for unknown inputs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shared::models::Address;

/// Shipping speed selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
}

/// Domestic standard shipping is free at and above this subtotal.
const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Per-US-state sales tax rates in basis points (7.25% = 725).
/// States absent from the table are taxed at zero.
const STATE_TAX_RATES_BP: &[(&str, i64)] = &[
    ("AZ", 560),
    ("CA", 725),
    ("CO", 290),
    ("FL", 600),
    ("GA", 400),
    ("IL", 625),
    ("MA", 625),
    ("NC", 475),
    ("NV", 685),
    ("NY", 800),
    ("OH", 575),
    ("PA", 600),
    ("TX", 625),
    ("WA", 650),
];

/// Flat-rate shipping estimate: domestic vs international tables, with
/// free domestic standard shipping at the subtotal threshold.
pub fn estimate_shipping(address: &Address, subtotal: Decimal, method: ShippingMethod) -> Decimal {
    if address.is_domestic() {
        match method {
            ShippingMethod::Standard => {
                if subtotal >= FREE_SHIPPING_THRESHOLD {
                    Decimal::ZERO
                } else {
                    Decimal::new(599, 2)
                }
            }
            ShippingMethod::Express => Decimal::new(1499, 2),
        }
    } else {
        match method {
            ShippingMethod::Standard => Decimal::new(1999, 2),
            ShippingMethod::Express => Decimal::new(3999, 2),
        }
    }
}

/// Sales tax for the destination: zero for non-US addresses and for US
/// states absent from the rate table.
pub fn calculate_tax(address: &Address, subtotal: Decimal) -> Decimal {
    if !address.is_domestic() {
        return Decimal::ZERO;
    }
    let Some(state) = address.state.as_deref() else {
        return Decimal::ZERO;
    };
    let state = state.to_ascii_uppercase();
    let Some((_, bp)) = STATE_TAX_RATES_BP.iter().find(|(s, _)| *s == state) else {
        return Decimal::ZERO;
    };
    (subtotal * Decimal::new(*bp, 4)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(country: &str, state: Option<&str>) -> Address {
        Address {
            line1: "1 Main St".into(),
            line2: None,
            city: "Springfield".into(),
            state: state.map(String::from),
            postal_code: "90001".into(),
            country: country.into(),
        }
    }

    #[test]
    fn test_california_tax() {
        let tax = calculate_tax(&address("US", Some("CA")), Decimal::from(100));
        assert_eq!(tax, Decimal::new(725, 2));
    }

    #[test]
    fn test_new_york_tax() {
        let tax = calculate_tax(&address("US", Some("NY")), Decimal::from(100));
        assert_eq!(tax, Decimal::from(8));
    }

    #[test]
    fn test_unknown_state_is_zero() {
        assert_eq!(
            calculate_tax(&address("US", Some("OR")), Decimal::from(100)),
            Decimal::ZERO
        );
        assert_eq!(
            calculate_tax(&address("US", None), Decimal::from(100)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_non_us_is_zero() {
        assert_eq!(
            calculate_tax(&address("DE", Some("CA")), Decimal::from(100)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_lowercase_state_code() {
        let tax = calculate_tax(&address("US", Some("ca")), Decimal::from(100));
        assert_eq!(tax, Decimal::new(725, 2));
    }

    #[test]
    fn test_domestic_standard_shipping() {
        let addr = address("US", Some("CA"));
        assert_eq!(
            estimate_shipping(&addr, Decimal::from(20), ShippingMethod::Standard),
            Decimal::new(599, 2)
        );
    }

    #[test]
    fn test_free_shipping_threshold() {
        let addr = address("US", Some("CA"));
        assert_eq!(
            estimate_shipping(&addr, Decimal::from(50), ShippingMethod::Standard),
            Decimal::ZERO
        );
        assert_eq!(
            estimate_shipping(&addr, Decimal::new(4999, 2), ShippingMethod::Standard),
            Decimal::new(599, 2)
        );
    }

    #[test]
    fn test_express_never_free() {
        let addr = address("US", Some("CA"));
        assert_eq!(
            estimate_shipping(&addr, Decimal::from(500), ShippingMethod::Express),
            Decimal::new(1499, 2)
        );
    }

    #[test]
    fn test_international_rates() {
        let addr = address("FR", None);
        assert_eq!(
            estimate_shipping(&addr, Decimal::from(500), ShippingMethod::Standard),
            Decimal::new(1999, 2)
        );
        assert_eq!(
            estimate_shipping(&addr, Decimal::from(10), ShippingMethod::Express),
            Decimal::new(3999, 2)
        );
    }
}
