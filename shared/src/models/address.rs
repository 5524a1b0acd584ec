//! Postal address used for shipping, billing, and tax estimation

use serde::{Deserialize, Serialize};

/// Postal address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    /// Two-letter state/province code where applicable
    pub state: Option<String>,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

impl Address {
    /// Domestic means a US destination for shipping/tax purposes
    pub fn is_domestic(&self) -> bool {
        self.country.eq_ignore_ascii_case("US")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(country: &str) -> Address {
        Address {
            line1: "1 Main St".into(),
            line2: None,
            city: "Springfield".into(),
            state: Some("CA".into()),
            postal_code: "90001".into(),
            country: country.into(),
        }
    }

    #[test]
    fn test_is_domestic() {
        assert!(address("US").is_domestic());
        assert!(address("us").is_domestic());
        assert!(!address("DE").is_domestic());
        assert!(!address("CA").is_domestic());
    }
}
