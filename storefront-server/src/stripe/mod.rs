//! Payment gateway integration via REST API (no SDK dependency)

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sha2::Sha256;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Convert a decimal amount to the gateway's minor units (cents).
pub fn to_minor_units(amount: Decimal) -> Result<i64, BoxError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| format!("Amount out of range: {amount}").into())
}

/// Create a PaymentIntent for an order. The order id travels in the
/// intent metadata and comes back on webhook events.
pub async fn create_payment_intent(
    secret_key: &str,
    amount: Decimal,
    currency: &str,
    order_id: i64,
    order_number: &str,
) -> Result<String, BoxError> {
    let minor = to_minor_units(amount)?;
    let client = reqwest::Client::new();
    let resp: serde_json::Value = client
        .post("https://api.stripe.com/v1/payment_intents")
        .basic_auth(secret_key, None::<&str>)
        .form(&[
            ("amount", minor.to_string().as_str()),
            ("currency", currency.to_lowercase().as_str()),
            ("metadata[order_id]", order_id.to_string().as_str()),
            ("metadata[order_number]", order_number),
            ("automatic_payment_methods[enabled]", "true"),
        ])
        .send()
        .await?
        .json()
        .await?;

    resp["id"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| format!("Stripe create_payment_intent failed: {resp}").into())
}

/// Refund a PaymentIntent, fully or partially.
pub async fn create_refund(
    secret_key: &str,
    payment_intent_id: &str,
    amount: Option<Decimal>,
) -> Result<String, BoxError> {
    let client = reqwest::Client::new();
    let mut form: Vec<(&str, String)> = vec![("payment_intent", payment_intent_id.to_string())];
    if let Some(amount) = amount {
        form.push(("amount", to_minor_units(amount)?.to_string()));
    }

    let resp: serde_json::Value = client
        .post("https://api.stripe.com/v1/refunds")
        .basic_auth(secret_key, None::<&str>)
        .form(&form)
        .send()
        .await?
        .json()
        .await?;

    resp["id"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| format!("Stripe create_refund failed: {resp}").into())
}

/// Verify Stripe webhook signature (HMAC-SHA256)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    // Decode hex signature and use constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    // Reject events older than 5 minutes to prevent replay attacks
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > 300 {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap());
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed_payload.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(Decimal::from_str("12.34").unwrap()).unwrap(), 1234);
        assert_eq!(to_minor_units(Decimal::from(8)).unwrap(), 800);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"id":"evt_1"}"#;
        let secret = "whsec_test";
        let header = sign(payload, secret, chrono::Utc::now().timestamp());
        assert!(verify_webhook_signature(payload, &header, secret).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, "whsec_a", chrono::Utc::now().timestamp());
        assert_eq!(
            verify_webhook_signature(payload, &header, "whsec_b"),
            Err("Webhook signature mismatch")
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let secret = "whsec_test";
        let header = sign(br#"{"id":"evt_1"}"#, secret, chrono::Utc::now().timestamp());
        assert_eq!(
            verify_webhook_signature(br#"{"id":"evt_2"}"#, &header, secret),
            Err("Webhook signature mismatch")
        );
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let secret = "whsec_test";
        let header = sign(payload, secret, chrono::Utc::now().timestamp() - 600);
        assert_eq!(
            verify_webhook_signature(payload, &header, secret),
            Err("Webhook timestamp too old")
        );
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert_eq!(
            verify_webhook_signature(b"{}", "v1=abc", "whsec_test"),
            Err("Invalid Stripe-Signature header")
        );
        assert_eq!(
            verify_webhook_signature(b"{}", "t=123", "whsec_test"),
            Err("Invalid Stripe-Signature header")
        );
    }
}
