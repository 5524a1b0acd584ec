//! Unified error codes for the storefront platform
//!
//! This module defines all error codes used across the server and clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Tenant errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Too many requests in the current window
    RateLimitExceeded = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1005,
    /// Password too short
    PasswordTooShort = 1006,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Tenant ====================
    /// Tenant not found
    TenantNotFound = 3001,
    /// Tenant account is suspended
    TenantSuspended = 3002,
    /// Tenant email already registered
    TenantEmailExists = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested status transition is not allowed
    InvalidOrderTransition = 4002,
    /// Tracking number required for this transition
    TrackingNumberRequired = 4003,
    /// Order has no line items
    OrderEmpty = 4004,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Payment not found
    PaymentNotFound = 5002,
    /// Payment is not in a refundable state
    PaymentNotCompleted = 5003,
    /// Payment has no gateway intent reference
    PaymentIntentMissing = 5004,
    /// Payment has already been refunded
    PaymentAlreadyRefunded = 5005,
    /// Refund amount exceeds payment
    RefundExceedsAmount = 5006,
    /// Webhook signature verification failed
    WebhookSignatureInvalid = 5007,

    // ==================== 6xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product SKU already exists for this tenant
    ProductSkuExists = 6002,
    /// Requested quantity exceeds available stock
    InsufficientStock = 6003,
    /// Product variant not found
    VariantNotFound = 6004,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category has products
    CategoryHasProducts = 6102,
    /// Category slug already exists
    CategorySlugExists = 6103,
    /// Brand not found
    BrandNotFound = 6201,
    /// Brand has products
    BrandHasProducts = 6202,
    /// Brand slug already exists
    BrandSlugExists = 6203,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Transaction aborted, nothing was committed
    TransactionAborted = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::RateLimitExceeded => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Tenant
            ErrorCode::TenantNotFound => "Tenant not found",
            ErrorCode::TenantSuspended => "Tenant account is suspended",
            ErrorCode::TenantEmailExists => "Email is already registered",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidOrderTransition => "Invalid order status transition",
            ErrorCode::TrackingNumberRequired => {
                "Tracking number is required to mark an order as shipped"
            }
            ErrorCode::OrderEmpty => "Order has no line items",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentNotCompleted => "Can only refund completed payments",
            ErrorCode::PaymentIntentMissing => "Payment intent ID not found",
            ErrorCode::PaymentAlreadyRefunded => "Payment has already been refunded",
            ErrorCode::RefundExceedsAmount => "Refund amount exceeds original payment",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature verification failed",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductSkuExists => "Product SKU already exists",
            ErrorCode::InsufficientStock => "Requested quantity exceeds available stock",
            ErrorCode::VariantNotFound => "Product variant not found",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasProducts => "Category has products",
            ErrorCode::CategorySlugExists => "Category slug already exists",
            ErrorCode::BrandNotFound => "Brand not found",
            ErrorCode::BrandHasProducts => "Brand has products",
            ErrorCode::BrandSlugExists => "Brand slug already exists",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::TransactionAborted => "Transaction failed, no changes were committed",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::RateLimitExceeded),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::AccountDisabled),
            1006 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Tenant
            3001 => Ok(ErrorCode::TenantNotFound),
            3002 => Ok(ErrorCode::TenantSuspended),
            3003 => Ok(ErrorCode::TenantEmailExists),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidOrderTransition),
            4003 => Ok(ErrorCode::TrackingNumberRequired),
            4004 => Ok(ErrorCode::OrderEmpty),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentNotFound),
            5003 => Ok(ErrorCode::PaymentNotCompleted),
            5004 => Ok(ErrorCode::PaymentIntentMissing),
            5005 => Ok(ErrorCode::PaymentAlreadyRefunded),
            5006 => Ok(ErrorCode::RefundExceedsAmount),
            5007 => Ok(ErrorCode::WebhookSignatureInvalid),

            // Catalog
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductSkuExists),
            6003 => Ok(ErrorCode::InsufficientStock),
            6004 => Ok(ErrorCode::VariantNotFound),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategoryHasProducts),
            6103 => Ok(ErrorCode::CategorySlugExists),
            6201 => Ok(ErrorCode::BrandNotFound),
            6202 => Ok(ErrorCode::BrandHasProducts),
            6203 => Ok(ErrorCode::BrandSlugExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::TransactionAborted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.message(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::RateLimitExceeded.code(), 9);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::TenantNotFound.code(), 3001);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::InvalidOrderTransition.code(), 4002);
        assert_eq!(ErrorCode::PaymentNotCompleted.code(), 5003);
        assert_eq!(ErrorCode::InsufficientStock.code(), 6003);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::InternalError.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(4002), Ok(ErrorCode::InvalidOrderTransition));
        assert_eq!(ErrorCode::try_from(5004), Ok(ErrorCode::PaymentIntentMissing));
        assert_eq!(ErrorCode::try_from(6102), Ok(ErrorCode::CategoryHasProducts));
        assert_eq!(ErrorCode::try_from(9006), Ok(ErrorCode::TransactionAborted));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(123), Err(InvalidErrorCode(123)));
        assert_eq!(ErrorCode::try_from(7001), Err(InvalidErrorCode(7001)));
        assert_eq!(ErrorCode::try_from(u16::MAX), Err(InvalidErrorCode(u16::MAX)));
    }

    #[test]
    fn test_from_error_code_to_u16() {
        let v: u16 = ErrorCode::OrderNotFound.into();
        assert_eq!(v, 4001);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::ProductNotFound).unwrap();
        assert_eq!(json, "6001");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("5003").unwrap();
        assert_eq!(code, ErrorCode::PaymentNotCompleted);
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("60000");
        assert!(result.is_err());
    }

    #[test]
    fn test_message() {
        assert_eq!(
            ErrorCode::PaymentNotCompleted.message(),
            "Can only refund completed payments"
        );
        assert_eq!(
            ErrorCode::PaymentIntentMissing.message(),
            "Payment intent ID not found"
        );
        assert_eq!(
            ErrorCode::TrackingNumberRequired.message(),
            "Tracking number is required to mark an order as shipped"
        );
    }

    #[test]
    fn test_roundtrip() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::RateLimitExceeded,
            ErrorCode::InvalidCredentials,
            ErrorCode::TenantSuspended,
            ErrorCode::InvalidOrderTransition,
            ErrorCode::WebhookSignatureInvalid,
            ErrorCode::BrandHasProducts,
            ErrorCode::TransactionAborted,
        ];
        for code in codes {
            let v: u16 = code.into();
            assert_eq!(ErrorCode::try_from(v), Ok(code));
        }
    }
}
