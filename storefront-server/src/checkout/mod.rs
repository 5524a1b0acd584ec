//! Checkout: cart validation and order creation
//!
//! Validation is a pure function over resolved catalog rows so the rules
//! are testable without a database; the service resolves the rows, applies
//! the rules, prices the order, and hands a draft to the transactional
//! writer in `db::orders`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shared::error::{AppError, ErrorCode};
use shared::models::{Address, Order, Product, ProductVariant};

use crate::db;
use crate::db::audit::AuditContext;
use crate::db::orders::{DraftLine, OrderDraft};
use crate::error::{ServiceError, ServiceResult};
use crate::pricing::{self, ShippingMethod};
use crate::state::AppState;

/// One requested cart line
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemRequest {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i32,
}

/// A requested line joined with what the catalog resolved for it
#[derive(Debug)]
pub struct ResolvedLine {
    pub request: CartItemRequest,
    pub product: Option<Product>,
    pub variant: Option<ProductVariant>,
}

/// A cart line that passed validation, with resolved price and stock
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedItem {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    pub track_inventory: bool,
    /// Remaining stock for tracked lines, absent when tracking is disabled
    pub available: Option<i32>,
}

/// Outcome of cart validation: every line is checked and every error
/// collected before returning.
#[derive(Debug, Serialize)]
pub struct CartValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub items: Vec<ValidatedItem>,
    pub subtotal: Decimal,
}

/// Validate requested lines against resolved catalog rows.
///
/// An unresolvable or short-stocked line contributes one error and is
/// excluded from `items`; the remaining lines still resolve in the same
/// call. Subtotal sums the resolvable lines only.
pub fn validate_cart(lines: &[ResolvedLine]) -> CartValidation {
    let mut errors = Vec::new();
    let mut items = Vec::new();
    let mut subtotal = Decimal::ZERO;

    for line in lines {
        let Some(product) = &line.product else {
            errors.push(format!("Product {} not found", line.request.product_id));
            continue;
        };

        let variant = match line.request.variant_id {
            Some(variant_id) => match &line.variant {
                Some(v) => Some(v),
                None => {
                    errors.push(format!(
                        "Variant {} not found for {}",
                        variant_id, product.name
                    ));
                    continue;
                }
            },
            None => None,
        };

        if line.request.quantity <= 0 {
            errors.push(format!("Invalid quantity for {}", product.name));
            continue;
        }

        let available = product
            .track_inventory
            .then(|| variant.map(|v| v.quantity).unwrap_or(product.quantity));

        if let Some(available) = available
            && line.request.quantity > available
        {
            errors.push(format!(
                "Insufficient stock for {}. Available: {}, Requested: {}",
                product.name, available, line.request.quantity
            ));
            continue;
        }

        let unit_price = variant.and_then(|v| v.price).unwrap_or(product.price);
        let line_total = (unit_price * Decimal::from(line.request.quantity)).round_dp(2);
        subtotal += line_total;

        items.push(ValidatedItem {
            product_id: product.id,
            variant_id: variant.map(|v| v.id),
            name: product.name.clone(),
            sku: variant.map(|v| v.sku.clone()).unwrap_or_else(|| product.sku.clone()),
            unit_price,
            quantity: line.request.quantity,
            line_total,
            track_inventory: product.track_inventory,
            available,
        });
    }

    CartValidation {
        is_valid: errors.is_empty(),
        errors,
        items,
        subtotal: subtotal.round_dp(2),
    }
}

/// Resolve requested lines against the tenant's catalog.
pub async fn resolve_lines(
    state: &AppState,
    tenant_id: &str,
    items: &[CartItemRequest],
) -> ServiceResult<Vec<ResolvedLine>> {
    let mut out = Vec::with_capacity(items.len());
    for request in items {
        let product = db::products::find(&state.pool, tenant_id, request.product_id)
            .await
            .map_err(ServiceError::from)?;
        let variant = match (&product, request.variant_id) {
            (Some(p), Some(variant_id)) => {
                db::products::find_variant(&state.pool, p.id, variant_id)
                    .await
                    .map_err(ServiceError::from)?
            }
            _ => None,
        };
        out.push(ResolvedLine {
            request: request.clone(),
            product,
            variant,
        });
    }
    Ok(out)
}

/// Checkout payload
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartItemRequest>,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: Address,
    /// Defaults to the shipping address
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
}

/// Validate the cart, price the order, and persist it atomically with
/// stock decrements and inventory logs. Serialization conflicts retry
/// with bounded backoff.
pub async fn checkout(
    state: &AppState,
    tenant_id: &str,
    req: &CheckoutRequest,
    ctx: &AuditContext,
) -> ServiceResult<Order> {
    if req.items.is_empty() {
        return Err(ServiceError::App(AppError::new(ErrorCode::OrderEmpty)));
    }

    let resolved = resolve_lines(state, tenant_id, &req.items).await?;
    let validation = validate_cart(&resolved);
    if !validation.is_valid {
        return Err(ServiceError::App(
            AppError::with_message(ErrorCode::ValidationFailed, "Cart validation failed")
                .with_detail("errors", serde_json::json!(validation.errors)),
        ));
    }

    let subtotal = validation.subtotal;
    let tax = pricing::calculate_tax(&req.shipping_address, subtotal);
    let shipping = pricing::estimate_shipping(&req.shipping_address, subtotal, req.shipping_method);
    let discount = Decimal::ZERO;
    let total = subtotal + tax + shipping - discount;

    let shipping_address = serde_json::to_value(&req.shipping_address)
        .map_err(|e| ServiceError::Db(e.into()))?;
    let billing_address = match &req.billing_address {
        Some(addr) => serde_json::to_value(addr).map_err(|e| ServiceError::Db(e.into()))?,
        None => shipping_address.clone(),
    };

    let draft = OrderDraft {
        customer_name: req.customer_name.clone(),
        customer_email: req.customer_email.clone(),
        shipping_address,
        billing_address,
        currency: "USD".into(),
        subtotal,
        tax,
        shipping,
        discount,
        total,
        lines: validation
            .items
            .iter()
            .map(|item| DraftLine {
                product_id: item.product_id,
                variant_id: item.variant_id,
                name: item.name.clone(),
                sku: item.sku.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
                track_inventory: item.track_inventory,
            })
            .collect(),
    };

    let order =
        db::with_retry(|| db::orders::create_checkout_order(&state.pool, tenant_id, &draft)).await?;

    let changes = serde_json::json!({
        "order_number": order.order_number,
        "total": order.total,
        "items": draft.lines.len(),
    });
    let _ = db::audit::log(
        &state.pool,
        Some(tenant_id),
        "order_created",
        "order",
        &order.id.to_string(),
        Some(&changes),
        ctx,
        shared::util::now_millis(),
    )
    .await;

    tracing::info!(
        order_number = %order.order_number,
        total = %order.total,
        "Checkout completed"
    );

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(id: i64, name: &str, price: &str, track: bool, quantity: i32) -> Product {
        Product {
            id,
            tenant_id: "t1".into(),
            name: name.into(),
            sku: format!("SKU-{id}"),
            price: Decimal::from_str(price).unwrap(),
            category_id: None,
            brand_id: None,
            track_inventory: track,
            quantity,
            low_stock_threshold: 5,
            is_active: true,
            deleted_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn line(product: Option<Product>, variant: Option<ProductVariant>, quantity: i32) -> ResolvedLine {
        let product_id = product.as_ref().map(|p| p.id).unwrap_or(999);
        ResolvedLine {
            request: CartItemRequest {
                product_id,
                variant_id: variant.as_ref().map(|v| v.id),
                quantity,
            },
            product,
            variant,
        }
    }

    #[test]
    fn test_valid_cart() {
        let validation = validate_cart(&[
            line(Some(product(1, "Mug", "12.50", true, 10)), None, 2),
            line(Some(product(2, "Shirt", "30.00", true, 3)), None, 1),
        ]);
        assert!(validation.is_valid);
        assert!(validation.errors.is_empty());
        assert_eq!(validation.items.len(), 2);
        assert_eq!(validation.subtotal, Decimal::from_str("55.00").unwrap());
    }

    #[test]
    fn test_missing_product_collects_error_and_keeps_valid_lines() {
        let validation = validate_cart(&[
            line(None, None, 1),
            line(Some(product(2, "Shirt", "30.00", true, 3)), None, 1),
        ]);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 1);
        assert_eq!(validation.items.len(), 1);
        assert_eq!(validation.errors[0], "Product 999 not found");
        assert_eq!(validation.subtotal, Decimal::from_str("30.00").unwrap());
    }

    #[test]
    fn test_insufficient_stock_message_wording() {
        let validation =
            validate_cart(&[line(Some(product(1, "Mug", "12.50", true, 2)), None, 5)]);
        assert!(!validation.is_valid);
        assert_eq!(
            validation.errors[0],
            "Insufficient stock for Mug. Available: 2, Requested: 5"
        );
        assert!(validation.items.is_empty());
        assert_eq!(validation.subtotal, Decimal::ZERO);
    }

    #[test]
    fn test_one_bad_line_one_good_line() {
        let validation = validate_cart(&[
            line(Some(product(1, "Mug", "12.50", true, 0)), None, 1),
            line(Some(product(2, "Shirt", "30.00", true, 3)), None, 2),
        ]);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 1);
        assert_eq!(validation.items.len(), 1);
    }

    #[test]
    fn test_untracked_product_skips_stock_check() {
        let validation =
            validate_cart(&[line(Some(product(1, "Ebook", "9.99", false, 0)), None, 50)]);
        assert!(validation.is_valid);
        assert_eq!(validation.items[0].available, None);
        assert_eq!(
            validation.subtotal,
            Decimal::from_str("499.50").unwrap()
        );
    }

    #[test]
    fn test_variant_stock_and_price_override() {
        let variant = ProductVariant {
            id: 11,
            product_id: 1,
            name: "Large".into(),
            sku: "SKU-1-L".into(),
            price: Some(Decimal::from_str("15.00").unwrap()),
            quantity: 1,
        };
        let validation = validate_cart(&[line(
            Some(product(1, "Shirt", "12.00", true, 100)),
            Some(variant.clone()),
            1,
        )]);
        assert!(validation.is_valid);
        assert_eq!(validation.items[0].unit_price, Decimal::from_str("15.00").unwrap());
        assert_eq!(validation.items[0].sku, "SKU-1-L");
        assert_eq!(validation.items[0].available, Some(1));

        // Variant stock, not product stock, limits the line
        let validation = validate_cart(&[line(
            Some(product(1, "Shirt", "12.00", true, 100)),
            Some(variant),
            2,
        )]);
        assert!(!validation.is_valid);
        assert_eq!(
            validation.errors[0],
            "Insufficient stock for Shirt. Available: 1, Requested: 2"
        );
    }

    #[test]
    fn test_missing_variant_is_an_error() {
        let mut resolved = line(Some(product(1, "Shirt", "12.00", true, 100)), None, 1);
        resolved.request.variant_id = Some(42);
        let validation = validate_cart(&[resolved]);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors[0], "Variant 42 not found for Shirt");
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let validation =
            validate_cart(&[line(Some(product(1, "Mug", "12.50", true, 10)), None, 0)]);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors[0], "Invalid quantity for Mug");
    }
}
