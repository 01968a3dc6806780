//! Sale validation and pricing.
//!
//! The first two stages of the coordinator's state machine, as pure functions:
//! `validate_request` (shape and bounds) and `price_sale` (authoritative
//! prices, discount rules, tax derivation). Client-submitted prices never
//! enter this module.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tillpoint_core::{Cents, CustomerId, DomainError, DomainResult, ProductId, RateBps};

use crate::sale::{PaymentMethod, SaleItem};

/// Hard cap on line items per sale.
pub const MAX_LINE_ITEMS: usize = 100;

/// Hard cap on units in one line.
pub const MAX_UNITS_PER_LINE: u32 = 10_000;

/// Absolute discount ceiling, in minor units.
pub const MAX_DISCOUNT_CENTS: Cents = 100_000_000;

/// One requested line: product reference and quantity only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A sale submission after DTO decoding, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSaleRequest {
    /// Client-supplied token; unique per tenant, replay-safe.
    pub idempotency_key: String,
    pub items: Vec<RequestedLine>,
    pub payment: PaymentMethod,
    pub discount: Cents,
    pub customer_id: Option<CustomerId>,
    pub customer_name: Option<String>,
}

/// Authoritative product row for pricing: tenant-scoped price.
///
/// Deliberately carries no stock level: stock is enforced solely by the
/// store's atomic procedure, after its idempotency dedupe. A local stock
/// rejection would break key replay once the remaining stock drops below the
/// originally sold quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuote {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Cents,
}

/// Output of the pricing stage; ready for delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSale {
    pub idempotency_key: Uuid,
    pub items: Vec<SaleItem>,
    pub subtotal: Cents,
    pub discount: Cents,
    pub tax: Cents,
    pub total: Cents,
}

/// Stage 1: shape and bounds. Every failure names the offending field.
pub fn validate_request(request: &CreateSaleRequest) -> DomainResult<Uuid> {
    let key = request.idempotency_key.trim();
    if key.is_empty() {
        return Err(DomainError::validation(
            "idempotency_key",
            "missing idempotency key; retry from the app",
        ));
    }
    let key = Uuid::from_str(key).map_err(|_| {
        DomainError::validation("idempotency_key", "idempotency key must be a valid UUID")
    })?;

    if request.items.is_empty() {
        return Err(DomainError::validation(
            "items",
            "sale must contain at least one item",
        ));
    }
    if request.items.len() > MAX_LINE_ITEMS {
        return Err(DomainError::validation(
            "items",
            format!("sale cannot contain more than {MAX_LINE_ITEMS} items"),
        ));
    }
    for (i, line) in request.items.iter().enumerate() {
        if line.quantity == 0 {
            return Err(DomainError::validation(
                "items",
                format!("quantity for item {i} must be a positive integer"),
            ));
        }
        if line.quantity > MAX_UNITS_PER_LINE {
            return Err(DomainError::validation(
                "items",
                format!("quantity for item {i} exceeds {MAX_UNITS_PER_LINE} units"),
            ));
        }
    }

    if request.discount < 0 {
        return Err(DomainError::validation(
            "discount",
            "discount cannot be negative",
        ));
    }
    if request.discount > MAX_DISCOUNT_CENTS {
        return Err(DomainError::validation(
            "discount",
            "discount exceeds the maximum allowed value",
        ));
    }

    if request.payment.requires_customer() && request.customer_id.is_none() {
        return Err(DomainError::validation(
            "customer_id",
            "a customer is required for credit payments",
        ));
    }

    Ok(key)
}

/// Derive tax from a tax-inclusive total at `rate_bps` basis points.
///
/// `tax = total − total·10000/(10000 + rate)`, floor division; matches the
/// legacy `total − total/1.13` at 1300 bps.
pub fn derive_tax(total: Cents, rate_bps: RateBps) -> Cents {
    let divisor = 10_000i128 + i128::from(rate_bps);
    let pre_tax = (i128::from(total) * 10_000) / divisor;
    total - pre_tax as Cents
}

/// Stage 2: price against authoritative quotes.
///
/// Fails closed: any requested product that did not resolve within the
/// caller's tenant yields `NotFoundOrForbidden` without confirming which ids
/// exist. Stock is not checked here; the store's procedure is the authority
/// and its idempotency dedupe must see a replayed key before any rejection.
pub fn price_sale(
    request: &CreateSaleRequest,
    quotes: &[ProductQuote],
    rate_bps: RateBps,
) -> DomainResult<PricedSale> {
    let key = validate_request(request)?;

    let mut items = Vec::with_capacity(request.items.len());
    let mut subtotal: Cents = 0;

    for line in &request.items {
        let Some(quote) = quotes.iter().find(|q| q.product_id == line.product_id) else {
            return Err(DomainError::NotFoundOrForbidden);
        };

        let line_total = quote.unit_price * Cents::from(line.quantity);
        subtotal += line_total;
        items.push(SaleItem {
            product_id: quote.product_id,
            name: quote.name.clone(),
            quantity: line.quantity,
            unit_price: quote.unit_price,
            line_total,
        });
    }

    if request.discount > subtotal {
        return Err(DomainError::validation(
            "discount",
            format!(
                "discount ({}) cannot exceed subtotal ({})",
                request.discount, subtotal
            ),
        ));
    }

    let total = subtotal - request.discount;
    if total < 0 {
        return Err(DomainError::validation(
            "discount",
            "total amount cannot be negative",
        ));
    }

    let tax = derive_tax(total, rate_bps);

    Ok(PricedSale {
        idempotency_key: key,
        items,
        subtotal,
        discount: request.discount,
        tax,
        total,
    })
}
