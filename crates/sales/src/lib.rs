//! `tillpoint-sales` — pure sale/void/return domain.
//!
//! Validation and pricing are deterministic functions with no I/O; the
//! coordinator crate feeds them authoritative data and delegates the atomic
//! part to the store.

pub mod pricing;
pub mod returns;
pub mod sale;
pub mod void;

pub use pricing::{
    CreateSaleRequest, MAX_DISCOUNT_CENTS, MAX_LINE_ITEMS, MAX_UNITS_PER_LINE, PricedSale,
    ProductQuote, RequestedLine, derive_tax, price_sale, validate_request,
};
pub use returns::{ReturnLine, ReturnRequest, validate_return};
pub use sale::{PaymentMethod, Sale, SaleItem, SaleStatus};
pub use void::{MIN_VOID_REASON_LEN, VOID_ROLES, validate_void_reason};
