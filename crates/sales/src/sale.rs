//! Sale records and their value types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{BranchId, Cents, CustomerId, ProductId, SaleId, TenantId, UserId};

/// Sale lifecycle. `Voided` is terminal: a voided sale can never be voided
/// again or otherwise mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Completed,
    Voided,
    Cancelled,
}

/// How the sale was paid. A credit component always requires a customer
/// reference so the ledger entry has someone to post against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Credit,
    Mixed { credit: Cents },
}

impl PaymentMethod {
    /// True when this payment posts to a customer credit ledger.
    pub fn requires_customer(&self) -> bool {
        match self {
            PaymentMethod::Credit => true,
            PaymentMethod::Mixed { credit } => *credit > 0,
            PaymentMethod::Cash | PaymentMethod::Card => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Mixed { .. } => "mixed",
        }
    }
}

/// One line of a sale, priced from the authoritative catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Cents,
    pub line_total: Cents,
}

/// A persisted sale as the store returns it on reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub tenant_id: TenantId,
    pub invoice_number: String,
    pub status: SaleStatus,
    pub items: Vec<SaleItem>,
    pub subtotal: Cents,
    pub discount: Cents,
    pub tax: Cents,
    pub total: Cents,
    pub payment: PaymentMethod,
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub cashier_id: UserId,
    pub branch_id: Option<BranchId>,
    pub created_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,
    pub print_count: u32,
}
