//! Collaborator contracts and the structured parameters they take.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tillpoint_core::{
    BranchId, Cents, CustomerId, DomainResult, ProductId, ReturnId, SaleId, TenantId, UserId,
};
use tillpoint_sales::{PaymentMethod, ProductQuote, Sale, SaleItem};
use tillpoint_tenancy::TenantScope;

/// Fully validated and priced sale, ready for the atomic procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    pub tenant_id: TenantId,
    pub idempotency_key: Uuid,
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
}

/// What the sale procedure returns. Identical on replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale_id: SaleId,
    pub invoice_number: String,
    pub total: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidCommand {
    pub sale_id: SaleId,
    pub voided_by: UserId,
    pub reason: String,
    pub manager_id: UserId,
    pub auth_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidReceipt {
    pub sale_id: SaleId,
    pub invoice_number: String,
    pub voided_at: DateTime<Utc>,
    pub items_affected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnCommand {
    pub sale_id: SaleId,
    pub items: Vec<tillpoint_sales::ReturnLine>,
    pub reason: String,
    pub cashier_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub return_id: ReturnId,
    pub sale_id: SaleId,
    pub refund_amount: Cents,
}

/// A persisted return as the store presents it on reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub id: ReturnId,
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub invoice_number: String,
    pub items: Vec<tillpoint_sales::ReturnLine>,
    pub reason: String,
    pub cashier_id: UserId,
    pub refund_amount: Cents,
    pub created_at: DateTime<Utc>,
}

/// Pagination + filters for sale listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub customer_id: Option<CustomerId>,
    pub voided_only: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 50,
            customer_id: None,
            voided_only: false,
        }
    }
}

impl ListQuery {
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1) * self.limit
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalePage {
    pub sales: Vec<Sale>,
    /// Count of every sale matching the filter, not just this page.
    pub total: u64,
    /// Sum of `total` over every matching sale, computed before pagination.
    pub total_amount: Cents,
}

/// Authoritative, tenant-scoped product reads for pricing.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Quotes for the requested products *within the scope*. Products outside
    /// the scope are simply absent from the result; callers fail closed.
    async fn quotes(
        &self,
        scope: TenantScope,
        product_ids: &[ProductId],
    ) -> DomainResult<Vec<ProductQuote>>;
}

/// The transactional sale/void/return collaborator.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Invoke the atomic sale procedure. Exactly-once per idempotency key:
    /// a key replay returns the original receipt.
    async fn process_sale(&self, draft: SaleDraft) -> DomainResult<SaleReceipt>;

    /// Atomic reversal: restores stock and reverses credit ledger entries as
    /// one unit. The caller never compensates partially.
    async fn void_sale(&self, tenant_id: TenantId, cmd: VoidCommand) -> DomainResult<VoidReceipt>;

    /// Atomic return; the procedure enforces returned ≤ sold cumulatively.
    async fn process_return(
        &self,
        tenant_id: TenantId,
        cmd: ReturnCommand,
    ) -> DomainResult<ReturnReceipt>;

    /// Scoped single-sale read. Absence and out-of-scope are both `None`.
    async fn sale(&self, scope: TenantScope, sale_id: SaleId) -> DomainResult<Option<Sale>>;

    async fn list_sales(&self, scope: TenantScope, query: ListQuery) -> DomainResult<SalePage>;

    /// Increment and return the print counter for an invoice.
    async fn track_print(
        &self,
        scope: TenantScope,
        sale_id: SaleId,
        printed_by: UserId,
    ) -> DomainResult<u32>;

    /// Scoped single-return read.
    async fn return_record(
        &self,
        scope: TenantScope,
        return_id: ReturnId,
    ) -> DomainResult<Option<ReturnRecord>>;

    /// Scoped return listing, newest first; `(records, total)`.
    async fn list_returns(
        &self,
        scope: TenantScope,
        query: ListQuery,
    ) -> DomainResult<(Vec<ReturnRecord>, u64)>;
}
