//! Sale / void / return orchestration.
//!
//! Each operation is `Validating → Pricing → Delegating → Completed|Rejected`:
//! every local failure happens before the single store call, so a rejection
//! never leaves partial state, and the store call itself is all-or-nothing.
//! I/O is awaited sequentially; once delegation starts it is allowed to run to
//! completion regardless of the client connection.

use std::sync::Arc;

use serde_json::json;

use tillpoint_audit::{AuditAction, AuditEntry, AuditRecorder, RequestOrigin};
use tillpoint_auth::{Role, allowed};
use tillpoint_core::{DomainError, DomainResult, SaleId, TenantId};
use tillpoint_sales::{
    CreateSaleRequest, ReturnRequest, Sale, SaleStatus, VOID_ROLES, price_sale, validate_return,
    validate_void_reason,
};
use tillpoint_store::{
    ProductCatalog, ReturnCommand, ReturnReceipt, SaleDraft, SaleReceipt, SaleStore, VoidCommand,
    VoidReceipt,
};
use tillpoint_tenancy::{SecurityContext, TenantScope, stamp_tenant};

/// Roles that may create sales. Inventory managers handle stock, not the till.
pub const SALE_ROLES: &[Role] = &[
    Role::PlatformAdmin,
    Role::TenantAdmin,
    Role::TenantManager,
    Role::Cashier,
];

fn required_role_names(roles: &[Role]) -> Vec<&'static str> {
    roles.iter().map(|r| r.as_str()).collect()
}

#[derive(Clone)]
pub struct Coordinator {
    catalog: Arc<dyn ProductCatalog>,
    store: Arc<dyn SaleStore>,
    audit: AuditRecorder,
}

impl Coordinator {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        store: Arc<dyn SaleStore>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            catalog,
            store,
            audit,
        }
    }

    /// Create a sale.
    ///
    /// `explicit_tenant` is honored only for platform actors (`stamp_tenant`);
    /// everyone else always sells into their own tenant.
    pub async fn create_sale(
        &self,
        ctx: &SecurityContext,
        request: CreateSaleRequest,
        explicit_tenant: Option<TenantId>,
        origin: RequestOrigin,
    ) -> DomainResult<SaleReceipt> {
        if !allowed(ctx.role(), SALE_ROLES) {
            return Err(DomainError::InsufficientRole {
                required: required_role_names(SALE_ROLES),
            });
        }

        let scope = TenantScope::for_context(ctx)?;
        let tenant_id = stamp_tenant(ctx, explicit_tenant)?;

        // Pricing uses authoritative rows only; an unresolved product fails
        // closed before anything is delegated.
        let product_ids: Vec<_> = request.items.iter().map(|l| l.product_id).collect();
        let quotes = self.catalog.quotes(scope, &product_ids).await?;
        let priced = price_sale(&request, &quotes, ctx.tax_rate_bps())?;

        let draft = SaleDraft {
            tenant_id,
            idempotency_key: priced.idempotency_key,
            items: priced.items,
            subtotal: priced.subtotal,
            discount: priced.discount,
            tax: priced.tax,
            total: priced.total,
            payment: request.payment,
            customer_id: request.customer_id,
            customer_name: request
                .customer_name
                .unwrap_or_else(|| "Walk-in".to_string()),
            cashier_id: ctx.user_id(),
            branch_id: ctx.branch_id(),
        };
        let items_count = draft.items.len();

        let receipt = self.store.process_sale(draft).await?;

        tracing::info!(
            tenant = %tenant_id,
            sale = %receipt.sale_id,
            invoice = %receipt.invoice_number,
            total = receipt.total,
            "sale completed"
        );

        self.audit.record(AuditEntry::new(
            ctx.user_id(),
            ctx.role(),
            Some(tenant_id),
            AuditAction::CreateSale,
            "sales",
            receipt.sale_id.to_string(),
            Some(json!({
                "invoice_number": receipt.invoice_number,
                "total_amount": receipt.total,
                "items_count": items_count,
            })),
            origin,
        ));

        Ok(receipt)
    }

    /// Void a sale. Privileged roles only; a denied attempt is itself written
    /// to the audit trail before the error is returned.
    pub async fn void_sale(
        &self,
        ctx: &SecurityContext,
        sale_id: SaleId,
        reason: &str,
        manager_id: Option<tillpoint_core::UserId>,
        auth_code: Option<String>,
        origin: RequestOrigin,
    ) -> DomainResult<VoidReceipt> {
        if !allowed(ctx.role(), VOID_ROLES) {
            tracing::warn!(
                actor = %ctx.user_id(),
                role = %ctx.role(),
                sale = %sale_id,
                "unauthorized void attempt"
            );
            // Awaited deliberately: there is no primary operation to protect,
            // and the denial must be on the trail before the caller sees 403.
            self.audit
                .record_now(AuditEntry::new(
                    ctx.user_id(),
                    ctx.role(),
                    ctx.tenant_id(),
                    AuditAction::VoidAttemptDenied,
                    "sales",
                    sale_id.to_string(),
                    Some(json!({ "reason": "insufficient permissions" })),
                    origin,
                ))
                .await;
            return Err(DomainError::InsufficientRole {
                required: required_role_names(VOID_ROLES),
            });
        }

        let reason = validate_void_reason(reason)?;

        let scope = TenantScope::for_context(ctx)?;
        let sale = self
            .store
            .sale(scope, sale_id)
            .await?
            .ok_or(DomainError::NotFoundOrForbidden)?;

        if sale.status == SaleStatus::Voided {
            return Err(DomainError::AlreadyVoided);
        }

        let receipt = self
            .store
            .void_sale(
                sale.tenant_id,
                VoidCommand {
                    sale_id,
                    voided_by: ctx.user_id(),
                    reason: reason.clone(),
                    manager_id: manager_id.unwrap_or_else(|| ctx.user_id()),
                    auth_code,
                },
            )
            .await?;

        tracing::info!(
            sale = %sale_id,
            invoice = %receipt.invoice_number,
            by = %ctx.user_id(),
            "sale voided, stock restored"
        );

        self.audit.record(AuditEntry::new(
            ctx.user_id(),
            ctx.role(),
            Some(sale.tenant_id),
            AuditAction::VoidSale,
            "sales",
            sale_id.to_string(),
            Some(json!({
                "invoice_number": receipt.invoice_number,
                "original_amount": sale.total,
                "reason": reason,
                "items_count": receipt.items_affected,
            })),
            origin,
        ));

        Ok(receipt)
    }

    /// Process a return against a prior sale.
    pub async fn process_return(
        &self,
        ctx: &SecurityContext,
        request: ReturnRequest,
        origin: RequestOrigin,
    ) -> DomainResult<ReturnReceipt> {
        let scope = TenantScope::for_context(ctx)?;
        let sale = self
            .store
            .sale(scope, request.sale_id)
            .await?
            .ok_or(DomainError::NotFoundOrForbidden)?;

        validate_return(&request, &sale)?;

        let receipt = self
            .store
            .process_return(
                sale.tenant_id,
                ReturnCommand {
                    sale_id: request.sale_id,
                    items: request.items,
                    reason: request.reason.unwrap_or_else(|| "N/A".to_string()),
                    cashier_id: ctx.user_id(),
                },
            )
            .await?;

        self.audit.record(AuditEntry::new(
            ctx.user_id(),
            ctx.role(),
            Some(sale.tenant_id),
            AuditAction::ProcessReturn,
            "returns",
            receipt.return_id.to_string(),
            Some(json!({
                "sale_id": request.sale_id,
                "refund_amount": receipt.refund_amount,
            })),
            origin,
        ));

        Ok(receipt)
    }

    /// Fetch a sale within the caller's scope.
    pub async fn sale(&self, ctx: &SecurityContext, sale_id: SaleId) -> DomainResult<Sale> {
        let scope = TenantScope::for_context(ctx)?;
        self.store
            .sale(scope, sale_id)
            .await?
            .ok_or(DomainError::NotFoundOrForbidden)
    }

    pub async fn list_sales(
        &self,
        ctx: &SecurityContext,
        query: tillpoint_store::ListQuery,
    ) -> DomainResult<tillpoint_store::SalePage> {
        let scope = TenantScope::for_context(ctx)?;
        self.store.list_sales(scope, query).await
    }

    pub async fn return_record(
        &self,
        ctx: &SecurityContext,
        return_id: tillpoint_core::ReturnId,
    ) -> DomainResult<tillpoint_store::ReturnRecord> {
        let scope = TenantScope::for_context(ctx)?;
        self.store
            .return_record(scope, return_id)
            .await?
            .ok_or(DomainError::NotFoundOrForbidden)
    }

    pub async fn list_returns(
        &self,
        ctx: &SecurityContext,
        query: tillpoint_store::ListQuery,
    ) -> DomainResult<(Vec<tillpoint_store::ReturnRecord>, u64)> {
        let scope = TenantScope::for_context(ctx)?;
        self.store.list_returns(scope, query).await
    }

    /// Track an invoice print; reprints go on the audit trail.
    pub async fn track_print(
        &self,
        ctx: &SecurityContext,
        sale_id: SaleId,
        origin: RequestOrigin,
    ) -> DomainResult<u32> {
        let scope = TenantScope::for_context(ctx)?;
        let count = self.store.track_print(scope, sale_id, ctx.user_id()).await?;

        if count > 1 {
            self.audit.record(AuditEntry::new(
                ctx.user_id(),
                ctx.role(),
                ctx.tenant_id(),
                AuditAction::TrackPrint,
                "sales",
                sale_id.to_string(),
                Some(json!({ "print_count": count, "reprint": true })),
                origin,
            ));
        }

        Ok(count)
    }

    pub fn audit(&self) -> &AuditRecorder {
        &self.audit
    }
}
