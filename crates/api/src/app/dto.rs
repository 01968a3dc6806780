//! Request/response DTOs and JSON mapping helpers.
//!
//! Wire shapes follow the point-of-sale clients: payment method arrives as a
//! string plus optional details, amounts are integer minor units. Everything
//! is converted to domain types here so handlers stay thin.

use serde::Deserialize;
use serde_json::{Value, json};

use tillpoint_audit::AuditEntry;
use tillpoint_core::{Cents, CustomerId, DomainError, DomainResult, SaleId, TenantId, UserId};
use tillpoint_sales::{CreateSaleRequest, PaymentMethod, RequestedLine, ReturnLine, Sale};
use tillpoint_store::{ListQuery, ReturnRecord};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub idempotency_key: String,
    pub items: Vec<RequestedLine>,
    pub payment_method: String,
    #[serde(default)]
    pub payment_details: Option<PaymentDetails>,
    #[serde(default)]
    pub discount_amount: Cents,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Honored only for platform actors; everyone else sells into their own
    /// tenant regardless.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub credit_amount: Cents,
}

impl CreateOrderRequest {
    pub fn into_domain(self) -> DomainResult<(CreateSaleRequest, Option<TenantId>)> {
        let credit = self.payment_details.as_ref().map(|d| d.credit_amount);
        let payment = payment_from_parts(&self.payment_method, credit)?;
        Ok((
            CreateSaleRequest {
                idempotency_key: self.idempotency_key,
                items: self.items,
                payment,
                discount: self.discount_amount,
                customer_id: self.customer_id,
                customer_name: self.customer_name,
            },
            self.tenant_id,
        ))
    }
}

fn payment_from_parts(method: &str, credit: Option<Cents>) -> DomainResult<PaymentMethod> {
    match method.trim().to_ascii_lowercase().as_str() {
        "cash" => Ok(PaymentMethod::Cash),
        "card" => Ok(PaymentMethod::Card),
        "credit" => Ok(PaymentMethod::Credit),
        "mixed" => Ok(PaymentMethod::Mixed {
            credit: credit.unwrap_or(0),
        }),
        other => Err(DomainError::validation(
            "payment_method",
            format!("unknown payment method `{other}`"),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct VoidRequest {
    pub reason: String,
    #[serde(default)]
    pub manager_id: Option<UserId>,
    #[serde(default)]
    pub auth_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReturnRequest {
    pub sale_id: SaleId,
    pub items: Vec<ReturnLine>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Common pagination/filter query string for listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
}

impl ListParams {
    pub fn to_query(&self, voided_only: bool) -> ListQuery {
        ListQuery {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(50).clamp(1, 200),
            customer_id: self.customer_id,
            voided_only,
        }
    }
}

pub fn sale_json(sale: &Sale) -> Value {
    json!({
        "id": sale.id,
        "tenant_id": sale.tenant_id,
        "invoice_number": sale.invoice_number,
        "status": sale.status,
        "items": sale.items,
        "subtotal": sale.subtotal,
        "discount_amount": sale.discount,
        "tax_amount": sale.tax,
        "total_amount": sale.total,
        "payment_method": sale.payment.label(),
        "customer_id": sale.customer_id,
        "customer_name": sale.customer_name,
        "cashier_id": sale.cashier_id,
        "branch_id": sale.branch_id,
        "created_at": sale.created_at,
        "voided_at": sale.voided_at,
        "void_reason": sale.void_reason,
        "print_count": sale.print_count,
    })
}

pub fn return_json(record: &ReturnRecord) -> Value {
    json!({
        "id": record.id,
        "tenant_id": record.tenant_id,
        "sale_id": record.sale_id,
        "invoice_number": record.invoice_number,
        "items": record.items,
        "reason": record.reason,
        "cashier_id": record.cashier_id,
        "refund_amount": record.refund_amount,
        "created_at": record.created_at,
    })
}

pub fn audit_json(entry: &AuditEntry) -> Value {
    json!({
        "id": entry.id,
        "actor_id": entry.actor_id,
        "actor_role": entry.actor_role,
        "tenant_id": entry.tenant_id,
        "action": entry.action,
        "entity_type": entry.entity_type,
        "entity_id": entry.entity_id,
        "changes": entry.changes,
        "ip_address": entry.origin.ip,
        "user_agent": entry.origin.user_agent,
        "recorded_at": entry.recorded_at,
    })
}
