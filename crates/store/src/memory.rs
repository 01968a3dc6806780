//! In-memory store with the same contract semantics as the Postgres
//! procedures: all-or-nothing mutations under one lock, idempotency-key
//! dedupe, stock that can never go negative.
//!
//! Used by tests and by dev mode when no `DATABASE_URL` is configured.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use tillpoint_core::{
    Cents, DomainError, DomainResult, ProductId, ReturnId, SaleId, TenantId, UserId,
};
use tillpoint_sales::{ProductQuote, Sale, SaleStatus};
use tillpoint_tenancy::{Profile, ProfileDirectory, Tenant, TenantScope};

use crate::contract::{
    ListQuery, ProductCatalog, ReturnCommand, ReturnReceipt, ReturnRecord, SaleDraft, SalePage,
    SaleReceipt, SaleStore, VoidCommand, VoidReceipt,
};

#[derive(Debug, Clone)]
struct ProductRow {
    tenant_id: TenantId,
    name: String,
    unit_price: Cents,
    stock_on_hand: i64,
}

#[derive(Default)]
struct State {
    tenants: HashMap<TenantId, Tenant>,
    profiles: HashMap<UserId, Profile>,
    products: HashMap<ProductId, ProductRow>,
    sales: HashMap<SaleId, Sale>,
    /// `(tenant, key)` → committed sale; the uniqueness constraint.
    idempotency: HashMap<(TenantId, Uuid), SaleId>,
    /// Cumulative returned quantity per sale line.
    returned: HashMap<(SaleId, ProductId), u32>,
    returns: HashMap<ReturnId, ReturnRecord>,
    invoice_seq: HashMap<TenantId, u64>,
}

/// Mutex-guarded tables. Every mutating operation takes the lock once and
/// either applies completely or not at all.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    // ── seeding (tests / dev mode) ──────────────────────────────────────────

    pub fn insert_tenant(&self, tenant: Tenant) {
        self.lock().tenants.insert(tenant.id, tenant);
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.lock().profiles.insert(profile.id, profile);
    }

    pub fn insert_product(
        &self,
        tenant_id: TenantId,
        name: impl Into<String>,
        unit_price: Cents,
        stock_on_hand: i64,
    ) -> ProductId {
        let id = ProductId::new();
        self.lock().products.insert(
            id,
            ProductRow {
                tenant_id,
                name: name.into(),
                unit_price,
                stock_on_hand,
            },
        );
        id
    }

    /// Current stock level, for assertions.
    pub fn stock_of(&self, product_id: ProductId) -> Option<i64> {
        self.lock().products.get(&product_id).map(|p| p.stock_on_hand)
    }
}

impl State {
    fn next_invoice(&mut self, tenant_id: TenantId) -> String {
        let seq = self.invoice_seq.entry(tenant_id).or_insert(0);
        *seq += 1;
        format!("INV-{seq:06}")
    }
}

#[async_trait]
impl ProfileDirectory for MemoryStore {
    async fn profile_with_tenant(
        &self,
        user_id: UserId,
    ) -> DomainResult<Option<(Profile, Option<Tenant>)>> {
        let state = self.lock();
        Ok(state.profiles.get(&user_id).map(|profile| {
            let tenant = profile
                .tenant_id
                .and_then(|id| state.tenants.get(&id))
                .cloned();
            (profile.clone(), tenant)
        }))
    }
}

#[async_trait]
impl ProductCatalog for MemoryStore {
    async fn quotes(
        &self,
        scope: TenantScope,
        product_ids: &[ProductId],
    ) -> DomainResult<Vec<ProductQuote>> {
        let state = self.lock();
        Ok(product_ids
            .iter()
            .filter_map(|id| {
                let row = state.products.get(id)?;
                scope.covers(row.tenant_id).then(|| ProductQuote {
                    product_id: *id,
                    name: row.name.clone(),
                    unit_price: row.unit_price,
                })
            })
            .collect())
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn process_sale(&self, draft: SaleDraft) -> DomainResult<SaleReceipt> {
        let mut state = self.lock();

        // Uniqueness constraint: a replay resolves to the original receipt.
        if let Some(sale_id) = state
            .idempotency
            .get(&(draft.tenant_id, draft.idempotency_key))
        {
            let sale = &state.sales[sale_id];
            return Ok(SaleReceipt {
                sale_id: sale.id,
                invoice_number: sale.invoice_number.clone(),
                total: sale.total,
            });
        }

        // Stock check before any mutation; the whole call is all-or-nothing.
        for item in &draft.items {
            let row = state
                .products
                .get(&item.product_id)
                .filter(|p| p.tenant_id == draft.tenant_id)
                .ok_or(DomainError::NotFoundOrForbidden)?;
            if row.stock_on_hand < i64::from(item.quantity) {
                return Err(DomainError::delegate_rejected(format!(
                    "insufficient stock for {}",
                    row.name
                )));
            }
        }

        for item in &draft.items {
            if let Some(row) = state.products.get_mut(&item.product_id) {
                row.stock_on_hand -= i64::from(item.quantity);
            }
        }

        let sale_id = SaleId::new();
        let invoice_number = state.next_invoice(draft.tenant_id);
        let sale = Sale {
            id: sale_id,
            tenant_id: draft.tenant_id,
            invoice_number: invoice_number.clone(),
            status: SaleStatus::Completed,
            items: draft.items,
            subtotal: draft.subtotal,
            discount: draft.discount,
            tax: draft.tax,
            total: draft.total,
            payment: draft.payment,
            customer_id: draft.customer_id,
            customer_name: draft.customer_name,
            cashier_id: draft.cashier_id,
            branch_id: draft.branch_id,
            created_at: Utc::now(),
            voided_at: None,
            void_reason: None,
            print_count: 0,
        };
        let total = sale.total;
        state.sales.insert(sale_id, sale);
        state
            .idempotency
            .insert((draft.tenant_id, draft.idempotency_key), sale_id);

        Ok(SaleReceipt {
            sale_id,
            invoice_number,
            total,
        })
    }

    async fn void_sale(&self, tenant_id: TenantId, cmd: VoidCommand) -> DomainResult<VoidReceipt> {
        let mut state = self.lock();

        let sale = state
            .sales
            .get(&cmd.sale_id)
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .ok_or(DomainError::NotFoundOrForbidden)?;

        if sale.status == SaleStatus::Voided {
            return Err(DomainError::AlreadyVoided);
        }

        for item in &sale.items {
            if let Some(row) = state.products.get_mut(&item.product_id) {
                row.stock_on_hand += i64::from(item.quantity);
            }
        }

        let voided_at = Utc::now();
        let items_affected = sale.items.len();
        let invoice_number = sale.invoice_number.clone();
        if let Some(stored) = state.sales.get_mut(&cmd.sale_id) {
            stored.status = SaleStatus::Voided;
            stored.voided_at = Some(voided_at);
            stored.void_reason = Some(cmd.reason);
        }

        Ok(VoidReceipt {
            sale_id: cmd.sale_id,
            invoice_number,
            voided_at,
            items_affected,
        })
    }

    async fn process_return(
        &self,
        tenant_id: TenantId,
        cmd: ReturnCommand,
    ) -> DomainResult<ReturnReceipt> {
        let mut state = self.lock();

        let sale = state
            .sales
            .get(&cmd.sale_id)
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .ok_or(DomainError::NotFoundOrForbidden)?;

        if sale.status == SaleStatus::Voided {
            return Err(DomainError::delegate_rejected(
                "cannot return items on a voided sale",
            ));
        }

        // Cumulative check across prior returns, before any mutation.
        let mut refund: Cents = 0;
        for line in &cmd.items {
            let sold = sale
                .items
                .iter()
                .find(|i| i.product_id == line.product_id)
                .ok_or_else(|| {
                    DomainError::delegate_rejected("returned item was not part of the sale")
                })?;
            let already = state
                .returned
                .get(&(cmd.sale_id, line.product_id))
                .copied()
                .unwrap_or(0);
            if already + line.quantity > sold.quantity {
                return Err(DomainError::delegate_rejected(
                    "returned quantity exceeds quantity sold",
                ));
            }
            refund += sold.unit_price * Cents::from(line.quantity);
        }

        for line in &cmd.items {
            *state
                .returned
                .entry((cmd.sale_id, line.product_id))
                .or_insert(0) += line.quantity;
            if let Some(row) = state.products.get_mut(&line.product_id) {
                row.stock_on_hand += i64::from(line.quantity);
            }
        }

        let return_id = ReturnId::new();
        state.returns.insert(
            return_id,
            ReturnRecord {
                id: return_id,
                tenant_id,
                sale_id: cmd.sale_id,
                invoice_number: sale.invoice_number.clone(),
                items: cmd.items,
                reason: cmd.reason,
                cashier_id: cmd.cashier_id,
                refund_amount: refund,
                created_at: Utc::now(),
            },
        );

        Ok(ReturnReceipt {
            return_id,
            sale_id: cmd.sale_id,
            refund_amount: refund,
        })
    }

    async fn sale(&self, scope: TenantScope, sale_id: SaleId) -> DomainResult<Option<Sale>> {
        let state = self.lock();
        Ok(state
            .sales
            .get(&sale_id)
            .filter(|s| scope.covers(s.tenant_id))
            .cloned())
    }

    async fn list_sales(&self, scope: TenantScope, query: ListQuery) -> DomainResult<SalePage> {
        let state = self.lock();
        let mut sales: Vec<_> = state
            .sales
            .values()
            .filter(|s| scope.covers(s.tenant_id))
            .filter(|s| !query.voided_only || s.status == SaleStatus::Voided)
            .filter(|s| {
                query
                    .customer_id
                    .map(|c| s.customer_id == Some(c))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = sales.len() as u64;
        let total_amount: Cents = sales.iter().map(|s| s.total).sum();
        let sales = sales
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();
        Ok(SalePage {
            sales,
            total,
            total_amount,
        })
    }

    async fn track_print(
        &self,
        scope: TenantScope,
        sale_id: SaleId,
        _printed_by: UserId,
    ) -> DomainResult<u32> {
        let mut state = self.lock();
        let sale = state
            .sales
            .get_mut(&sale_id)
            .filter(|s| scope.covers(s.tenant_id))
            .ok_or(DomainError::NotFoundOrForbidden)?;
        sale.print_count += 1;
        Ok(sale.print_count)
    }

    async fn return_record(
        &self,
        scope: TenantScope,
        return_id: ReturnId,
    ) -> DomainResult<Option<ReturnRecord>> {
        let state = self.lock();
        Ok(state
            .returns
            .get(&return_id)
            .filter(|r| scope.covers(r.tenant_id))
            .cloned())
    }

    async fn list_returns(
        &self,
        scope: TenantScope,
        query: ListQuery,
    ) -> DomainResult<(Vec<ReturnRecord>, u64)> {
        let state = self.lock();
        let mut records: Vec<_> = state
            .returns
            .values()
            .filter(|r| scope.covers(r.tenant_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = records.len() as u64;
        let records = records
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();
        Ok((records, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tillpoint_sales::SaleItem;

    fn draft_for(
        store: &MemoryStore,
        tenant_id: TenantId,
        product_id: ProductId,
        quantity: u32,
        key: Uuid,
    ) -> SaleDraft {
        let row = store.lock().products.get(&product_id).unwrap().clone();
        let line_total = row.unit_price * Cents::from(quantity);
        SaleDraft {
            tenant_id,
            idempotency_key: key,
            items: vec![SaleItem {
                product_id,
                name: row.name,
                quantity,
                unit_price: row.unit_price,
                line_total,
            }],
            subtotal: line_total,
            discount: 0,
            tax: 0,
            total: line_total,
            payment: tillpoint_sales::PaymentMethod::Cash,
            customer_id: None,
            customer_name: "Walk-in".into(),
            cashier_id: UserId::new(),
            branch_id: None,
        }
    }

    #[tokio::test]
    async fn replayed_key_returns_original_receipt_without_new_sale() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let product = store.insert_product(tenant, "Widget", 500, 10);
        let key = Uuid::now_v7();

        let first = store
            .process_sale(draft_for(&store, tenant, product, 2, key))
            .await
            .unwrap();
        let second = store
            .process_sale(draft_for(&store, tenant, product, 2, key))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.stock_of(product), Some(8));
        assert_eq!(store.lock().sales.len(), 1);
    }

    #[tokio::test]
    async fn same_key_in_different_tenants_is_two_sales() {
        let store = MemoryStore::new();
        let (a, b) = (TenantId::new(), TenantId::new());
        let pa = store.insert_product(a, "Widget", 500, 10);
        let pb = store.insert_product(b, "Widget", 500, 10);
        let key = Uuid::now_v7();

        let ra = store
            .process_sale(draft_for(&store, a, pa, 1, key))
            .await
            .unwrap();
        let rb = store
            .process_sale(draft_for(&store, b, pb, 1, key))
            .await
            .unwrap();
        assert_ne!(ra.sale_id, rb.sale_id);
    }

    #[tokio::test]
    async fn insufficient_stock_rejects_without_partial_state() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let product = store.insert_product(tenant, "Widget", 500, 1);

        let err = store
            .process_sale(draft_for(&store, tenant, product, 2, Uuid::now_v7()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DelegateRejected { .. }));
        assert_eq!(store.stock_of(product), Some(1));
        assert!(store.lock().sales.is_empty());
    }

    #[tokio::test]
    async fn void_restores_stock_and_is_terminal() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let product = store.insert_product(tenant, "Widget", 500, 10);
        let receipt = store
            .process_sale(draft_for(&store, tenant, product, 4, Uuid::now_v7()))
            .await
            .unwrap();
        assert_eq!(store.stock_of(product), Some(6));

        let cmd = VoidCommand {
            sale_id: receipt.sale_id,
            voided_by: UserId::new(),
            reason: "entered against wrong customer".into(),
            manager_id: UserId::new(),
            auth_code: None,
        };
        store.void_sale(tenant, cmd.clone()).await.unwrap();
        assert_eq!(store.stock_of(product), Some(10));

        let err = store.void_sale(tenant, cmd).await.unwrap_err();
        assert_eq!(err, DomainError::AlreadyVoided);
    }

    #[tokio::test]
    async fn cumulative_returns_cannot_exceed_sold() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let product = store.insert_product(tenant, "Widget", 500, 10);
        let receipt = store
            .process_sale(draft_for(&store, tenant, product, 3, Uuid::now_v7()))
            .await
            .unwrap();

        let cmd = |qty| ReturnCommand {
            sale_id: receipt.sale_id,
            items: vec![tillpoint_sales::ReturnLine {
                product_id: product,
                quantity: qty,
            }],
            reason: "damaged".into(),
            cashier_id: UserId::new(),
        };

        let first = store.process_return(tenant, cmd(2)).await.unwrap();
        assert_eq!(first.refund_amount, 1_000);
        assert_eq!(store.stock_of(product), Some(9));

        // 2 already returned of 3 sold; another 2 would exceed.
        assert!(store.process_return(tenant, cmd(2)).await.is_err());
        assert!(store.process_return(tenant, cmd(1)).await.is_ok());
    }

    #[tokio::test]
    async fn cross_tenant_void_is_not_found() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let product = store.insert_product(tenant, "Widget", 500, 10);
        let receipt = store
            .process_sale(draft_for(&store, tenant, product, 1, Uuid::now_v7()))
            .await
            .unwrap();

        let err = store
            .void_sale(
                TenantId::new(),
                VoidCommand {
                    sale_id: receipt.sale_id,
                    voided_by: UserId::new(),
                    reason: "should not be visible".into(),
                    manager_id: UserId::new(),
                    auth_code: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::NotFoundOrForbidden);
    }

    #[tokio::test]
    async fn platform_scope_lists_across_tenants() {
        let store = MemoryStore::new();
        let (a, b) = (TenantId::new(), TenantId::new());
        let pa = store.insert_product(a, "Widget", 500, 10);
        let pb = store.insert_product(b, "Widget", 500, 10);
        store
            .process_sale(draft_for(&store, a, pa, 1, Uuid::now_v7()))
            .await
            .unwrap();
        store
            .process_sale(draft_for(&store, b, pb, 1, Uuid::now_v7()))
            .await
            .unwrap();

        let all = store
            .list_sales(TenantScope::All, ListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        let scoped = store
            .list_sales(TenantScope::Tenant(a), ListQuery::default())
            .await
            .unwrap();
        assert_eq!(scoped.total, 1);
        assert_eq!(scoped.sales[0].tenant_id, a);
    }
}
