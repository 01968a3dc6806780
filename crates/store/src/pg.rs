//! Postgres-backed store.
//!
//! Thin delegation layer: the three money-moving operations call the store's
//! atomic procedures (`process_pos_sale`, `void_sale`, `process_pos_return`)
//! and this module only maps parameters and errors. Atomicity, stock/ledger
//! consistency, and the `(tenant_id, idempotency_key)` uniqueness constraint
//! all live on the other side of the wire.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use tillpoint_audit::{AuditEntry, AuditSink, RequestOrigin};
use tillpoint_core::{
    AuditId, BranchId, Cents, CustomerId, DomainError, DomainResult, ProductId, ReturnId, SaleId,
    TenantId, UserId,
};
use tillpoint_sales::{PaymentMethod, ProductQuote, Sale, SaleItem, SaleStatus};
use tillpoint_tenancy::{Profile, ProfileDirectory, SubscriptionTier, Tenant, TenantScope, TenantStatus};

use crate::contract::{
    ListQuery, ProductCatalog, ReturnCommand, ReturnReceipt, ReturnRecord, SaleDraft, SalePage,
    SaleReceipt, SaleStore, VoidCommand, VoidReceipt,
};

/// SQLSTATE for unique-constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Upper bound on concurrent store connections; the pool is the only shared
/// resource between request handlers.
const MAX_CONNECTIONS: u32 = 20;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Append-only audit writes against the `audit_logs` table.
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn append(&self, entry: AuditEntry) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs \
                (id, actor_id, actor_role, tenant_id, action, entity_type, entity_id, \
                 changes, ip_address, user_agent, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(entry.id.as_uuid())
        .bind(entry.actor_id.as_uuid())
        .bind(entry.actor_role.as_str())
        .bind(entry.tenant_id.map(|t| *t.as_uuid()))
        .bind(entry.action.as_str())
        .bind(entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.changes)
        .bind(entry.origin.ip.as_deref())
        .bind(entry.origin.user_agent.as_deref())
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(infra)?;
        Ok(())
    }

    async fn entries(&self, tenant_id: Option<TenantId>) -> DomainResult<Vec<AuditEntry>> {
        let mut sql = String::from(
            "SELECT id, actor_id, actor_role, tenant_id, action, entity_type, entity_id, \
                    changes, ip_address, user_agent, recorded_at \
             FROM audit_logs",
        );
        if tenant_id.is_some() {
            sql.push_str(" WHERE tenant_id = $1");
        }
        sql.push_str(" ORDER BY recorded_at DESC LIMIT 500");

        let mut query = sqlx::query(&sql);
        if let Some(tenant_id) = tenant_id {
            query = query.bind(*tenant_id.as_uuid());
        }

        let rows = query.fetch_all(&self.pool).await.map_err(infra)?;
        rows.iter().map(|row| audit_from_row(row)).collect()
    }
}

fn audit_from_row(row: &PgRow) -> DomainResult<AuditEntry> {
    let decode = |err: sqlx::Error| infra(err);
    let role: String = row.try_get("actor_role").map_err(decode)?;
    let action: String = row.try_get("action").map_err(decode)?;

    Ok(AuditEntry {
        id: AuditId::from_uuid(row.try_get("id").map_err(decode)?),
        actor_id: UserId::from_uuid(row.try_get("actor_id").map_err(decode)?),
        actor_role: role.parse().map_err(|_| {
            tracing::error!(role, "audit row carries an unknown role");
            DomainError::StoreUnavailable
        })?,
        tenant_id: row
            .try_get::<Option<Uuid>, _>("tenant_id")
            .map_err(decode)?
            .map(TenantId::from_uuid),
        action: serde_json::from_value(serde_json::Value::String(action)).map_err(|_| {
            tracing::error!("audit row carries an unknown action");
            DomainError::StoreUnavailable
        })?,
        entity_type: row.try_get("entity_type").map_err(decode)?,
        entity_id: row.try_get("entity_id").map_err(decode)?,
        changes: row.try_get("changes").map_err(decode)?,
        origin: RequestOrigin {
            ip: row.try_get("ip_address").map_err(decode)?,
            user_agent: row.try_get("user_agent").map_err(decode)?,
        },
        recorded_at: row.try_get("recorded_at").map_err(decode)?,
    })
}

/// Infrastructure failure: log the full error server-side, return a sanitized
/// variant to the caller.
fn infra(err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "store query failed");
    DomainError::StoreUnavailable
}

/// Error mapping for the atomic procedure calls: a database-raised rejection
/// (stock race, over-return) is a client-visible `DelegateRejected`; anything
/// else is infrastructure.
fn delegate_err(err: sqlx::Error) -> DomainError {
    match err.as_database_error() {
        Some(db) if db.code().as_deref() != Some(UNIQUE_VIOLATION) => {
            tracing::warn!(error = %db.message(), "store procedure rejected the operation");
            DomainError::delegate_rejected(db.message().to_string())
        }
        _ => infra(err),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .as_deref()
        == Some(UNIQUE_VIOLATION)
}

fn decode_status(status: &str) -> SaleStatus {
    match status {
        "voided" => SaleStatus::Voided,
        "cancelled" => SaleStatus::Cancelled,
        _ => SaleStatus::Completed,
    }
}

fn decode_payment(method: &str, credit: Option<Cents>) -> PaymentMethod {
    match method {
        "card" => PaymentMethod::Card,
        "credit" => PaymentMethod::Credit,
        "mixed" => PaymentMethod::Mixed {
            credit: credit.unwrap_or(0),
        },
        _ => PaymentMethod::Cash,
    }
}

fn sale_from_row(row: &PgRow, items: Vec<SaleItem>) -> Result<Sale, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let method: String = row.try_get("payment_method")?;
    let credit: Option<Cents> = row.try_get("payment_credit")?;
    Ok(Sale {
        id: SaleId::from_uuid(row.try_get("id")?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id")?),
        invoice_number: row.try_get("invoice_number")?,
        status: decode_status(&status),
        items,
        subtotal: row.try_get("subtotal")?,
        discount: row.try_get("discount_amount")?,
        tax: row.try_get("tax_amount")?,
        total: row.try_get("total_amount")?,
        payment: decode_payment(&method, credit),
        customer_id: row
            .try_get::<Option<Uuid>, _>("customer_id")?
            .map(CustomerId::from_uuid),
        customer_name: row.try_get("customer_name")?,
        cashier_id: UserId::from_uuid(row.try_get("cashier_id")?),
        branch_id: row
            .try_get::<Option<Uuid>, _>("branch_id")?
            .map(BranchId::from_uuid),
        created_at: row.try_get("created_at")?,
        voided_at: row.try_get("voided_at")?,
        void_reason: row.try_get("void_reason")?,
        print_count: row.try_get::<i32, _>("print_count")? as u32,
    })
}

async fn items_for(pool: &PgPool, sale_id: SaleId) -> Result<Vec<SaleItem>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT product_id, name, quantity, unit_price, line_total \
         FROM sale_items WHERE sale_id = $1 ORDER BY line_no",
    )
    .bind(sale_id.as_uuid())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(SaleItem {
                product_id: ProductId::from_uuid(row.try_get("product_id")?),
                name: row.try_get("name")?,
                quantity: row.try_get::<i32, _>("quantity")? as u32,
                unit_price: row.try_get("unit_price")?,
                line_total: row.try_get("line_total")?,
            })
        })
        .collect()
}

const SALE_COLUMNS: &str = "id, tenant_id, invoice_number, status, subtotal, discount_amount, \
    tax_amount, total_amount, payment_method, payment_credit, customer_id, customer_name, \
    cashier_id, branch_id, created_at, voided_at, void_reason, print_count";

const RETURN_COLUMNS: &str = "r.id, r.tenant_id, r.sale_id, s.invoice_number, r.items, \
    r.reason, r.cashier_id, r.refund_amount, r.created_at";

fn return_from_row(row: &PgRow) -> Result<ReturnRecord, sqlx::Error> {
    let items: serde_json::Value = row.try_get("items")?;
    let items = serde_json::from_value(items).unwrap_or_default();
    Ok(ReturnRecord {
        id: ReturnId::from_uuid(row.try_get("id")?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id")?),
        sale_id: SaleId::from_uuid(row.try_get("sale_id")?),
        invoice_number: row.try_get("invoice_number")?,
        items,
        reason: row.try_get("reason")?,
        cashier_id: UserId::from_uuid(row.try_get("cashier_id")?),
        refund_amount: row.try_get("refund_amount")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ProfileDirectory for PgStore {
    async fn profile_with_tenant(
        &self,
        user_id: UserId,
    ) -> DomainResult<Option<(Profile, Option<Tenant>)>> {
        // One combined lookup; the left join keeps partially-provisioned
        // profiles (no tenant row) distinguishable from missing profiles.
        let row = sqlx::query(
            "SELECT p.id, p.tenant_id, p.role, p.full_name, p.email, p.active, p.branch_id, \
                    t.id AS t_id, t.name AS t_name, t.status AS t_status, t.tier AS t_tier, \
                    t.subscription_ends_at, t.is_platform, t.tax_rate_bps, t.deleted_at \
             FROM profiles p \
             LEFT JOIN tenants t ON t.id = p.tenant_id \
             WHERE p.id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?;

        let Some(row) = row else { return Ok(None) };

        let role: String = row.try_get("role").map_err(infra)?;
        let role = role.parse().map_err(|_| {
            tracing::error!(user = %user_id, role, "profile row carries an unknown role");
            DomainError::StoreUnavailable
        })?;

        let profile = Profile {
            id: user_id,
            tenant_id: row
                .try_get::<Option<Uuid>, _>("tenant_id")
                .map_err(infra)?
                .map(TenantId::from_uuid),
            role,
            full_name: row.try_get("full_name").map_err(infra)?,
            email: row.try_get("email").map_err(infra)?,
            active: row.try_get("active").map_err(infra)?,
            branch_id: row
                .try_get::<Option<Uuid>, _>("branch_id")
                .map_err(infra)?
                .map(BranchId::from_uuid),
        };

        let tenant = match row.try_get::<Option<Uuid>, _>("t_id").map_err(infra)? {
            None => None,
            Some(id) => {
                let status: String = row.try_get("t_status").map_err(infra)?;
                let tier: String = row.try_get("t_tier").map_err(infra)?;
                Some(Tenant {
                    id: TenantId::from_uuid(id),
                    name: row.try_get("t_name").map_err(infra)?,
                    status: match status.as_str() {
                        "trial" => TenantStatus::Trial,
                        "suspended" => TenantStatus::Suspended,
                        "cancelled" => TenantStatus::Cancelled,
                        _ => TenantStatus::Active,
                    },
                    tier: match tier.as_str() {
                        "trial" => SubscriptionTier::Trial,
                        "pro" => SubscriptionTier::Pro,
                        "enterprise" => SubscriptionTier::Enterprise,
                        _ => SubscriptionTier::Basic,
                    },
                    subscription_ends_at: row.try_get("subscription_ends_at").map_err(infra)?,
                    is_platform: row.try_get("is_platform").map_err(infra)?,
                    tax_rate_bps: row.try_get::<i32, _>("tax_rate_bps").map_err(infra)? as u32,
                    deleted_at: row.try_get("deleted_at").map_err(infra)?,
                })
            }
        };

        Ok(Some((profile, tenant)))
    }
}

#[async_trait]
impl ProductCatalog for PgStore {
    async fn quotes(
        &self,
        scope: TenantScope,
        product_ids: &[ProductId],
    ) -> DomainResult<Vec<ProductQuote>> {
        let ids: Vec<Uuid> = product_ids.iter().map(|id| *id.as_uuid()).collect();

        let mut sql = String::from(
            "SELECT id, name, selling_price FROM products WHERE id = ANY($1)",
        );
        if scope.filter().is_some() {
            sql.push_str(" AND tenant_id = $2");
        }

        let mut query = sqlx::query(&sql).bind(&ids);
        if let Some(tenant_id) = scope.filter() {
            query = query.bind(*tenant_id.as_uuid());
        }

        let rows = query.fetch_all(&self.pool).await.map_err(infra)?;
        rows.iter()
            .map(|row| {
                Ok(ProductQuote {
                    product_id: ProductId::from_uuid(row.try_get("id").map_err(infra)?),
                    name: row.try_get("name").map_err(infra)?,
                    unit_price: row.try_get("selling_price").map_err(infra)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SaleStore for PgStore {
    async fn process_sale(&self, draft: SaleDraft) -> DomainResult<SaleReceipt> {
        let items = serde_json::to_value(&draft.items)
            .map_err(|_| DomainError::StoreUnavailable)?;
        let credit = match draft.payment {
            PaymentMethod::Mixed { credit } => Some(credit),
            _ => None,
        };

        let result = sqlx::query(
            "SELECT sale_id, invoice_number FROM process_pos_sale( \
                p_items => $1, p_customer_id => $2, p_cashier_id => $3, p_branch_id => $4, \
                p_discount_amount => $5, p_tax_amount => $6, p_total_amount => $7, \
                p_payment_method => $8, p_payment_credit => $9, p_customer_name => $10, \
                p_idempotency_key => $11, p_tenant_id => $12)",
        )
        .bind(&items)
        .bind(draft.customer_id.map(|c| *c.as_uuid()))
        .bind(draft.cashier_id.as_uuid())
        .bind(draft.branch_id.map(|b| *b.as_uuid()))
        .bind(draft.discount)
        .bind(draft.tax)
        .bind(draft.total)
        .bind(draft.payment.label())
        .bind(credit)
        .bind(&draft.customer_name)
        .bind(draft.idempotency_key)
        .bind(draft.tenant_id.as_uuid())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(SaleReceipt {
                sale_id: SaleId::from_uuid(row.try_get("sale_id").map_err(infra)?),
                invoice_number: row.try_get("invoice_number").map_err(infra)?,
                total: draft.total,
            }),
            // Idempotency-key replay: the sale already committed; resolve to
            // the original receipt rather than reporting a conflict.
            Err(err) if is_unique_violation(&err) => {
                tracing::info!(
                    tenant = %draft.tenant_id,
                    key = %draft.idempotency_key,
                    "idempotency key replay; returning original receipt"
                );
                let row = sqlx::query(
                    "SELECT id, invoice_number, total_amount FROM sales \
                     WHERE tenant_id = $1 AND idempotency_key = $2",
                )
                .bind(draft.tenant_id.as_uuid())
                .bind(draft.idempotency_key)
                .fetch_one(&self.pool)
                .await
                .map_err(infra)?;
                Ok(SaleReceipt {
                    sale_id: SaleId::from_uuid(row.try_get("id").map_err(infra)?),
                    invoice_number: row.try_get("invoice_number").map_err(infra)?,
                    total: row.try_get("total_amount").map_err(infra)?,
                })
            }
            Err(err) => Err(delegate_err(err)),
        }
    }

    async fn void_sale(&self, tenant_id: TenantId, cmd: VoidCommand) -> DomainResult<VoidReceipt> {
        let row = sqlx::query(
            "SELECT invoice_number, voided_at, items_affected FROM void_sale( \
                p_sale_id => $1, p_voided_by => $2, p_reason => $3, \
                p_manager_id => $4, p_auth_code => $5, p_tenant_id => $6)",
        )
        .bind(cmd.sale_id.as_uuid())
        .bind(cmd.voided_by.as_uuid())
        .bind(&cmd.reason)
        .bind(cmd.manager_id.as_uuid())
        .bind(cmd.auth_code.as_deref())
        .bind(tenant_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(delegate_err)?;

        Ok(VoidReceipt {
            sale_id: cmd.sale_id,
            invoice_number: row.try_get("invoice_number").map_err(infra)?,
            voided_at: row.try_get("voided_at").map_err(infra)?,
            items_affected: row.try_get::<i32, _>("items_affected").map_err(infra)? as usize,
        })
    }

    async fn process_return(
        &self,
        tenant_id: TenantId,
        cmd: ReturnCommand,
    ) -> DomainResult<ReturnReceipt> {
        let items = serde_json::to_value(&cmd.items)
            .map_err(|_| DomainError::StoreUnavailable)?;

        let row = sqlx::query(
            "SELECT return_id, refund_amount FROM process_pos_return( \
                p_sale_id => $1, p_items => $2, p_reason => $3, \
                p_cashier_id => $4, p_tenant_id => $5)",
        )
        .bind(cmd.sale_id.as_uuid())
        .bind(&items)
        .bind(&cmd.reason)
        .bind(cmd.cashier_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(delegate_err)?;

        Ok(ReturnReceipt {
            return_id: ReturnId::from_uuid(row.try_get("return_id").map_err(infra)?),
            sale_id: cmd.sale_id,
            refund_amount: row.try_get("refund_amount").map_err(infra)?,
        })
    }

    async fn sale(&self, scope: TenantScope, sale_id: SaleId) -> DomainResult<Option<Sale>> {
        let mut sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1");
        if scope.filter().is_some() {
            sql.push_str(" AND tenant_id = $2");
        }

        let mut query = sqlx::query(&sql).bind(sale_id.as_uuid());
        if let Some(tenant_id) = scope.filter() {
            query = query.bind(*tenant_id.as_uuid());
        }

        let Some(row) = query.fetch_optional(&self.pool).await.map_err(infra)? else {
            return Ok(None);
        };
        let items = items_for(&self.pool, sale_id).await.map_err(infra)?;
        Ok(Some(sale_from_row(&row, items).map_err(infra)?))
    }

    async fn list_sales(&self, scope: TenantScope, query: ListQuery) -> DomainResult<SalePage> {
        let mut conditions = vec!["TRUE".to_string()];
        if scope.filter().is_some() {
            conditions.push("tenant_id = $3".into());
        }
        if query.voided_only {
            conditions.push("status = 'voided'".into());
        }
        if query.customer_id.is_some() {
            conditions.push(format!(
                "customer_id = ${}",
                3 + usize::from(scope.filter().is_some())
            ));
        }
        let where_clause = conditions.join(" AND ");

        let sql = format!(
            "SELECT {SALE_COLUMNS}, COUNT(*) OVER () AS total_count, \
             COALESCE(SUM(total_amount) OVER (), 0)::BIGINT AS matched_amount \
             FROM sales WHERE {where_clause} ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );

        let mut q = sqlx::query(&sql)
            .bind(i64::from(query.limit))
            .bind(i64::from(query.offset()));
        if let Some(tenant_id) = scope.filter() {
            q = q.bind(*tenant_id.as_uuid());
        }
        if let Some(customer_id) = query.customer_id {
            q = q.bind(*customer_id.as_uuid());
        }

        let rows = q.fetch_all(&self.pool).await.map_err(infra)?;
        let total = rows
            .first()
            .map(|row| row.try_get::<i64, _>("total_count"))
            .transpose()
            .map_err(infra)?
            .unwrap_or(0) as u64;
        let total_amount: Cents = rows
            .first()
            .map(|row| row.try_get::<i64, _>("matched_amount"))
            .transpose()
            .map_err(infra)?
            .unwrap_or(0);

        let mut sales = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = SaleId::from_uuid(row.try_get("id").map_err(infra)?);
            let items = items_for(&self.pool, id).await.map_err(infra)?;
            sales.push(sale_from_row(row, items).map_err(infra)?);
        }

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
        printed_by: UserId,
    ) -> DomainResult<u32> {
        let mut sql = String::from(
            "UPDATE sales SET print_count = print_count + 1, \
             last_printed_at = now(), last_printed_by = $1 \
             WHERE id = $2",
        );
        if scope.filter().is_some() {
            sql.push_str(" AND tenant_id = $3");
        }
        sql.push_str(" RETURNING print_count");

        let mut query = sqlx::query(&sql)
            .bind(printed_by.as_uuid())
            .bind(sale_id.as_uuid());
        if let Some(tenant_id) = scope.filter() {
            query = query.bind(*tenant_id.as_uuid());
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?
            .ok_or(DomainError::NotFoundOrForbidden)?;
        Ok(row.try_get::<i32, _>("print_count").map_err(infra)? as u32)
    }

    async fn return_record(
        &self,
        scope: TenantScope,
        return_id: ReturnId,
    ) -> DomainResult<Option<ReturnRecord>> {
        let mut sql = format!("SELECT {RETURN_COLUMNS} FROM returns r \
             JOIN sales s ON s.id = r.sale_id WHERE r.id = $1");
        if scope.filter().is_some() {
            sql.push_str(" AND r.tenant_id = $2");
        }

        let mut query = sqlx::query(&sql).bind(return_id.as_uuid());
        if let Some(tenant_id) = scope.filter() {
            query = query.bind(*tenant_id.as_uuid());
        }

        query
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?
            .map(|row| return_from_row(&row).map_err(infra))
            .transpose()
    }

    async fn list_returns(
        &self,
        scope: TenantScope,
        query: ListQuery,
    ) -> DomainResult<(Vec<ReturnRecord>, u64)> {
        let mut sql = format!(
            "SELECT {RETURN_COLUMNS}, COUNT(*) OVER () AS total_count FROM returns r \
             JOIN sales s ON s.id = r.sale_id"
        );
        if scope.filter().is_some() {
            sql.push_str(" WHERE r.tenant_id = $3");
        }
        sql.push_str(" ORDER BY r.created_at DESC LIMIT $1 OFFSET $2");

        let mut q = sqlx::query(&sql)
            .bind(i64::from(query.limit))
            .bind(i64::from(query.offset()));
        if let Some(tenant_id) = scope.filter() {
            q = q.bind(*tenant_id.as_uuid());
        }

        let rows = q.fetch_all(&self.pool).await.map_err(infra)?;
        let total = rows
            .first()
            .map(|row| row.try_get::<i64, _>("total_count"))
            .transpose()
            .map_err(infra)?
            .unwrap_or(0) as u64;
        let records = rows
            .iter()
            .map(|row| return_from_row(row).map_err(infra))
            .collect::<Result<_, _>>()?;
        Ok((records, total))
    }
}
