//! Return validation.
//!
//! The store's procedure is the authority on returned-vs-sold quantities; this
//! pre-checks everything visible from the already-fetched sale.

use serde::{Deserialize, Serialize};

use tillpoint_core::{DomainError, DomainResult, ProductId, SaleId};

use crate::sale::Sale;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnRequest {
    pub sale_id: SaleId,
    pub items: Vec<ReturnLine>,
    pub reason: Option<String>,
}

/// Validate a return against the (tenant-resolved) original sale.
pub fn validate_return(request: &ReturnRequest, sale: &Sale) -> DomainResult<()> {
    if request.items.is_empty() {
        return Err(DomainError::validation(
            "items",
            "at least one item must be returned",
        ));
    }

    for (i, line) in request.items.iter().enumerate() {
        if line.quantity == 0 {
            return Err(DomainError::validation(
                "items",
                format!("returned quantity for item {i} must be a positive integer"),
            ));
        }
        let sold = sale
            .items
            .iter()
            .find(|item| item.product_id == line.product_id)
            .map(|item| item.quantity)
            .unwrap_or(0);
        if sold == 0 {
            return Err(DomainError::validation(
                "items",
                format!("item {i} was not part of the original sale"),
            ));
        }
        if line.quantity > sold {
            return Err(DomainError::validation(
                "items",
                format!("returned quantity for item {i} exceeds quantity sold"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use tillpoint_core::{Cents, TenantId, UserId};

    use crate::sale::{PaymentMethod, SaleItem, SaleStatus};

    fn sale_with(quantity: u32) -> Sale {
        let product_id = ProductId::new();
        Sale {
            id: SaleId::new(),
            tenant_id: TenantId::new(),
            invoice_number: "INV-0001".into(),
            status: SaleStatus::Completed,
            items: vec![SaleItem {
                product_id,
                name: "Widget".into(),
                quantity,
                unit_price: 500,
                line_total: 500 * Cents::from(quantity),
            }],
            subtotal: 500 * Cents::from(quantity),
            discount: 0,
            tax: 0,
            total: 500 * Cents::from(quantity),
            payment: PaymentMethod::Cash,
            customer_id: None,
            customer_name: "Walk-in".into(),
            cashier_id: UserId::new(),
            branch_id: None,
            created_at: Utc::now(),
            voided_at: None,
            void_reason: None,
            print_count: 0,
        }
    }

    #[test]
    fn empty_return_is_rejected() {
        let sale = sale_with(2);
        let req = ReturnRequest {
            sale_id: sale.id,
            items: vec![],
            reason: None,
        };
        assert!(validate_return(&req, &sale).is_err());
    }

    #[test]
    fn cannot_return_more_than_sold() {
        let sale = sale_with(2);
        let req = ReturnRequest {
            sale_id: sale.id,
            items: vec![ReturnLine {
                product_id: sale.items[0].product_id,
                quantity: 3,
            }],
            reason: None,
        };
        assert!(validate_return(&req, &sale).is_err());
    }

    #[test]
    fn cannot_return_a_product_not_on_the_sale() {
        let sale = sale_with(2);
        let req = ReturnRequest {
            sale_id: sale.id,
            items: vec![ReturnLine {
                product_id: ProductId::new(),
                quantity: 1,
            }],
            reason: None,
        };
        assert!(validate_return(&req, &sale).is_err());
    }

    #[test]
    fn full_return_is_accepted() {
        let sale = sale_with(2);
        let req = ReturnRequest {
            sale_id: sale.id,
            items: vec![ReturnLine {
                product_id: sale.items[0].product_id,
                quantity: 2,
            }],
            reason: Some("damaged".into()),
        };
        assert!(validate_return(&req, &sale).is_ok());
    }
}
