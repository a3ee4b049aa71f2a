//! Sale aggregate

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RefundError;
use core_kernel::{Currency, Money, ProductId, SaleId};

/// One product's worth of a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    /// Product sold
    pub product_id: ProductId,
    /// Product description as shown on the receipt
    pub description: String,
    /// Units sold
    pub quantity_sold: u32,
    /// What one unit cost the shop
    pub unit_purchase_price: Money,
    /// What one unit sold for
    pub unit_selling_price: Money,
}

impl SaleLine {
    /// Revenue for this line: quantity x selling price
    pub fn revenue(&self) -> Money {
        self.unit_selling_price * Decimal::from(self.quantity_sold)
    }

    /// Cost for this line: quantity x purchase price
    pub fn cost(&self) -> Money {
        self.unit_purchase_price * Decimal::from(self.quantity_sold)
    }

    /// Profit for this line
    pub fn profit(&self) -> Money {
        self.revenue() - self.cost()
    }
}

/// A completed sale to one client
///
/// Totals are derived by summation over the lines; nothing stores them.
/// All lines share the sale currency, enforced at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    /// Unique identifier
    pub id: SaleId,
    /// Sale date
    pub date: NaiveDate,
    /// Client the sale was made to
    pub client_name: String,
    /// Line items, at least one
    pub line_items: Vec<SaleLine>,
    /// Sale currency
    pub currency: Currency,
}

impl Sale {
    /// Creates a sale, rejecting empty line lists, zero-quantity lines and
    /// mixed currencies
    pub fn new(
        client_name: impl Into<String>,
        date: NaiveDate,
        currency: Currency,
        line_items: Vec<SaleLine>,
    ) -> Result<Self, RefundError> {
        if line_items.is_empty() {
            return Err(RefundError::EmptyLineItems);
        }
        for line in &line_items {
            if line.quantity_sold == 0 {
                return Err(RefundError::ZeroQuantityLine {
                    description: line.description.clone(),
                });
            }
            line.unit_purchase_price
                .checked_add(&line.unit_selling_price)?
                .checked_add(&Money::zero(currency))?;
        }
        Ok(Self {
            id: SaleId::new_v7(),
            date,
            client_name: client_name.into(),
            line_items,
            currency,
        })
    }

    /// Total revenue across all lines
    pub fn total_revenue(&self) -> Money {
        self.line_items
            .iter()
            .fold(Money::zero(self.currency), |acc, l| acc + l.revenue())
    }

    /// Total cost across all lines
    pub fn total_cost(&self) -> Money {
        self.line_items
            .iter()
            .fold(Money::zero(self.currency), |acc, l| acc + l.cost())
    }

    /// Total profit across all lines
    pub fn total_profit(&self) -> Money {
        self.total_revenue() - self.total_cost()
    }
}
