//! Refund transactions and line classification
//!
//! Each refunded line is classified independently. A line refunded at (or
//! within a cent of) its original selling price is a **full** refund: the
//! goods came back, so quantity-based cost bookkeeping applies and the stock
//! may be restored. A changed unit price signals a negotiated settlement,
//! classified as a **partial** refund, for which only the cash delta is
//! recorded.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::sale::SaleLine;
use core_kernel::{Currency, Money, ProductId, RefundId, SaleId};

/// Two unit prices within this distance are considered equal
pub const PRICE_TOLERANCE: Decimal = dec!(0.01);

/// Classification verdict for one refunded line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundClass {
    /// Refunded at the original selling price; goods returned
    Full,
    /// Refunded at a negotiated price; only the cash delta is recorded
    Partial,
}

/// Classifies a refund price against the original selling price
///
/// Pure in `(refund_unit_price, original_unit_selling_price)`: the verdict is
/// `Full` iff the absolute difference is below [`PRICE_TOLERANCE`].
pub fn classify(refund_unit_price: Money, original_unit_selling_price: Money) -> RefundClass {
    let diff = (refund_unit_price.amount() - original_unit_selling_price.amount()).abs();
    if diff < PRICE_TOLERANCE {
        RefundClass::Full
    } else {
        RefundClass::Partial
    }
}

/// One product's worth of a refund transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundLine {
    /// Product being refunded
    pub product_id: ProductId,
    /// Product description carried over from the sale line
    pub description: String,
    /// Units originally sold, kept so cash totals stay derivable
    pub quantity_sold: u32,
    /// Units counted as physically returned: the full quantity for a full
    /// refund, zero for a partial one
    pub effective_quantity: u32,
    /// Unit price the refund was agreed at
    pub refund_unit_price: Money,
    /// Purchase cost reversed by this line, zero for partial refunds
    pub purchase_cost_counted: Money,
    /// Cash impact: quantity x (refund price - purchase price)
    pub profit_delta: Money,
}

impl RefundLine {
    /// Builds a refund line from its sale line and the agreed refund price
    pub fn from_sale_line(line: &SaleLine, refund_unit_price: Money) -> Self {
        let class = classify(refund_unit_price, line.unit_selling_price);
        let qty = Decimal::from(line.quantity_sold);

        let (effective_quantity, purchase_cost_counted) = match class {
            RefundClass::Full => (line.quantity_sold, line.unit_purchase_price * qty),
            RefundClass::Partial => (0, Money::zero(line.unit_purchase_price.currency())),
        };

        Self {
            product_id: line.product_id,
            description: line.description.clone(),
            quantity_sold: line.quantity_sold,
            effective_quantity,
            refund_unit_price,
            purchase_cost_counted,
            profit_delta: (refund_unit_price - line.unit_purchase_price) * qty,
        }
    }

    /// This line's classification, carried by its effective quantity
    ///
    /// Sale lines always carry at least one unit, so a full refund always
    /// leaves a positive effective quantity.
    pub fn class(&self) -> RefundClass {
        if self.effective_quantity > 0 {
            RefundClass::Full
        } else {
            RefundClass::Partial
        }
    }

    /// Cash refunded to the client for this line
    pub fn refund_amount(&self) -> Money {
        self.refund_unit_price * Decimal::from(self.quantity_sold)
    }

    /// True if this line's product may have its stock restored
    pub fn is_restoration_candidate(&self) -> bool {
        self.effective_quantity > 0
    }
}

/// A committed refund against one sale
///
/// Immutable after creation: corrections happen via a new refund, never by
/// editing this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundTransaction {
    /// Unique identifier
    pub id: RefundId,
    /// The sale being refunded
    pub original_sale_id: SaleId,
    /// Refund date
    pub date: NaiveDate,
    /// Refunded lines
    pub line_items: Vec<RefundLine>,
    /// Whether stock restoration was confirmed
    pub restore_stock: bool,
    /// Products whose stock was restored
    pub restored_product_ids: HashSet<ProductId>,
    /// Refund currency
    pub currency: Currency,
}

impl RefundTransaction {
    /// Total cash refunded across all lines
    pub fn total_refund(&self) -> Money {
        self.line_items
            .iter()
            .fold(Money::zero(self.currency), |acc, l| acc + l.refund_amount())
    }

    /// Total purchase cost reversed across all lines
    pub fn total_cost_counted(&self) -> Money {
        self.line_items
            .iter()
            .fold(Money::zero(self.currency), |acc, l| {
                acc + l.purchase_cost_counted
            })
    }

    /// Total cash impact across all lines
    pub fn total_profit_delta(&self) -> Money {
        self.line_items
            .iter()
            .fold(Money::zero(self.currency), |acc, l| acc + l.profit_delta)
    }
}
