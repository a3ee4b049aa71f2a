//! Advance-payment product loans
//!
//! A `ProductLoan` ties an advance received from a client to one product
//! sale. `remaining` and `is_settled` are derived from the stored fields and
//! never independently assigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use core_kernel::{Money, ProductLoanId};

/// Outcome of applying a refund against a product loan's advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceReduction {
    /// The refund consumed the entire advance; the loan is fully unwound
    /// and should be deleted rather than left at zero.
    FullyUnwound,
    /// The advance was reduced but some of it remains
    Reduced,
}

/// An advance-payment loan tied to one product sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLoan {
    /// Unique identifier
    pub id: ProductLoanId,
    /// Client the advance came from
    pub holder_name: String,
    /// Product description
    pub description: String,
    /// Agreed selling price of the product
    pub selling_price: Money,
    /// Advance received so far
    pub advance_received: Money,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl ProductLoan {
    /// Creates a product loan with an initial advance
    pub fn new(
        holder_name: impl Into<String>,
        description: impl Into<String>,
        selling_price: Money,
        advance_received: Money,
    ) -> Result<Self, LedgerError> {
        if !selling_price.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: selling_price,
                maximum: selling_price,
            });
        }
        if advance_received.is_negative() {
            return Err(LedgerError::InvalidAmount {
                amount: advance_received,
                maximum: selling_price,
            });
        }
        let now = Utc::now();
        Ok(Self {
            id: ProductLoanId::new_v7(),
            holder_name: holder_name.into(),
            description: description.into(),
            selling_price,
            advance_received,
            created_at: now,
            updated_at: now,
        })
    }

    /// What the client still owes: `selling_price - advance_received`
    pub fn remaining(&self) -> Money {
        self.selling_price
            .checked_sub(&self.advance_received)
            .unwrap_or_else(|_| Money::zero(self.selling_price.currency()))
    }

    /// True once the advance covers the selling price
    pub fn is_settled(&self) -> bool {
        !self.remaining().is_positive()
    }

    /// Records a further advance from the client
    pub fn receive_advance(&mut self, amount: Money) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount,
                maximum: self.remaining(),
            });
        }
        self.advance_received = self.advance_received.checked_add(&amount)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Reduces the advance by a refund total, floored at zero
    ///
    /// Returns `FullyUnwound` when nothing of the advance survives, in which
    /// case the caller deletes the loan instead of persisting it at zero.
    pub fn reduce_advance(&mut self, refund_total: Money) -> Result<AdvanceReduction, LedgerError> {
        self.advance_received = self.advance_received.saturating_sub(&refund_total)?;
        self.updated_at = Utc::now();
        if self.advance_received.is_zero() {
            Ok(AdvanceReduction::FullyUnwound)
        } else {
            Ok(AdvanceReduction::Reduced)
        }
    }
}
