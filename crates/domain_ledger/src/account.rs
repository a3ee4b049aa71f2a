//! Loan account aggregate
//!
//! A `LoanAccount` tracks money lent to one person: the total principal ever
//! granted, the outstanding balance, and the chronological payment history
//! the balance is derived from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use core_kernel::{Currency, LoanAccountId, Money};

/// One recorded payment against a loan account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Payment date
    pub date: NaiveDate,
    /// Payment amount, always non-negative
    pub amount: Money,
}

/// An account tracking money lent to a person
///
/// # Invariants
///
/// - `outstanding_balance == principal - sum(payment_history.amount)` after
///   every mutation
/// - every history amount is >= 0
/// - the balance is never left negative
///
/// History is insertion-ordered (chronological) and append-only except for
/// the explicit `edit_entry`/`delete_entry` corrections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAccount {
    /// Unique identifier
    pub id: LoanAccountId,
    /// Name of the person the money was lent to
    pub holder_name: String,
    /// Total ever lent
    pub principal: Money,
    /// What is still owed
    pub outstanding_balance: Money,
    /// Amount of the most recent history entry, zero when history is empty
    pub last_payment_amount: Money,
    /// Date of the most recent history entry
    pub last_payment_date: Option<NaiveDate>,
    /// Chronological payment history
    pub payment_history: Vec<LedgerEntry>,
    /// Account currency
    pub currency: Currency,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl LoanAccount {
    /// Opens an account with its first grant
    ///
    /// Principal and balance both start at the granted amount; history is
    /// empty because a grant is not a payment.
    pub fn open(
        holder_name: impl Into<String>,
        amount: Money,
        currency: Currency,
    ) -> Result<Self, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount,
                maximum: amount,
            });
        }
        let now = Utc::now();
        Ok(Self {
            id: LoanAccountId::new_v7(),
            holder_name: holder_name.into(),
            principal: amount,
            outstanding_balance: amount,
            last_payment_amount: Money::zero(currency),
            last_payment_date: None,
            payment_history: Vec::new(),
            currency,
            created_at: now,
            updated_at: now,
        })
    }

    /// Grants further money to the holder
    ///
    /// Principal and balance both increase. No history entry is written.
    pub fn grant(&mut self, amount: Money) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount,
                maximum: amount,
            });
        }
        self.principal = self.principal.checked_add(&amount)?;
        self.outstanding_balance = self.outstanding_balance.checked_add(&amount)?;
        self.touch();
        Ok(())
    }

    /// Records a payment against the outstanding balance
    ///
    /// Fails if the amount is not positive or exceeds what is owed.
    pub fn apply_payment(&mut self, amount: Money, date: NaiveDate) -> Result<(), LedgerError> {
        if !amount.is_positive() || amount.checked_sub(&self.outstanding_balance)?.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount,
                maximum: self.outstanding_balance,
            });
        }
        self.outstanding_balance = self.outstanding_balance.checked_sub(&amount)?;
        self.payment_history.push(LedgerEntry { date, amount });
        self.refresh_last_payment();
        self.touch();
        Ok(())
    }

    /// Replaces the amount of one history entry
    ///
    /// The new amount may be zero but can never imply a negative balance:
    /// it is bounded by `outstanding_balance + old`.
    pub fn edit_entry(&mut self, index: usize, new_amount: Money) -> Result<(), LedgerError> {
        let len = self.payment_history.len();
        let entry = self
            .payment_history
            .get_mut(index)
            .ok_or(LedgerError::EntryNotFound { index, len })?;

        let old = entry.amount;
        let maximum = self.outstanding_balance.checked_add(&old)?;
        if new_amount.is_negative() || new_amount.checked_sub(&maximum)?.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: new_amount,
                maximum,
            });
        }

        entry.amount = new_amount;
        // balance += old - new, the exact delta of the correction
        self.outstanding_balance = self
            .outstanding_balance
            .checked_add(&old.checked_sub(&new_amount)?)?;
        self.refresh_last_payment();
        self.touch();
        Ok(())
    }

    /// Removes one history entry, returning its amount to the balance
    pub fn delete_entry(&mut self, index: usize) -> Result<(), LedgerError> {
        let len = self.payment_history.len();
        if index >= len {
            return Err(LedgerError::EntryNotFound { index, len });
        }
        let removed = self.payment_history.remove(index);
        self.outstanding_balance = self.outstanding_balance.checked_add(&removed.amount)?;
        self.refresh_last_payment();
        self.touch();
        Ok(())
    }

    /// Unwinds recorded payments from the most recent backwards until
    /// `total` has been reversed or history is exhausted
    ///
    /// Used when a refund linked to this account retroactively invalidates
    /// payments. Returns the amount actually unwound, which is less than
    /// `total` when the history sum is smaller.
    pub fn unwind_payments(&mut self, total: Money) -> Result<Money, LedgerError> {
        if !total.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: total,
                maximum: self.history_total()?,
            });
        }
        let mut remaining = total;
        while remaining.is_positive() {
            let Some(last) = self.payment_history.last() else {
                break;
            };
            let index = self.payment_history.len() - 1;
            if last.amount.checked_sub(&remaining)?.is_positive() {
                // Entry is larger than what is left to reverse; shrink it.
                let reduced = last.amount.checked_sub(&remaining)?;
                self.edit_entry(index, reduced)?;
                remaining = Money::zero(self.currency);
            } else {
                remaining = remaining.checked_sub(&last.amount)?;
                self.delete_entry(index)?;
            }
        }
        total.checked_sub(&remaining).map_err(LedgerError::from)
    }

    /// Sum of all history amounts
    pub fn history_total(&self) -> Result<Money, LedgerError> {
        Money::sum(self.currency, self.payment_history.iter().map(|e| &e.amount))
            .map_err(LedgerError::from)
    }

    /// Checks the balance invariant by recomputation
    ///
    /// `sum(history) + outstanding_balance == principal`. Exposed for tests
    /// and for periodic reconciliation against the server copy.
    pub fn verify(&self) -> bool {
        match self.history_total() {
            Ok(total) => match total.checked_add(&self.outstanding_balance) {
                Ok(sum) => sum == self.principal,
                Err(_) => false,
            },
            Err(_) => false,
        }
    }

    /// Recomputes the last-payment fields from the history tail
    ///
    /// Never trusts the previously stored values; this is what prevents
    /// drift after an edit or delete of the most recent entry.
    fn refresh_last_payment(&mut self) {
        match self.payment_history.last() {
            Some(entry) => {
                self.last_payment_amount = entry.amount;
                self.last_payment_date = Some(entry.date);
            }
            None => {
                self.last_payment_amount = Money::zero(self.currency);
                self.last_payment_date = None;
            }
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
