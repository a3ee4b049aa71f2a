//! Refund reconciliation
//!
//! Turns a user-confirmed refund draft into persisted side effects: linked
//! loan adjustments, the refund record, and optional stock restoration.
//!
//! Validation errors are rejected before any network call. Remote errors
//! during the multi-step commit are caught per step and aggregated into a
//! single [`CommitReport`] rather than aborting the sequence, because loan
//! adjustments and the refund record are independent entities whose partial
//! success is still meaningful to the user. The steps run sequentially, so
//! the only ordering the caller ever observes is loans, then the refund
//! record, then stock.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::RefundError;
use crate::matcher::{ContainmentMatcher, LinkedLoan, LoanMatcher};
use crate::ports::RefundStore;
use crate::refund::{RefundLine, RefundTransaction};
use crate::sale::Sale;
use core_kernel::{Money, PortError, ProductId, RefundId};
use domain_ledger::{AdvanceReduction, LoanAccount, ProductLoan};

/// How linked loans should be adjusted, chosen by the user per refund
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAdjustment {
    /// Remove each linked loan entirely
    Delete,
    /// Offset each linked loan by the refund total
    Modify,
}

/// What actually happened to one linked loan
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedAdjustment {
    /// The loan was removed
    Deleted,
    /// A product loan's advance was reduced and the loan kept
    AdvanceReduced { remaining_advance: Money },
    /// A loan account had recorded payments unwound
    PaymentsUnwound { amount: Money },
}

/// Per-loan outcome of the adjustment step
#[derive(Debug)]
pub struct LoanAdjustmentResult {
    /// Human-readable loan label for error reporting
    pub loan_label: String,
    /// The applied adjustment, or why it failed
    pub outcome: Result<AppliedAdjustment, RefundError>,
}

/// Per-product outcome of the stock-restoration step
#[derive(Debug)]
pub struct StockRestoreResult {
    pub product_id: ProductId,
    pub quantity: u32,
    pub outcome: Result<(), PortError>,
}

/// A fully decided refund, ready to commit
#[derive(Debug, Clone)]
pub struct RefundDraft {
    /// The sale being refunded
    pub sale: Sale,
    /// Refund date
    pub date: NaiveDate,
    /// Classified line items
    pub line_items: Vec<RefundLine>,
    /// Loans the matcher associated with the sale
    pub linked_loans: Vec<LinkedLoan>,
    /// The user's adjustment choice for those loans
    pub loan_action: LoanAdjustment,
    /// Whether the user confirmed stock restoration
    pub restore_stock: bool,
    /// Products to restore, a subset of the full-refund lines
    pub restored_product_ids: HashSet<ProductId>,
}

/// Aggregated outcome of one commit
///
/// `refund` always carries the transaction that was (or was meant to be)
/// persisted; the per-step results say what actually happened.
#[derive(Debug)]
pub struct CommitReport {
    /// The refund transaction
    pub refund: RefundTransaction,
    /// Whether the refund record reached the store
    pub refund_persisted: Result<(), PortError>,
    /// One entry per linked loan
    pub loan_results: Vec<LoanAdjustmentResult>,
    /// One entry per restored product
    pub stock_results: Vec<StockRestoreResult>,
}

impl CommitReport {
    /// True when every step succeeded
    pub fn is_clean(&self) -> bool {
        self.refund_persisted.is_ok()
            && self.loan_results.iter().all(|r| r.outcome.is_ok())
            && self.stock_results.iter().all(|r| r.outcome.is_ok())
    }

    /// Labels of the loans whose adjustment failed
    pub fn failed_loans(&self) -> Vec<&str> {
        self.loan_results
            .iter()
            .filter(|r| r.outcome.is_err())
            .map(|r| r.loan_label.as_str())
            .collect()
    }

    /// Surfaces loan failures as a single error, for callers that want the
    /// taxonomy rather than the per-loan detail
    pub fn ensure_loans_applied(&self) -> Result<(), RefundError> {
        let failures = self.failed_loans();
        if failures.is_empty() {
            return Ok(());
        }
        Err(RefundError::LinkedLoanUpdateFailed {
            failures: failures.into_iter().map(String::from).collect(),
        })
    }
}

/// Classifies refund drafts, matches linked loans, and drives the commit
/// sequence
pub struct RefundReconciler {
    matcher: Box<dyn LoanMatcher>,
}

impl Default for RefundReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl RefundReconciler {
    /// Creates a reconciler with the default containment matcher
    pub fn new() -> Self {
        Self {
            matcher: Box::new(ContainmentMatcher),
        }
    }

    /// Creates a reconciler with a custom matching strategy
    pub fn with_matcher(matcher: Box<dyn LoanMatcher>) -> Self {
        Self { matcher }
    }

    /// Builds classified refund lines from a sale and the agreed unit prices
    ///
    /// Prices are positional: one per sale line, in order.
    pub fn build_lines(
        &self,
        sale: &Sale,
        refund_prices: &[Money],
    ) -> Result<Vec<RefundLine>, RefundError> {
        if refund_prices.len() != sale.line_items.len() {
            return Err(RefundError::LineCountMismatch {
                expected: sale.line_items.len(),
                actual: refund_prices.len(),
            });
        }
        Ok(sale
            .line_items
            .iter()
            .zip(refund_prices)
            .map(|(line, price)| RefundLine::from_sale_line(line, *price))
            .collect())
    }

    /// Runs the configured matcher over the active loan snapshots
    pub fn match_linked_loans(
        &self,
        sale: &Sale,
        refund_lines: &[RefundLine],
        accounts: &[LoanAccount],
        product_loans: &[ProductLoan],
    ) -> Vec<LinkedLoan> {
        self.matcher
            .linked_loans(sale, refund_lines, accounts, product_loans)
    }

    /// The full-refund lines eligible for stock restoration
    pub fn restoration_candidates<'a>(&self, lines: &'a [RefundLine]) -> Vec<&'a RefundLine> {
        lines
            .iter()
            .filter(|l| l.is_restoration_candidate())
            .collect()
    }

    /// Commits a decided draft
    ///
    /// Returns `Err` only for local validation; every remote step is caught
    /// and aggregated into the report.
    pub async fn commit(
        &self,
        store: &dyn RefundStore,
        draft: RefundDraft,
    ) -> Result<CommitReport, RefundError> {
        if draft.line_items.is_empty() {
            return Err(RefundError::EmptyLineItems);
        }

        let refund = RefundTransaction {
            id: RefundId::new_v7(),
            original_sale_id: draft.sale.id,
            date: draft.date,
            line_items: draft.line_items.clone(),
            restore_stock: draft.restore_stock,
            restored_product_ids: draft.restored_product_ids.clone(),
            currency: draft.sale.currency,
        };
        let total_refund = refund.total_refund();

        debug!(
            refund_id = %refund.id,
            sale_id = %draft.sale.id,
            %total_refund,
            linked_loans = draft.linked_loans.len(),
            "committing refund"
        );

        // Step 1: linked-loan adjustments, one result per loan.
        let mut loan_results = Vec::with_capacity(draft.linked_loans.len());
        for loan in &draft.linked_loans {
            let label = loan.label();
            let outcome = self
                .adjust_loan(store, loan.clone(), draft.loan_action, total_refund)
                .await;
            if let Err(err) = &outcome {
                warn!(loan = %label, %err, "linked loan adjustment failed");
            }
            loan_results.push(LoanAdjustmentResult {
                loan_label: label,
                outcome,
            });
        }

        // Step 2: the refund record itself, independent of loan outcomes.
        let refund_persisted = store.create_refund(&refund).await;
        if let Err(err) = &refund_persisted {
            warn!(refund_id = %refund.id, %err, "refund record not persisted");
        }

        // Step 3: stock restoration for the confirmed products.
        let mut stock_results = Vec::new();
        if draft.restore_stock {
            for line in &draft.line_items {
                if !line.is_restoration_candidate()
                    || !draft.restored_product_ids.contains(&line.product_id)
                {
                    continue;
                }
                let outcome = store
                    .restore_stock(line.product_id, line.effective_quantity)
                    .await;
                if let Err(err) = &outcome {
                    warn!(product_id = %line.product_id, %err, "stock restoration failed");
                }
                stock_results.push(StockRestoreResult {
                    product_id: line.product_id,
                    quantity: line.effective_quantity,
                    outcome,
                });
            }
        }

        Ok(CommitReport {
            refund,
            refund_persisted,
            loan_results,
            stock_results,
        })
    }

    async fn adjust_loan(
        &self,
        store: &dyn RefundStore,
        loan: LinkedLoan,
        action: LoanAdjustment,
        total_refund: Money,
    ) -> Result<AppliedAdjustment, RefundError> {
        match (loan, action) {
            (LinkedLoan::Account(account), LoanAdjustment::Delete) => {
                store.delete_account(account.id).await?;
                Ok(AppliedAdjustment::Deleted)
            }
            (LinkedLoan::Product(loan), LoanAdjustment::Delete) => {
                store.delete_product_loan(loan.id).await?;
                Ok(AppliedAdjustment::Deleted)
            }
            (LinkedLoan::Account(mut account), LoanAdjustment::Modify) => {
                if !total_refund.is_positive() {
                    return Ok(AppliedAdjustment::PaymentsUnwound {
                        amount: Money::zero(account.currency),
                    });
                }
                let unwound = account.unwind_payments(total_refund)?;
                store.update_account(&account).await?;
                Ok(AppliedAdjustment::PaymentsUnwound { amount: unwound })
            }
            (LinkedLoan::Product(mut loan), LoanAdjustment::Modify) => {
                match loan.reduce_advance(total_refund)? {
                    // A loan whose advance is fully consumed is removed, not
                    // left at zero.
                    AdvanceReduction::FullyUnwound => {
                        store.delete_product_loan(loan.id).await?;
                        Ok(AppliedAdjustment::Deleted)
                    }
                    AdvanceReduction::Reduced => {
                        store.update_product_loan(&loan).await?;
                        Ok(AppliedAdjustment::AdvanceReduced {
                            remaining_advance: loan.advance_received,
                        })
                    }
                }
            }
        }
    }
}
