//! Refund workflow
//!
//! Orchestrates the user interaction around the reconciler as an explicit
//! phase machine. The UI drives it with one call per user decision; every
//! call is validated against the current phase, so a stale dialog can never
//! commit a half-decided draft.

use std::collections::HashSet;
use tracing::info;

use crate::error::RefundError;
use crate::matcher::{LinkedLoan, LoanMatcher};
use crate::ports::RefundStore;
use crate::reconciler::{CommitReport, LoanAdjustment, RefundDraft, RefundReconciler};
use crate::refund::RefundLine;
use crate::sale::Sale;
use core_kernel::{Money, ProductId};
use domain_ledger::{LoanAccount, ProductLoan};

/// Where the workflow currently is
///
/// `DecidingLoans` is skipped when the matcher finds nothing, and
/// `DecidingStock` when no line is a full refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundPhase {
    /// Waiting for the user to pick the sale to refund
    SelectingSale,
    /// Sale picked; waiting for the agreed refund prices
    EditingLines,
    /// Linked loans found; waiting for the delete/modify choice
    DecidingLoans,
    /// Full-refund lines present; waiting for the stock yes/no
    DecidingStock,
    /// All decisions made; commit may proceed
    ReadyToCommit,
    /// Commit finished; the workflow is spent
    Committed,
}

/// State machine orchestrating one refund from sale selection to commit
///
/// The sale and loan snapshots come from the caller's replica caches; the
/// workflow never fetches them itself, which keeps it synchronous until the
/// final commit.
pub struct RefundWorkflow {
    reconciler: RefundReconciler,
    phase: RefundPhase,
    sale: Option<Sale>,
    lines: Vec<RefundLine>,
    linked_loans: Vec<LinkedLoan>,
    loan_action: Option<LoanAdjustment>,
    restore_stock: bool,
    restored_product_ids: HashSet<ProductId>,
    pending_record: Option<CommitReport>,
}

impl Default for RefundWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl RefundWorkflow {
    /// Creates a workflow with the default containment matcher
    pub fn new() -> Self {
        Self::with_reconciler(RefundReconciler::new())
    }

    /// Creates a workflow with a custom matching strategy
    pub fn with_matcher(matcher: Box<dyn LoanMatcher>) -> Self {
        Self::with_reconciler(RefundReconciler::with_matcher(matcher))
    }

    fn with_reconciler(reconciler: RefundReconciler) -> Self {
        Self {
            reconciler,
            phase: RefundPhase::SelectingSale,
            sale: None,
            lines: Vec::new(),
            linked_loans: Vec::new(),
            loan_action: None,
            restore_stock: false,
            restored_product_ids: HashSet::new(),
            pending_record: None,
        }
    }

    /// The current phase
    pub fn phase(&self) -> RefundPhase {
        self.phase
    }

    /// The loans the matcher associated with the selected sale
    pub fn linked_loans(&self) -> &[LinkedLoan] {
        &self.linked_loans
    }

    /// The classified refund lines
    pub fn lines(&self) -> &[RefundLine] {
        &self.lines
    }

    /// The full-refund lines the user may restore stock for
    pub fn restoration_candidates(&self) -> Vec<&RefundLine> {
        self.reconciler.restoration_candidates(&self.lines)
    }

    /// Picks the sale to refund
    pub fn select_sale(&mut self, sale: Sale) -> Result<(), RefundError> {
        self.require_phase(RefundPhase::SelectingSale, "select a sale")?;
        self.sale = Some(sale);
        self.phase = RefundPhase::EditingLines;
        Ok(())
    }

    /// Records the agreed refund unit prices and matches linked loans
    ///
    /// `refund_prices` is positional, one per sale line. `accounts` and
    /// `product_loans` are the current replica snapshots of the two loan
    /// collections.
    pub fn set_refund_prices(
        &mut self,
        refund_prices: &[Money],
        accounts: &[LoanAccount],
        product_loans: &[ProductLoan],
    ) -> Result<(), RefundError> {
        self.require_phase(RefundPhase::EditingLines, "set refund prices")?;
        let sale = self.sale.as_ref().ok_or(RefundError::NoSaleSelected)?;

        self.lines = self.reconciler.build_lines(sale, refund_prices)?;
        self.linked_loans =
            self.reconciler
                .match_linked_loans(sale, &self.lines, accounts, product_loans);

        // Decisions default to the safe side until the user says otherwise.
        self.loan_action = None;
        self.restore_stock = false;
        self.restored_product_ids.clear();

        self.phase = if self.linked_loans.is_empty() {
            self.phase_after_loans()
        } else {
            RefundPhase::DecidingLoans
        };
        Ok(())
    }

    /// Records the user's delete/modify choice for the linked loans
    pub fn choose_loan_action(&mut self, action: LoanAdjustment) -> Result<(), RefundError> {
        self.require_phase(RefundPhase::DecidingLoans, "choose a loan action")?;
        self.loan_action = Some(action);
        self.phase = self.phase_after_loans();
        Ok(())
    }

    /// Records the stock-restoration confirmation
    ///
    /// Confirming restores every candidate line's product; declining
    /// restores nothing.
    pub fn confirm_stock_restore(&mut self, restore: bool) -> Result<(), RefundError> {
        self.require_phase(RefundPhase::DecidingStock, "confirm stock restoration")?;
        self.restore_stock = restore;
        self.restored_product_ids = if restore {
            self.restoration_candidates()
                .iter()
                .map(|l| l.product_id)
                .collect()
        } else {
            HashSet::new()
        };
        self.phase = RefundPhase::ReadyToCommit;
        Ok(())
    }

    /// Commits the decided refund
    ///
    /// Preconditions are re-checked before any network call. On success the
    /// workflow is spent; the caller refetches its caches to reconcile the
    /// local view with the server.
    pub async fn commit(&mut self, store: &dyn RefundStore) -> Result<CommitReport, RefundError> {
        self.require_phase(RefundPhase::ReadyToCommit, "commit")?;

        let mut report = match self.pending_record.take() {
            // A previous commit already applied the loan and stock steps but
            // could not persist the refund record; only that step is retried.
            Some(mut report) => {
                report.refund_persisted = store.create_refund(&report.refund).await;
                report
            }
            None => {
                let sale = self.sale.clone().ok_or(RefundError::NoSaleSelected)?;
                if self.lines.is_empty() {
                    return Err(RefundError::EmptyLineItems);
                }

                let draft = RefundDraft {
                    date: chrono::Utc::now().date_naive(),
                    sale,
                    line_items: self.lines.clone(),
                    linked_loans: self.linked_loans.clone(),
                    loan_action: self.loan_action.unwrap_or(LoanAdjustment::Modify),
                    restore_stock: self.restore_stock,
                    restored_product_ids: self.restored_product_ids.clone(),
                };

                self.reconciler.commit(store, draft).await?
            }
        };

        // A refund record that never reached the store means the commit as a
        // whole failed; the workflow stays re-committable. The applied loan
        // and stock results are kept so the retry does not repeat them.
        if let Err(err) = std::mem::replace(&mut report.refund_persisted, Ok(())) {
            self.pending_record = Some(report);
            return Err(err.into());
        }

        info!(
            refund_id = %report.refund.id,
            clean = report.is_clean(),
            "refund committed"
        );
        self.phase = RefundPhase::Committed;
        Ok(report)
    }

    /// Clears all state for the next refund
    pub fn reset(&mut self) {
        self.phase = RefundPhase::SelectingSale;
        self.sale = None;
        self.lines.clear();
        self.linked_loans.clear();
        self.loan_action = None;
        self.restore_stock = false;
        self.restored_product_ids.clear();
        self.pending_record = None;
    }

    /// Next phase once the loan decision is settled (or moot)
    fn phase_after_loans(&self) -> RefundPhase {
        if self.lines.iter().any(|l| l.is_restoration_candidate()) {
            RefundPhase::DecidingStock
        } else {
            RefundPhase::ReadyToCommit
        }
    }

    fn require_phase(
        &self,
        expected: RefundPhase,
        operation: &'static str,
    ) -> Result<(), RefundError> {
        if self.phase != expected {
            return Err(RefundError::InvalidPhase {
                operation,
                phase: format!("{:?}", self.phase),
            });
        }
        Ok(())
    }
}
