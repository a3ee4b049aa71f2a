//! Linked-loan matching
//!
//! There is no foreign key between sales and loans in the upstream data
//! model, so loans are associated with a refunded sale heuristically, by
//! bidirectional substring containment on names and descriptions. The
//! heuristic can over-match and under-match; it lives behind the
//! `LoanMatcher` trait so it can be swapped for an explicit key once the
//! data model supports one.

use crate::refund::RefundLine;
use crate::sale::Sale;
use domain_ledger::{LoanAccount, ProductLoan};

/// A loan heuristically associated with a sale
#[derive(Debug, Clone)]
pub enum LinkedLoan {
    /// A running loan account held by the sale's client
    Account(LoanAccount),
    /// An advance-payment loan tied to one of the refunded products
    Product(ProductLoan),
}

impl LinkedLoan {
    /// Short human-readable label for reports
    pub fn label(&self) -> String {
        match self {
            LinkedLoan::Account(a) => format!("loan account of {}", a.holder_name),
            LinkedLoan::Product(p) => format!("product loan '{}' of {}", p.description, p.holder_name),
        }
    }
}

/// Strategy for associating loans with a refunded sale
pub trait LoanMatcher: Send + Sync {
    /// Returns every loan considered linked to the sale being refunded
    fn linked_loans(
        &self,
        sale: &Sale,
        refund_lines: &[RefundLine],
        accounts: &[LoanAccount],
        product_loans: &[ProductLoan],
    ) -> Vec<LinkedLoan>;
}

/// Default heuristic: case-insensitive bidirectional containment
///
/// A loan is linked iff the holder and client names contain one another
/// (either direction) and, for product loans, at least one refunded line's
/// description and the loan's description pass the same test. Account loans
/// carry no product description, so the name test alone links them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainmentMatcher;

impl ContainmentMatcher {
    fn names_linked(a: &str, b: &str) -> bool {
        let a = a.trim().to_lowercase();
        let b = b.trim().to_lowercase();
        // An empty name would "contain" everything
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a.contains(&b) || b.contains(&a)
    }
}

impl LoanMatcher for ContainmentMatcher {
    fn linked_loans(
        &self,
        sale: &Sale,
        refund_lines: &[RefundLine],
        accounts: &[LoanAccount],
        product_loans: &[ProductLoan],
    ) -> Vec<LinkedLoan> {
        let mut linked = Vec::new();

        for account in accounts {
            if Self::names_linked(&account.holder_name, &sale.client_name) {
                linked.push(LinkedLoan::Account(account.clone()));
            }
        }

        for loan in product_loans {
            let name_ok = Self::names_linked(&loan.holder_name, &sale.client_name);
            let description_ok = refund_lines
                .iter()
                .any(|line| Self::names_linked(&line.description, &loan.description));
            if name_ok && description_ok {
                linked.push(LinkedLoan::Product(loan.clone()));
            }
        }

        linked
    }
}
