//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_ledger::LoanAccount;
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than
/// the tolerance.
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {} {}",
        money.amount(),
        money.currency()
    );
}

/// Asserts that a loan account's balance equation holds
///
/// The outstanding balance must equal the principal minus the recorded
/// payment history, whatever sequence of edits produced the current state.
pub fn assert_balance_invariant(account: &LoanAccount) {
    let history_total = account
        .history_total()
        .expect("payment history sum overflowed");
    assert!(
        account.verify(),
        "Balance invariant violated for {}: principal={}, balance={}, history total={}",
        account.holder_name,
        account.principal.amount(),
        account.outstanding_balance.amount(),
        history_total.amount()
    );
}
