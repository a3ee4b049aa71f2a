//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use core_kernel::{Currency, Money};
use proptest::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::MAD),
        Just(Currency::XOF),
        Just(Currency::GNF),
    ]
}

/// Strategy for generating valid positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for generating valid Money values with positive amounts
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// Strategy for generating valid USD Money values
pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::USD))
}

/// Strategy for generating plausible unit prices (0.01 to 10_000.00 USD)
pub fn unit_price_strategy() -> impl Strategy<Value = Money> {
    (1i64..1_000_000i64).prop_map(|cents| Money::from_minor(cents, Currency::USD))
}

/// Strategy for generating a refund price near an original selling price
///
/// Produces a mix of exact matches (full refunds) and strictly lower prices
/// (partial refunds) so properties exercise both classifications.
pub fn refund_price_strategy(selling_price: Money) -> impl Strategy<Value = Money> {
    let currency = selling_price.currency();
    let cents = (selling_price.amount() * Decimal::new(100, 0))
        .to_i64()
        .unwrap_or(i64::MAX);
    prop_oneof![
        2 => Just(selling_price),
        3 => (0i64..cents.max(1)).prop_map(move |c| Money::from_minor(c, currency)),
    ]
}

/// Strategy for generating payment sequences that never overdraw a balance
///
/// Each element is a fraction (in basis points) of the balance remaining at
/// that point, so applying them in order always keeps the balance at or
/// above zero.
pub fn payment_fraction_sequence_strategy() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..=10_000u32, 0..8)
}
