//! Integration tests for core_kernel money types

use core_kernel::{Currency, Money, MoneyError};
use rust_decimal_macros::dec;

#[test]
fn display_uses_currency_decimal_places() {
    let usd = Money::new(dec!(1234.5), Currency::USD);
    assert_eq!(usd.to_string(), "1234.50 USD");

    let gnf = Money::new(dec!(15000), Currency::GNF);
    assert_eq!(gnf.to_string(), "15000 GNF");
}

#[test]
fn round_to_currency_drops_sub_unit_precision() {
    let m = Money::new(dec!(10.125), Currency::USD).round_to_currency();
    assert_eq!(m.amount(), dec!(10.12));
}

#[test]
fn negation_flips_sign() {
    let m = Money::new(dec!(25), Currency::EUR);
    assert!((-m).is_negative());
    assert_eq!((-(-m)), m);
}

#[test]
fn multiply_by_quantity() {
    let unit_price = Money::new(dec!(12.50), Currency::USD);
    let line_total = unit_price * dec!(3);
    assert_eq!(line_total.amount(), dec!(37.50));
}

#[test]
fn sub_across_currencies_is_rejected() {
    let usd = Money::new(dec!(10), Currency::USD);
    let mad = Money::new(dec!(10), Currency::MAD);

    assert!(matches!(
        usd.checked_sub(&mad),
        Err(MoneyError::CurrencyMismatch(_, _))
    ));
}
