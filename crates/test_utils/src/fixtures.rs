//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the ledger
//! system. These fixtures are designed to be consistent and predictable for
//! unit tests.

use chrono::NaiveDate;
use core_kernel::{Currency, Money, ProductId};
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Creates a standard USD amount for testing
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// Creates a small USD amount for unit prices
    pub fn usd_25() -> Money {
        Money::new(dec!(25.00), Currency::USD)
    }

    /// Creates a typical loan principal
    pub fn usd_principal() -> Money {
        Money::new(dec!(1000.00), Currency::USD)
    }

    /// Creates a zero amount
    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// Creates a EUR amount for currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A fixed sale date
    pub fn sale_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    /// A fixed payment date after the sale date
    pub fn payment_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    /// A fixed refund date after the payment date
    pub fn refund_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 20).unwrap()
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    /// A client name shared by sale and loan fixtures so they link up
    pub fn client_name() -> &'static str {
        "Karim Benani"
    }

    /// A client name no loan fixture carries
    pub fn unlinked_client_name() -> &'static str {
        "Fatima Zahra"
    }

    /// A product description shared by sale lines and product loans
    pub fn product_description() -> &'static str {
        "16oz claw hammer"
    }

    /// A random client name for tests that need unrelated parties
    pub fn random_client_name() -> String {
        Name().fake()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// A fresh time-ordered product id
    pub fn product_id() -> ProductId {
        ProductId::new_v7()
    }
}
