//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible
//! defaults. These builders allow tests to specify only the relevant fields
//! while using defaults for everything else.

use chrono::NaiveDate;
use core_kernel::{Currency, Money, ProductId};
use domain_ledger::{LoanAccount, ProductLoan};
use domain_refund::{Sale, SaleLine};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for constructing test sales
pub struct SaleBuilder {
    client_name: String,
    date: NaiveDate,
    currency: Currency,
    line_items: Vec<SaleLine>,
}

impl Default for SaleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SaleBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            client_name: StringFixtures::client_name().to_string(),
            date: TemporalFixtures::sale_date(),
            currency: Currency::USD,
            line_items: Vec::new(),
        }
    }

    /// Sets the client name
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Sets the sale date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Sets the currency
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Adds a line item
    pub fn with_line(
        mut self,
        description: impl Into<String>,
        quantity: u32,
        unit_purchase_price: Decimal,
        unit_selling_price: Decimal,
    ) -> Self {
        self.line_items.push(SaleLine {
            product_id: ProductId::new_v7(),
            description: description.into(),
            quantity_sold: quantity,
            unit_purchase_price: Money::new(unit_purchase_price, self.currency),
            unit_selling_price: Money::new(unit_selling_price, self.currency),
        });
        self
    }

    /// Builds the sale, adding a default line when none was given
    pub fn build(mut self) -> Sale {
        if self.line_items.is_empty() {
            self = self.with_line(StringFixtures::product_description(), 2, dec!(15), dec!(25));
        }
        Sale::new(self.client_name, self.date, self.currency, self.line_items)
            .expect("builder produced an invalid sale")
    }
}

/// Builder for constructing test loan accounts
pub struct LoanAccountBuilder {
    holder_name: String,
    principal: Money,
    currency: Currency,
    payments: Vec<(Decimal, NaiveDate)>,
}

impl Default for LoanAccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoanAccountBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            holder_name: StringFixtures::client_name().to_string(),
            principal: MoneyFixtures::usd_principal(),
            currency: Currency::USD,
            payments: Vec::new(),
        }
    }

    /// Sets the holder name
    pub fn with_holder_name(mut self, name: impl Into<String>) -> Self {
        self.holder_name = name.into();
        self
    }

    /// Sets the principal
    pub fn with_principal(mut self, amount: Decimal) -> Self {
        self.principal = Money::new(amount, self.currency);
        self
    }

    /// Records a payment to apply after opening
    pub fn with_payment(mut self, amount: Decimal, date: NaiveDate) -> Self {
        self.payments.push((amount, date));
        self
    }

    /// Builds the account and applies the recorded payments in order
    pub fn build(self) -> LoanAccount {
        let mut account = LoanAccount::open(self.holder_name, self.principal, self.currency)
            .expect("builder produced an invalid account");
        for (amount, date) in self.payments {
            account
                .apply_payment(Money::new(amount, self.currency), date)
                .expect("builder payment exceeded the balance");
        }
        account
    }
}

/// Builder for constructing test product loans
pub struct ProductLoanBuilder {
    holder_name: String,
    description: String,
    selling_price: Money,
    advance_received: Money,
}

impl Default for ProductLoanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductLoanBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            holder_name: StringFixtures::client_name().to_string(),
            description: StringFixtures::product_description().to_string(),
            selling_price: MoneyFixtures::usd_100(),
            advance_received: MoneyFixtures::usd_zero(),
        }
    }

    /// Sets the holder name
    pub fn with_holder_name(mut self, name: impl Into<String>) -> Self {
        self.holder_name = name.into();
        self
    }

    /// Sets the loaned product description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the agreed selling price
    pub fn with_selling_price(mut self, amount: Decimal) -> Self {
        self.selling_price = Money::new(amount, Currency::USD);
        self
    }

    /// Sets the advance already received
    pub fn with_advance(mut self, amount: Decimal) -> Self {
        self.advance_received = Money::new(amount, Currency::USD);
        self
    }

    /// Builds the product loan
    pub fn build(self) -> ProductLoan {
        ProductLoan::new(
            self.holder_name,
            self.description,
            self.selling_price,
            self.advance_received,
        )
        .expect("builder produced an invalid product loan")
    }
}
