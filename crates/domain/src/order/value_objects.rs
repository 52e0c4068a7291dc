//! Value objects for the order domain.

use common::ProductId;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from a dollar value.
    pub fn from_dollars(dollars: i64) -> Self {
        Self {
            cents: dollars * 100,
        }
    }

    /// Converts a decimal amount to money, rounding half away from zero to
    /// whole cents. Returns `None` if the amount does not fit.
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self::from_cents)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the amount as a decimal with two fractional digits.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.cents, 2)
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity. Returns `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts. Returns `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

/// One line of a placement request: which product and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLineRequest {
    /// Creates a line request, rejecting a zero quantity.
    pub fn new(product_id: ProductId, quantity: u32) -> Result<Self, DomainError> {
        let line = Self {
            product_id,
            quantity,
        };
        line.validate()?;
        Ok(line)
    }

    /// Checks the quantity invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.quantity == 0 {
            return Err(DomainError::InvalidQuantity {
                product_id: self.product_id,
                quantity: self.quantity,
            });
        }
        Ok(())
    }

    /// Validates a whole request: at least one line, every quantity positive.
    pub fn validate_all(lines: &[OrderLineRequest]) -> Result<(), DomainError> {
        if lines.is_empty() {
            return Err(DomainError::NoLines);
        }
        lines.iter().try_for_each(OrderLineRequest::validate)
    }
}

/// Stock operation sent to the catalog for validation, deduction and
/// restoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOperation {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl StockOperation {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }

    /// Builds one operation per requested line, in request order.
    pub fn for_lines(lines: &[OrderLineRequest]) -> Vec<StockOperation> {
        lines.iter().map(StockOperation::from).collect()
    }
}

impl From<&OrderLineRequest> for StockOperation {
    fn from(line: &OrderLineRequest) -> Self {
        Self::new(line.product_id, line.quantity)
    }
}

/// A product as reported by the catalog at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: Option<String>,
    pub unit_price: Money,
    pub available: bool,
}

impl CatalogProduct {
    /// Creates a product snapshot, rejecting a negative price.
    pub fn new(id: ProductId, unit_price: Money, available: bool) -> Result<Self, DomainError> {
        if unit_price.is_negative() {
            return Err(DomainError::InvalidPrice {
                product_id: id,
                price: unit_price.to_string(),
            });
        }
        Ok(Self {
            id,
            name: None,
            unit_price,
            available,
        })
    }

    /// Creates a product snapshot from a decimal catalog price.
    pub fn from_decimal_price(
        id: ProductId,
        price: Decimal,
        available: bool,
    ) -> Result<Self, DomainError> {
        let unit_price = Money::from_decimal(price).ok_or_else(|| DomainError::InvalidPrice {
            product_id: id,
            price: price.to_string(),
        })?;
        Self::new(id, unit_price, available)
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// An order line priced from a catalog snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl PricedLine {
    /// Prices `quantity` units at `unit_price`.
    pub fn new(
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, DomainError> {
        let line_total = unit_price
            .checked_multiply(quantity)
            .ok_or(DomainError::AmountOverflow { product_id })?;
        Ok(Self {
            product_id,
            quantity,
            unit_price,
            line_total,
        })
    }

    /// Prices a requested line with the unit price fetched from the catalog.
    pub fn from_catalog(
        line: &OrderLineRequest,
        product: &CatalogProduct,
    ) -> Result<Self, DomainError> {
        Self::new(line.product_id, line.quantity, product.unit_price)
    }

    /// Sums the line totals.
    pub fn subtotal(lines: &[PricedLine]) -> Result<Money, DomainError> {
        lines.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.line_total)
                .ok_or(DomainError::SubtotalOverflow)
        })
    }
}
