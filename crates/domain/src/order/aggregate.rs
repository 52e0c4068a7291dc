//! Order aggregate.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use super::value_objects::{Money, PricedLine};
use crate::pricing::{DiscountStep, PricingResult};

/// An order that has been priced but not yet stored.
///
/// Handed to the order store, which assigns the identifier and creation
/// timestamp and returns the persisted [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub username: String,
    pub order_total: Money,
    pub subtotal: Money,
    pub applied_discounts: Vec<DiscountStep>,
    pub lines: Vec<PricedLine>,
}

impl NewOrder {
    /// Builds an unsaved order from priced lines and their pricing outcome.
    pub fn new(username: impl Into<String>, pricing: &PricingResult, lines: Vec<PricedLine>) -> Self {
        Self {
            username: username.into(),
            order_total: pricing.final_total,
            subtotal: pricing.subtotal,
            applied_discounts: pricing.applied.clone(),
            lines,
        }
    }

    /// Completes the order with the identity assigned by a store.
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            username: self.username,
            order_total: self.order_total,
            subtotal: self.subtotal,
            applied_discounts: self.applied_discounts,
            lines: self.lines,
            created_at,
        }
    }
}

/// A persisted order.
///
/// Immutable once stored: there are no mutating methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    username: String,
    order_total: Money,
    subtotal: Money,
    applied_discounts: Vec<DiscountStep>,
    lines: Vec<PricedLine>,
    created_at: DateTime<Utc>,
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the final, discounted total.
    pub fn order_total(&self) -> Money {
        self.order_total
    }

    /// Returns the sum of line totals before discounts.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Returns the discount steps applied, in application order.
    pub fn applied_discounts(&self) -> &[DiscountStep] {
        &self.applied_discounts
    }

    pub fn lines(&self) -> &[PricedLine] {
        &self.lines
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
