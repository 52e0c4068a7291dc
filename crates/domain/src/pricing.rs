//! Discount policy.
//!
//! The final order total is computed in a fixed sequence:
//!
//! ```text
//! subtotal ──► role factor ──► after_role ──┬── after_role > 500.00 ──► × 0.95 ──► final
//!                                           └── otherwise ─────────────────────────► final
//! ```
//!
//! Factors compound: the large-order surcharge applies to the role-discounted
//! amount, and the threshold is evaluated on that amount, never on the raw
//! subtotal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::Money;

/// Amount the role-discounted total must exceed for the large-order step.
pub const LARGE_ORDER_THRESHOLD: Money = Money::from_cents(50_000);

/// Caller classification taken from the bearer token's role claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    PremiumUser,
    Admin,
    /// Any role this service does not recognise.
    Other(String),
}

impl Role {
    /// Parses a role claim. Case-insensitive; an optional `ROLE_` prefix is
    /// ignored. Unrecognised values are kept as [`Role::Other`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let upper = trimmed.to_ascii_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match name {
            "USER" => Role::User,
            "PREMIUM_USER" => Role::PremiumUser,
            "ADMIN" => Role::Admin,
            _ => Role::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "USER",
            Role::PremiumUser => "PREMIUM_USER",
            Role::Admin => "ADMIN",
            Role::Other(raw) => raw,
        }
    }

    /// Returns true if this role may place orders.
    pub fn can_place_orders(&self) -> bool {
        matches!(self, Role::User | Role::PremiumUser)
    }

    /// Returns true if this role may list every user's orders.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The base discount selected purely from the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleDiscount {
    /// No discount (factor 1.00).
    Identity,
    /// Premium customers pay 90%.
    PremiumUser,
}

impl RoleDiscount {
    /// Resolves the base discount for a role. Anything other than a premium
    /// user gets [`RoleDiscount::Identity`].
    pub fn for_role(role: &Role) -> Self {
        match role {
            Role::PremiumUser => RoleDiscount::PremiumUser,
            Role::User | Role::Admin | Role::Other(_) => RoleDiscount::Identity,
        }
    }

    pub fn factor(&self) -> Decimal {
        match self {
            RoleDiscount::Identity => Decimal::ONE,
            RoleDiscount::PremiumUser => Decimal::new(90, 2),
        }
    }
}

/// One multiplicative step applied while pricing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", content = "variant")]
pub enum DiscountStep {
    /// The role-selected base factor. Always the first step.
    Role(RoleDiscount),
    /// Extra 5% off once the role-discounted amount exceeds the threshold.
    LargeOrderSurcharge,
}

impl DiscountStep {
    pub fn factor(&self) -> Decimal {
        match self {
            DiscountStep::Role(discount) => discount.factor(),
            DiscountStep::LargeOrderSurcharge => Decimal::new(95, 2),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiscountStep::Role(RoleDiscount::Identity) => "identity",
            DiscountStep::Role(RoleDiscount::PremiumUser) => "premium_user",
            DiscountStep::LargeOrderSurcharge => "large_order",
        }
    }
}

/// Outcome of pricing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    /// Sum of line totals before any discount.
    pub subtotal: Money,
    /// Amount after the role factor, rounded to cents. The threshold is
    /// checked on the unrounded product.
    pub after_role: Money,
    /// Amount the customer pays.
    pub final_total: Money,
    /// Steps applied, in application order.
    pub applied: Vec<DiscountStep>,
}

/// Pure pricing policy: role factor first, large-order surcharge second.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountPolicy;

impl DiscountPolicy {
    /// Prices `subtotal` for a caller with the given role.
    ///
    /// Factors are multiplied exactly; only the reported amounts are
    /// rounded, half away from zero, to whole cents.
    pub fn price(role: &Role, subtotal: Money) -> PricingResult {
        let role_step = DiscountStep::Role(RoleDiscount::for_role(role));
        let after_role = subtotal.to_decimal() * role_step.factor();
        let mut applied = vec![role_step];

        let final_total = if after_role > LARGE_ORDER_THRESHOLD.to_decimal() {
            let step = DiscountStep::LargeOrderSurcharge;
            applied.push(step);
            after_role * step.factor()
        } else {
            after_role
        };

        PricingResult {
            subtotal,
            after_role: round_to_cents(after_role, subtotal),
            final_total: round_to_cents(final_total, subtotal),
            applied,
        }
    }
}

// Every factor is at most one, so the result never exceeds the subtotal.
fn round_to_cents(amount: Decimal, subtotal: Money) -> Money {
    Money::from_decimal(amount).unwrap_or(subtotal)
}
