//! Pricing flows across value objects and the discount policy.

use domain::{
    CatalogProduct, DiscountPolicy, DiscountStep, DomainError, Money, NewOrder, OrderLineRequest,
    PricedLine, ProductId, Role, RoleDiscount,
};
use rust_decimal::Decimal;

fn priced(lines: &[(OrderLineRequest, CatalogProduct)]) -> Vec<PricedLine> {
    lines
        .iter()
        .map(|(line, product)| PricedLine::from_catalog(line, product).unwrap())
        .collect()
}

#[test]
fn test_subtotal_uses_catalog_prices() {
    let p1 = ProductId::new();
    let p2 = ProductId::new();
    let lines = vec![
        (
            OrderLineRequest::new(p1, 2).unwrap(),
            CatalogProduct::from_decimal_price(p1, Decimal::new(1999, 2), true).unwrap(),
        ),
        (
            OrderLineRequest::new(p2, 3).unwrap(),
            CatalogProduct::from_decimal_price(p2, Decimal::new(5, 0), true).unwrap(),
        ),
    ];

    let priced = priced(&lines);
    let subtotal = PricedLine::subtotal(&priced).unwrap();

    assert_eq!(priced[0].line_total, Money::from_cents(3998));
    assert_eq!(priced[1].line_total, Money::from_cents(1500));
    assert_eq!(subtotal, Money::from_cents(5498));
}

#[test]
fn test_scenario_default_role_two_units_at_one_hundred() {
    let p1 = ProductId::new();
    let lines = vec![(
        OrderLineRequest::new(p1, 2).unwrap(),
        CatalogProduct::new(p1, Money::from_dollars(100), true).unwrap(),
    )];
    let priced = priced(&lines);
    let subtotal = PricedLine::subtotal(&priced).unwrap();
    let pricing = DiscountPolicy::price(&Role::User, subtotal);

    let order = NewOrder::new("bob", &pricing, priced);
    assert_eq!(order.subtotal, Money::from_dollars(200));
    assert_eq!(order.order_total, Money::from_dollars(200));
}

#[test]
fn test_scenario_premium_six_hundred() {
    let pricing = DiscountPolicy::price(&Role::parse("ROLE_PREMIUM_USER"), Money::from_dollars(600));
    assert_eq!(pricing.after_role, Money::from_dollars(540));
    assert_eq!(pricing.final_total.to_decimal(), Decimal::new(51300, 2));
    assert_eq!(
        pricing.applied,
        vec![
            DiscountStep::Role(RoleDiscount::PremiumUser),
            DiscountStep::LargeOrderSurcharge
        ]
    );
}

#[test]
fn test_premium_order_just_over_threshold_after_role_factor() {
    let p1 = ProductId::new();
    let p2 = ProductId::new();
    let lines = vec![
        (
            OrderLineRequest::new(p1, 4).unwrap(),
            CatalogProduct::from_decimal_price(p1, Decimal::new(12500, 2), true).unwrap(),
        ),
        (
            OrderLineRequest::new(p2, 1).unwrap(),
            CatalogProduct::from_decimal_price(p2, Decimal::new(5556, 2), true).unwrap(),
        ),
    ];
    let priced = priced(&lines);
    let subtotal = PricedLine::subtotal(&priced).unwrap();
    assert_eq!(subtotal, Money::from_cents(55_556));

    let pricing = DiscountPolicy::price(&Role::PremiumUser, subtotal);
    assert_eq!(pricing.final_total, Money::from_cents(47_500));
    assert_eq!(pricing.applied.len(), 2);
}

#[test]
fn test_overflowing_line_is_rejected() {
    let id = ProductId::new();
    let line = OrderLineRequest::new(id, u32::MAX).unwrap();
    let product = CatalogProduct::new(id, Money::from_cents(i64::MAX / 2), true).unwrap();

    assert_eq!(
        PricedLine::from_catalog(&line, &product),
        Err(DomainError::AmountOverflow { product_id: id })
    );
}
