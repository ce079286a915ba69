//! End-to-end basket scenarios against the `scenarios` fixture set.
//!
//! The set has a £50.00 plant pot, a shirt with a colour/size SKU matrix and a labelled extra,
//! and one "Standard" delivery option: £7.00 UK, £9.00 EU, free UK delivery from £100.00.

use rust_decimal_macros::dec;
use testresult::TestResult;

use trolley::{
    basket::{Basket, LineRequest},
    config::BasketConfig,
    context::BasketContext,
    delivery::DeliveryOptionId,
    fixtures::Fixture,
    money::Money,
    orders::{MemoryOrderStore, Order, OrderFactory},
};

/// Baseline basket from the fixture set, sealed into an order.
fn place_baseline(fixture: &Fixture, config: &BasketConfig) -> TestResult<Order> {
    let ctx = BasketContext::new(fixture.catalogue(), config);
    let basket = fixture.basket(ctx)?;

    let mut factory = OrderFactory::new(ctx, MemoryOrderStore::new());

    Ok(factory.create_from_basket(&basket, None, None)?)
}

#[test]
fn baseline_charges_standard_delivery() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let basket = fixture.basket(BasketContext::new(fixture.catalogue(), &config))?;

    assert_eq!(basket.sub_total(), Money::from(50));
    assert_eq!(basket.delivery(), Money::from(7));
    assert_eq!(basket.total(), Money::from(57));
    assert_eq!(basket.quantity(), 1);

    Ok(())
}

#[test]
fn delivery_is_free_from_the_threshold() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let mut basket = Basket::new(BasketContext::new(fixture.catalogue(), &config));

    basket
        .add_item(LineRequest::new(fixture.product_id("pot")?).quantity(2))
        .ok_or("pot refused")?;

    assert_eq!(basket.sub_total(), Money::from(100));
    assert_eq!(basket.delivery(), Money::ZERO);
    assert_eq!(basket.total(), Money::from(100));

    Ok(())
}

#[test]
fn percentage_voucher_keeps_delivery_below_threshold() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let mut basket = fixture.basket(BasketContext::new(fixture.catalogue(), &config))?;

    assert!(basket.set_voucher("SAVE40", false));

    assert_eq!(basket.sub_total(), Money::from(50));
    assert_eq!(basket.discount_value(), Money::from(20));
    assert_eq!(basket.delivery(), Money::from(7));
    assert_eq!(basket.total(), Money::from(37));

    assert!(basket.set_voucher("FIXED15", false));

    assert_eq!(basket.discount_value(), Money::from(15));
    assert_eq!(basket.total(), Money::from(42));

    Ok(())
}

#[test]
fn applying_a_voucher_twice_gives_the_same_discount() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let mut basket = fixture.basket(BasketContext::new(fixture.catalogue(), &config))?;

    assert!(basket.set_voucher("SAVE40", false));
    let first = basket.discount_value();

    assert!(basket.set_voucher("SAVE40", false));

    assert_eq!(basket.discount_value(), first);

    Ok(())
}

#[test]
fn free_delivery_voucher_only_applies_in_its_countries() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let mut basket = fixture.basket(BasketContext::new(fixture.catalogue(), &config))?;

    assert!(basket.set_voucher("FREEDE", false));

    assert_eq!(basket.discount_value(), Money::ZERO);
    assert_eq!(basket.delivery(), Money::from(7));
    assert_eq!(basket.total(), Money::from(57));

    basket.set_delivery_country("DE");

    assert_eq!(basket.discount_value(), Money::from(9));
    assert_eq!(basket.delivery(), Money::from(9));
    assert_eq!(basket.total(), Money::from(50));

    Ok(())
}

#[test]
fn sealed_orders_keep_free_delivery_out_of_the_voucher_discount() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let ctx = BasketContext::new(fixture.catalogue(), &config);

    let mut basket = fixture.basket(ctx)?;
    basket.set_delivery_country("DE");
    assert!(basket.set_voucher("FREEDE", false));

    let order = OrderFactory::new(ctx, MemoryOrderStore::new())
        .create_from_basket(&basket, None, None)?;
    let replayed = Basket::restore_from_order(ctx, &order)?;

    assert!(replayed.is_frozen());
    assert_eq!(replayed.discount_value(), Money::from(9));
    assert_eq!(replayed.discount_value_excluding_free_delivery(), Money::ZERO);
    assert_eq!(
        replayed.discount_value_excluding_free_delivery(),
        basket.discount_value_excluding_free_delivery()
    );

    Ok(())
}

#[test]
fn sealed_orders_keep_the_delivery_quote() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let ctx = BasketContext::new(fixture.catalogue(), &config);

    let mut basket = Basket::new(ctx);
    basket
        .add_item(LineRequest::new(fixture.product_id("pot")?).quantity(2))
        .ok_or("pot refused")?;

    assert_eq!(basket.delivery_option_id(), None);

    let order = OrderFactory::new(ctx, MemoryOrderStore::new())
        .create_from_basket(&basket, None, None)?;
    let quote = Basket::restore_from_order(ctx, &order)?.delivery_quote();

    assert_eq!(quote.option_id, Some(DeliveryOptionId::new(1)));
    assert!(quote.free_delivery);
    assert!(!quote.is_quote_only);
    assert_eq!(quote.charge, Money::ZERO);
    assert_eq!(quote, basket.delivery_quote());

    Ok(())
}

#[test]
fn options_not_offered_for_a_product_are_refused() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let mut basket = Basket::new(BasketContext::new(fixture.catalogue(), &config));

    let red = fixture.option_id("red")?;

    assert!(
        basket
            .add_item(LineRequest::new(fixture.product_id("pot")?).options([red]))
            .is_none()
    );
    assert!(basket.is_empty());

    basket
        .add_item(LineRequest::new(fixture.product_id("shirt")?).options([red]))
        .ok_or("shirt refused")?;

    assert_eq!(basket.total(), Money::from(57));

    Ok(())
}

#[test]
fn sku_price_replaces_base_price() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let mut basket = Basket::new(BasketContext::new(fixture.catalogue(), &config));

    let request = LineRequest::new(fixture.product_id("shirt")?)
        .quantity(3)
        .options([
            fixture.option_id("red")?,
            fixture.option_id("size_14")?,
            fixture.option_id("with_label")?,
        ])
        .label(fixture.option_id("with_label")?, "Head Gardener");

    let line = basket.add_item(request).ok_or("shirt refused")?;

    assert_eq!(line.sku().map(|sku| sku.code).as_deref(), Some("RED14"));
    assert_eq!(line.total_product(), Money::new(dec!(3.50)));
    assert_eq!(line.total(), Money::new(dec!(10.50)));

    Ok(())
}

#[test]
fn unmatched_sku_keeps_base_price() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let mut basket = Basket::new(BasketContext::new(fixture.catalogue(), &config));

    let request = LineRequest::new(fixture.product_id("shirt")?)
        .options([fixture.option_id("red")?, fixture.option_id("size_16")?]);

    let line = basket.add_item(request).ok_or("shirt refused")?;

    assert!(line.sku().is_none());
    assert_eq!(line.total_product(), Money::from(50));

    Ok(())
}

#[test]
fn frozen_replay_ignores_catalogue_changes() -> TestResult {
    let mut fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let order = place_baseline(&fixture, &config)?;

    let pot = fixture.product_id("pot")?;
    assert!(fixture.catalogue_mut().set_product_price(pot, Money::from(100)));
    assert!(fixture.catalogue_mut().set_voucher_value("SAVE40", dec!(30)));

    let basket = Basket::restore_from_order(BasketContext::new(fixture.catalogue(), &config), &order)?;

    assert!(basket.is_frozen());
    assert!(!basket.unable_to_restore());
    assert_eq!(basket.sub_total(), Money::from(50));
    assert_eq!(basket.delivery(), Money::from(7));
    assert_eq!(basket.total(), Money::from(57));
    assert_eq!(basket.items().first().map(|item| item.total()), Some(Money::from(50)));

    Ok(())
}

#[test]
fn replay_with_deleted_product_is_unable_to_restore() -> TestResult {
    let mut fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let order = place_baseline(&fixture, &config)?;

    let pot = fixture.product_id("pot")?;
    fixture.catalogue_mut().remove_product(pot).ok_or("pot missing")?;

    let basket = Basket::restore_from_order(BasketContext::new(fixture.catalogue(), &config), &order)?;

    assert!(basket.is_frozen());
    assert!(basket.unable_to_restore());
    assert_eq!(basket.sub_total(), Money::from(50));
    assert_eq!(basket.total(), Money::from(57));
    assert_eq!(basket.quantity(), 1);

    Ok(())
}

#[test]
fn replay_reports_sealed_line_fingerprints() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let basket = fixture.basket(ctx)?;

    let mut factory = OrderFactory::new(ctx, MemoryOrderStore::new());
    let order = factory.create_from_basket(&basket, None, None)?;

    let replayed = Basket::restore_from_order(ctx, &order)?;

    let hashes = |basket: &Basket<'_>| -> Vec<String> {
        basket.items().iter().map(|item| item.hash().to_string()).collect()
    };

    assert_eq!(hashes(&replayed), hashes(&basket));
    assert_eq!(replayed.total(), basket.total());

    Ok(())
}
