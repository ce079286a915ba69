//! Order creation against mocked and in-memory stores.

use jiff::Timestamp;
use testresult::TestResult;

use trolley::{
    basket::{Basket, LineRequest},
    config::BasketConfig,
    context::{BasketContext, Clock},
    delivery::DeliveryOptionId,
    fixtures::Fixture,
    money::Money,
    orders::{
        ApprovalStatus, MemoryOrderStore, MockOrderStore, Order, OrderError, OrderFactory,
        OrderIdFormat, OrderPk, OrderStatus, StockAdjustment, StoreError,
    },
};

fn fixed_clock() -> TestResult<Clock> {
    Ok(Clock::Fixed(Timestamp::from_second(1_750_000_000)?))
}

/// Places the fixture basket as an order still in checkout, after `adjust` has had a go at it.
fn place(
    fixture: &Fixture,
    config: &BasketConfig,
    adjust: impl FnOnce(&mut Basket<'_>) -> TestResult,
) -> TestResult<Order> {
    let ctx = BasketContext::new(fixture.catalogue(), config);
    let mut basket = fixture.basket(ctx)?;

    adjust(&mut basket)?;

    Ok(OrderFactory::new(ctx, MemoryOrderStore::new()).create_from_basket(&basket, None, None)?)
}

#[test]
fn gives_up_when_every_order_id_is_taken() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let basket = fixture.basket(ctx)?;

    let mut store = MockOrderStore::new();

    store
        .expect_next_pk()
        .once()
        .return_once(|| Ok(OrderPk::new(7)));
    store
        .expect_order_id_exists()
        .times(100)
        .returning(|_| Ok(true));
    store.expect_persist().never();

    let result = OrderFactory::new(ctx, store).create_from_basket(&basket, None, None);

    assert!(matches!(result, Err(OrderError::IdCollision(100))));

    Ok(())
}

#[test]
fn numeric_ids_move_on_after_a_collision() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let ctx = BasketContext::new(fixture.catalogue(), &config).with_clock(fixed_clock()?);
    let basket = fixture.basket(ctx)?;

    let mut store = MockOrderStore::new();

    store
        .expect_next_pk()
        .once()
        .return_once(|| Ok(OrderPk::new(7)));
    store
        .expect_order_id_exists()
        .times(2)
        .returning(|order_id| Ok(order_id == "2025-06-7"));
    store
        .expect_persist()
        .once()
        .withf(|order, stock| order.order_id == "2025-06-8" && stock.is_empty())
        .return_once(|_, _| Ok(()));

    let order = OrderFactory::new(ctx, store).create_from_basket(&basket, None, None)?;

    assert_eq!(order.order_id, "2025-06-8");
    assert_eq!(order.secret_id.len(), 56);
    assert_eq!(order.status, OrderStatus::Checkout);
    assert_eq!(order.approval_status, ApprovalStatus::None);

    Ok(())
}

#[test]
fn failed_write_surfaces_the_store_error() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let basket = fixture.basket(ctx)?;

    let mut store = MockOrderStore::new();

    store
        .expect_next_pk()
        .once()
        .return_once(|| Ok(OrderPk::new(1)));
    store.expect_order_id_exists().returning(|_| Ok(false));
    store
        .expect_persist()
        .once()
        .return_once(|_, _| Err(StoreError::Unavailable("connection reset".to_string())));

    let result = OrderFactory::new(ctx, store).create_from_basket(&basket, None, None);

    assert!(matches!(
        result,
        Err(OrderError::Store(StoreError::Unavailable(_)))
    ));

    Ok(())
}

#[test]
fn tracked_stock_leaves_with_the_order() -> TestResult {
    let fixture = Fixture::from_set("garden")?;
    let config = BasketConfig {
        order_id_format: OrderIdFormat::Sequential,
        ..BasketConfig::default()
    };
    let ctx = BasketContext::new(fixture.catalogue(), &config).with_clock(fixed_clock()?);
    let basket = fixture.basket(ctx)?;

    let mut factory = OrderFactory::new(ctx, MemoryOrderStore::new());
    let order = factory.create_from_basket(&basket, None, None)?;

    let planter = fixture.product_id("planter")?;

    assert_eq!(order.order_id, "1");
    assert_eq!(order.total, basket.total());
    assert_eq!(order.voucher_code.as_deref(), Some("SPRING10"));
    assert_eq!(order.basket_size, basket.quantity());
    assert_eq!(
        factory.store().stock_adjustments(),
        [StockAdjustment {
            product_id: planter,
            delta: -2,
        }]
    );

    Ok(())
}

#[test]
fn checkout_orders_resume_as_live_baskets() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let basket = fixture.basket(ctx)?;

    let mut factory = OrderFactory::new(ctx, MemoryOrderStore::new());
    let mut order = factory.create_from_basket(&basket, None, None)?;

    let mut resumed = Basket::thaw_from_order(ctx, &order)?.ok_or("order is frozen")?;

    assert!(!resumed.is_frozen());
    assert_eq!(resumed.total(), Money::from(57));

    let hash = resumed.items().first().ok_or("no line")?.hash().to_string();
    resumed.update_quantity_by_hash(&hash, 2);

    factory.reseal(&mut order, &resumed)?;

    assert_eq!(order.sub_total, Money::from(100));
    assert_eq!(order.delivery_charge, Money::ZERO);
    assert_eq!(order.total, Money::from(100));

    order.status = OrderStatus::PaymentConfirmed;

    assert!(Basket::thaw_from_order(ctx, &order)?.is_none());
    assert!(matches!(
        factory.reseal(&mut order, &resumed),
        Err(OrderError::Frozen(_))
    ));

    Ok(())
}

#[test]
fn checkout_orders_with_a_withdrawn_product_replay_their_snapshot() -> TestResult {
    let mut fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let order = place(&fixture, &config, |_| Ok(()))?;

    let pot = fixture.product_id("pot")?;
    fixture.catalogue_mut().remove_product(pot).ok_or("pot missing")?;

    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let basket = Basket::thaw_from_order(ctx, &order)?.ok_or("order is frozen")?;

    assert!(basket.is_frozen());
    assert!(basket.unable_to_restore());
    assert_eq!(basket.total(), Money::from(57));
    assert_eq!(basket.quantity(), 1);

    Ok(())
}

#[test]
fn checkout_orders_with_a_disabled_voucher_replay_their_snapshot() -> TestResult {
    let mut fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let order = place(&fixture, &config, |basket| {
        basket
            .set_voucher("SAVE40", false)
            .then_some(())
            .ok_or_else(|| "voucher refused".into())
    })?;

    assert_eq!(order.total, Money::from(37));

    fixture
        .catalogue_mut()
        .voucher_mut("SAVE40")
        .ok_or("voucher missing")?
        .enabled = false;

    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let basket = Basket::thaw_from_order(ctx, &order)?.ok_or("order is frozen")?;

    assert!(basket.is_frozen());
    assert!(basket.unable_to_restore());
    assert_eq!(basket.voucher_code(), Some("SAVE40"));
    assert_eq!(basket.discount_value(), Money::from(20));
    assert_eq!(basket.total(), Money::from(37));

    Ok(())
}

#[test]
fn checkout_orders_with_a_removed_delivery_option_replay_their_snapshot() -> TestResult {
    let mut fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let standard = DeliveryOptionId::new(1);
    let order = place(&fixture, &config, |basket| {
        basket
            .set_delivery_option(standard)
            .then_some(())
            .ok_or_else(|| "delivery option refused".into())
    })?;

    fixture
        .catalogue_mut()
        .remove_delivery_option(standard)
        .ok_or("delivery option missing")?;

    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let basket = Basket::thaw_from_order(ctx, &order)?.ok_or("order is frozen")?;

    assert!(basket.is_frozen());
    assert!(basket.unable_to_restore());
    assert_eq!(basket.delivery_quote().option_id, Some(standard));
    assert_eq!(basket.delivery(), Money::from(7));
    assert_eq!(basket.total(), Money::from(57));

    Ok(())
}

#[test]
fn cloning_a_placed_order_rebuilds_a_live_basket() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let lamp = fixture.product_id("lamp")?;

    let mut basket = Basket::new(ctx);
    basket
        .add_item(LineRequest::new(lamp).quantity(3))
        .ok_or("lamp refused")?;

    let mut factory = OrderFactory::new(ctx, MemoryOrderStore::new());
    let mut order = factory.create_from_basket(&basket, None, None)?;
    order.status = OrderStatus::PaymentConfirmed;

    let clone = factory.clone_order(&order)?;
    let rebuilt = Basket::thaw_from_order(ctx, &clone)?.ok_or("clone is frozen")?;

    assert_eq!(clone.status, OrderStatus::Checkout);
    assert_ne!(clone.secret_id, order.secret_id);
    assert_eq!(clone.basket_size, 3);
    assert!(!rebuilt.is_frozen());
    assert!(!rebuilt.unable_to_restore());
    assert!(rebuilt.items().iter().all(|item| item.product().is_some()));

    let movement = StockAdjustment {
        product_id: lamp,
        delta: -3,
    };

    assert_eq!(factory.store().stock_adjustments(), [movement, movement]);

    Ok(())
}

#[test]
fn cloned_orders_take_current_prices() -> TestResult {
    let mut fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let mut order = place(&fixture, &config, |_| Ok(()))?;
    order.status = OrderStatus::Shipped;

    let pot = fixture.product_id("pot")?;
    assert!(fixture.catalogue_mut().set_product_price(pot, Money::from(80)));

    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let clone = OrderFactory::new(ctx, MemoryOrderStore::new()).clone_order(&order)?;

    assert_eq!(clone.status, OrderStatus::Checkout);
    assert_eq!(clone.sub_total, Money::from(80));
    assert_eq!(clone.total, Money::from(87));

    Ok(())
}

#[test]
fn cloning_falls_back_to_the_snapshot_when_a_product_is_gone() -> TestResult {
    let mut fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();
    let mut order = place(&fixture, &config, |_| Ok(()))?;
    order.status = OrderStatus::Shipped;

    let pot = fixture.product_id("pot")?;
    fixture.catalogue_mut().remove_product(pot).ok_or("pot missing")?;

    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let clone = OrderFactory::new(ctx, MemoryOrderStore::new()).clone_order(&order)?;

    assert_eq!(clone.status, OrderStatus::Checkout);
    assert_eq!(clone.total, Money::from(57));
    assert_eq!(clone.basket_size, 1);

    Ok(())
}
