//! Property tests over fingerprints, basket totals and session round trips.

use proptest::{prelude::*, test_runner::TestCaseError};
use testresult::TestResult;

use trolley::{
    basket::{Basket, LineRequest},
    catalogue::{ProductId, VarietyOptionId},
    config::BasketConfig,
    context::BasketContext,
    fingerprint::fingerprint,
    fixtures::Fixture,
    money::Money,
};

/// A line drawn from the `scenarios` set: pot, plain shirt, or shirt with a colour and size.
#[derive(Debug, Clone, Copy)]
enum Pick {
    Pot,
    Shirt,
    RedShirt,
    BlueShirt,
}

fn pick() -> impl Strategy<Value = Pick> {
    prop_oneof![
        Just(Pick::Pot),
        Just(Pick::Shirt),
        Just(Pick::RedShirt),
        Just(Pick::BlueShirt),
    ]
}

fn request(fixture: &Fixture, pick: Pick, quantity: i64) -> TestResult<LineRequest> {
    let shirt = fixture.product_id("shirt")?;

    let request = match pick {
        Pick::Pot => LineRequest::new(fixture.product_id("pot")?),
        Pick::Shirt => LineRequest::new(shirt),
        Pick::RedShirt => LineRequest::new(shirt)
            .options([fixture.option_id("red")?, fixture.option_id("size_14")?]),
        Pick::BlueShirt => LineRequest::new(shirt)
            .options([fixture.option_id("blue")?, fixture.option_id("size_16")?]),
    };

    Ok(request.quantity(quantity))
}

fn fill(
    fixture: &Fixture,
    basket: &mut Basket<'_>,
    lines: &[(Pick, i64)],
) -> Result<(), TestCaseError> {
    for &(pick, quantity) in lines {
        let line = request(fixture, pick, quantity)
            .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;

        prop_assert!(basket.add_item(line).is_some(), "line refused: {pick:?}");
    }

    Ok(())
}

fn voucher() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        Just(None),
        Just(Some("SAVE40")),
        Just(Some("FIXED15")),
        Just(Some("FREEDE")),
    ]
}

fn country() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("GB"), Just("DE"), Just("FR")]
}

#[test]
fn fingerprint_ignores_selection_order() {
    let options = prop::collection::vec(1u64..500, 0..6)
        .prop_flat_map(|ids| (Just(ids.clone()), Just(ids).prop_shuffle()));

    let custom = prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9 ]{0,8}", 0..4).prop_flat_map(
        |map| {
            let pairs: Vec<(String, String)> = map.into_iter().collect();

            (Just(pairs.clone()), Just(pairs).prop_shuffle())
        },
    );

    proptest!(|(
        product in 1u64..1000,
        (options, shuffled_options) in options,
        (custom, shuffled_custom) in custom,
    )| {
        let as_ids = |ids: &[u64]| -> Vec<VarietyOptionId> {
            ids.iter().copied().map(VarietyOptionId::new).collect()
        };

        let original = fingerprint(
            ProductId::new(product),
            &as_ids(&options),
            custom.iter().map(|(key, value)| (key.as_str(), value.as_str())),
            [],
        );

        let permuted = fingerprint(
            ProductId::new(product),
            &as_ids(&shuffled_options),
            shuffled_custom.iter().map(|(key, value)| (key.as_str(), value.as_str())),
            [],
        );

        prop_assert_eq!(original, permuted);
    });
}

#[test]
fn totals_add_up() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();

    proptest!(|(
        lines in prop::collection::vec((pick(), 1i64..=12), 0..6),
        code in voucher(),
        country in country(),
    )| {
        let mut basket = Basket::new(BasketContext::new(fixture.catalogue(), &config));

        basket.set_delivery_country(country);
        fill(&fixture, &mut basket, &lines)?;

        if let Some(code) = code {
            prop_assert!(basket.set_voucher(code, false));
        }

        let line_total: Money = basket.items().iter().map(|item| item.total()).sum();
        let quantity: u32 = basket.items().iter().map(|item| item.quantity()).sum();

        prop_assert_eq!(basket.sub_total(), line_total);
        prop_assert_eq!(basket.quantity(), quantity);
        prop_assert_eq!(
            basket.total(),
            basket.sub_total() - basket.discount_value() + basket.delivery()
        );
        prop_assert!(basket.discount_value() <= basket.sub_total() + basket.delivery());
    });

    Ok(())
}

#[test]
fn session_round_trip_keeps_every_total() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let config = BasketConfig::default();

    proptest!(|(
        lines in prop::collection::vec((pick(), 1i64..=12), 1..6),
        code in voucher(),
        country in country(),
    )| {
        let ctx = BasketContext::new(fixture.catalogue(), &config);
        let mut basket = Basket::new(ctx);

        basket.set_delivery_country(country);
        fill(&fixture, &mut basket, &lines)?;

        if let Some(code) = code {
            prop_assert!(basket.set_voucher(code, false));
        }

        let stored = basket.to_session().map_err(|err| TestCaseError::fail(err.to_string()))?;
        let restored = Basket::from_session(ctx, stored)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        let hashes = |basket: &Basket<'_>| -> Vec<String> {
            basket.items().iter().map(|item| item.hash().to_string()).collect()
        };

        prop_assert_eq!(hashes(&restored), hashes(&basket));
        prop_assert_eq!(restored.sub_total(), basket.sub_total());
        prop_assert_eq!(restored.quantity(), basket.quantity());
        prop_assert_eq!(restored.discount_value(), basket.discount_value());
        prop_assert_eq!(restored.delivery(), basket.delivery());
        prop_assert_eq!(restored.total(), basket.total());
        prop_assert_eq!(restored.voucher_code(), basket.voucher_code());
    });

    Ok(())
}
