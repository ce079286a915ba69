//! Quote Example
//!
//! Prices a fixture basket and prints a receipt.
//!
//! Use `-f` to load a fixture set by name
//! Use `-c` to set the delivery country
//! Use `-v` to apply a voucher code
//! Use `-o` to place an order for the basket
//!
//! Set `RUST_LOG=trolley=debug` to see basket and order events.

use std::io;

use anyhow::{Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use trolley::{
    config::BasketConfig,
    context::BasketContext,
    fixtures::Fixture,
    orders::{MemoryOrderStore, OrderFactory},
    receipt::Receipt,
    utils::QuoteArgs,
};

/// Quote Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = QuoteArgs::parse();
    let fixture = Fixture::from_set(&args.fixture)?;

    let mut config = BasketConfig::from_env()?;

    if let Some(currency) = fixture.currency() {
        currency.clone_into(&mut config.currency);
    }

    let ctx = BasketContext::new(fixture.catalogue(), &config);
    let mut basket = fixture.basket(ctx)?;

    if let Some(country) = args.country.as_deref() {
        basket.set_delivery_country(country);
    }

    if let Some(code) = args.voucher.as_deref()
        && !basket.set_voucher(code, false)
    {
        bail!("voucher {code} cannot be used with this basket");
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    Receipt::from_basket(&basket).write_to(&mut handle)?;

    if args.order {
        let mut factory = OrderFactory::new(ctx, MemoryOrderStore::new());
        let order = factory.create_from_basket(&basket, None, None)?;

        println!("Order {} ({}) {}", order.order_id, order.status, order.secret_id);
    }

    Ok(())
}
