//! Order Factory
//!
//! Materialises baskets into orders: ids, secret, sealed snapshot, flat reporting columns and
//! stock movements.

use rand::Rng;
use serde_json::Value;
use thiserror::Error;
use tracing::{Span, debug, info, warn};

use crate::{
    addresses::Address,
    basket::{Basket, BasketItem, BasketRecordError},
    catalogue::products::StockMode,
    context::BasketContext,
    money::Money,
    orders::{
        ApprovalStatus, Customer, Order, OrderPk, OrderStatus,
        numbering::{self, OrderNumbering},
        store::{OrderStore, StockAdjustment, StoreError},
    },
};

/// Order id candidates tried before giving up.
pub const MAX_ORDER_ID_ATTEMPTS: u32 = 100;

/// Errors creating or updating orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Every candidate order id was taken.
    #[error("no free order id after {0} attempts")]
    IdCollision(u32),

    /// The order has been placed and its basket can only be replayed.
    #[error("order {0} has been placed and can no longer change")]
    Frozen(String),

    /// Order store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The order's stored basket could not be decoded or encoded.
    #[error(transparent)]
    Record(#[from] BasketRecordError),
}

/// Creates orders from baskets.
#[derive(Debug)]
pub struct OrderFactory<'c, S> {
    ctx: BasketContext<'c>,
    store: S,
}

impl<'c, S: OrderStore> OrderFactory<'c, S> {
    /// Create a factory writing to `store`.
    pub fn new(ctx: BasketContext<'c>, store: S) -> Self {
        OrderFactory { ctx, store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the factory, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Create an order in checkout from `basket`.
    ///
    /// The basket is stored sealed, with snapshots of every line, so the order can be replayed
    /// after the catalogue changes. Products tracked with [`StockMode::Auto`] have their stock
    /// decremented in the same write.
    ///
    /// # Errors
    ///
    /// Returns an error if no free order id is found or the store fails.
    #[tracing::instrument(
        name = "orders.factory.create_from_basket",
        skip(self, basket, customer),
        fields(
            order_id = tracing::field::Empty,
            basket_size = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    pub fn create_from_basket(
        &mut self,
        basket: &Basket<'_>,
        customer: Option<&Customer>,
        order_id_override: Option<&str>,
    ) -> Result<Order, OrderError> {
        let span = Span::current();
        let mut rng = rand::thread_rng();

        let pk = self.store.next_pk()?;

        let order_id = match order_id_override {
            Some(order_id) => order_id.to_string(),
            None => self.generate_order_id(pk, &mut rng)?,
        };

        span.record("order_id", tracing::field::display(&order_id));

        let mut order = Order {
            pk,
            order_id,
            secret_id: numbering::secret_id(pk.get(), &self.ctx.config.secret_key, &mut rng),
            status: OrderStatus::Checkout,
            approval_status: ApprovalStatus::None,
            created_on: self.ctx.clock.now(),
            basket_json_v2: Value::Null,
            basket_json: None,
            billing: Address::default(),
            delivery: Address::default(),
            full_name: None,
            email: None,
            telephone: None,
            customer_id: customer.and_then(|customer| customer.id),
            voucher_code: None,
            voucher_title: None,
            discount_value: Money::ZERO,
            delivery_option_id: None,
            delivery_option_title: None,
            delivery_charge: Money::ZERO,
            is_quote_only: false,
            sub_total: Money::ZERO,
            total: Money::ZERO,
            basket_size: 0,
            survey: None,
            special_req: None,
            click_and_collect: false,
            is_invoice: false,
            invoice_number: None,
            finance_option_id: None,
            loan_deposit: None,
        };

        self.write_basket(&mut order, basket, customer)?;

        if order.finance_option_id.is_some() {
            order.approval_status = ApprovalStatus::Waiting;
        }

        span.record("basket_size", tracing::field::display(order.basket_size));
        span.record("total", tracing::field::display(order.total));

        let stock = stock_adjustments(basket.items());

        self.store.persist(&order, &stock)?;

        info!(
            order_id = %order.order_id,
            total = %order.total,
            stock_movements = stock.len(),
            "created order"
        );

        Ok(order)
    }

    /// Create a new order in checkout with the same basket as `order`.
    ///
    /// The basket is rebuilt from the current catalogue whatever the source order's status, so
    /// the clone starts unfrozen. It only replays the snapshot when something the basket
    /// references no longer resolves. The clone gets fresh ids and never keeps a custom order id.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored basket does not decode or the new order cannot be created.
    #[tracing::instrument(
        name = "orders.factory.clone_order",
        skip(self, order),
        fields(source = %order.order_id),
        err
    )]
    pub fn clone_order(&mut self, order: &Order) -> Result<Order, OrderError> {
        let basket = Basket::rebuild_from_order(self.ctx, order)?;

        if basket.unable_to_restore() {
            warn!(source = %order.order_id, "cloned basket replays its snapshot");
        }

        let customer = Customer {
            id: order.customer_id,
            email: order.email.clone(),
            telephone: order.telephone.clone(),
        };

        self.create_from_basket(&basket, Some(&customer), None)
    }

    /// Rewrite the snapshot and reporting columns of an order still in checkout, after the
    /// customer changed their basket.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Frozen`] for placed orders, or an error if the store fails.
    #[tracing::instrument(
        name = "orders.factory.reseal",
        skip(self, order, basket),
        fields(order_id = %order.order_id),
        err
    )]
    pub fn reseal(&mut self, order: &mut Order, basket: &Basket<'_>) -> Result<(), OrderError> {
        if order.is_frozen() {
            return Err(OrderError::Frozen(order.order_id.clone()));
        }

        let customer = Customer {
            id: order.customer_id,
            email: order.email.clone(),
            telephone: order.telephone.clone(),
        };

        self.write_basket(order, basket, Some(&customer))?;

        self.store.persist(order, &[])?;

        Ok(())
    }

    fn generate_order_id<R: Rng>(&self, pk: OrderPk, rng: &mut R) -> Result<String, OrderError> {
        let config = self.ctx.config;

        let numbering = OrderNumbering {
            format: config.order_id_format,
            prefix: config.order_id_prefix.as_deref(),
            suffix: config.order_id_suffix.as_deref(),
        };

        let today = self.ctx.clock.today();

        for attempt in 0..MAX_ORDER_ID_ATTEMPTS {
            let candidate = numbering.candidate(pk.get(), attempt, today, rng);

            if !self.store.order_id_exists(&candidate)? {
                return Ok(candidate);
            }

            debug!(candidate, attempt, "order id taken");
        }

        Err(OrderError::IdCollision(MAX_ORDER_ID_ATTEMPTS))
    }

    fn write_basket(
        &self,
        order: &mut Order,
        basket: &Basket<'_>,
        customer: Option<&Customer>,
    ) -> Result<(), OrderError> {
        order.basket_json_v2 = basket.save_to_dict(false).to_json()?;
        order.basket_json = None;

        let billing = basket.billing_address();
        let checkout = basket.checkout_options();
        let quote = basket.delivery_quote();
        let delivery_option_id = quote.option_id.or(basket.delivery_option_id());

        order.billing = billing.clone();
        order.delivery = basket.delivery_address().clone();
        order.full_name = billing.full_name();
        order.email = billing
            .email
            .clone()
            .or_else(|| customer.and_then(|customer| customer.email.clone()));
        order.telephone = billing
            .telephone
            .clone()
            .or_else(|| customer.and_then(|customer| customer.telephone.clone()));

        order.voucher_code = basket.voucher_code().map(ToString::to_string);
        order.voucher_title = basket.voucher().map(|voucher| voucher.title.clone());
        order.discount_value = basket.discount_value();

        order.delivery_option_id = delivery_option_id;
        order.delivery_option_title = delivery_option_id
            .and_then(|id| self.ctx.catalogue.delivery_option(id))
            .map(|option| option.title);
        order.delivery_charge = quote.charge;
        order.is_quote_only = quote.is_quote_only;

        order.sub_total = basket.sub_total();
        order.total = basket.total();
        order.basket_size = basket.quantity();

        order.survey = checkout.survey.clone();
        order.special_req = checkout.special_req.clone();
        order.click_and_collect = basket.is_click_and_collect();
        order.is_invoice = basket.is_invoice();
        order.invoice_number = basket.invoice_number().map(ToString::to_string);
        order.finance_option_id = basket.finance_option_id();
        order.loan_deposit = basket.loan_deposit();

        Ok(())
    }
}

/// Stock leaving with an order: one movement per line of a product tracked with
/// [`StockMode::Auto`].
pub fn stock_adjustments(items: &[BasketItem]) -> Vec<StockAdjustment> {
    items
        .iter()
        .filter(|item| item.stock_mode() == StockMode::Auto)
        .map(|item| StockAdjustment {
            product_id: item.product_id(),
            delta: -i64::from(item.quantity()),
        })
        .collect()
}
