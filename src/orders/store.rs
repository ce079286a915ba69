//! Order Store
//!
//! Persistence boundary for orders. A backend writes the order and its stock movements in one
//! transaction, so a failed write leaves neither behind.

use mockall::automock;
use thiserror::Error;

use crate::{
    catalogue::products::ProductId,
    orders::{Order, OrderPk},
};

/// Errors from an [`OrderStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order id is already used by another order.
    #[error("order id {0} is already taken")]
    DuplicateOrderId(String),

    /// The backend could not complete the request; nothing was written.
    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

/// A stock movement written alongside an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    /// Product
    pub product_id: ProductId,

    /// Change in stock level, negative when stock leaves.
    pub delta: i64,
}

/// Where orders are kept.
#[automock]
pub trait OrderStore {
    /// Reserve the next primary key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable.
    fn next_pk(&mut self) -> Result<OrderPk, StoreError>;

    /// Whether any order already uses `order_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable.
    fn order_id_exists(&self, order_id: &str) -> Result<bool, StoreError>;

    /// Insert or replace the order with the same primary key, applying `stock` in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rolled back.
    fn persist(&mut self, order: &Order, stock: &[StockAdjustment]) -> Result<(), StoreError>;
}

/// Orders kept in memory, used by tests and demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrderStore {
    last_pk: u64,
    orders: Vec<Order>,
    stock: Vec<StockAdjustment>,
}

impl MemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders in insertion order.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// An order by its customer-facing id.
    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.order_id == order_id)
    }

    /// Every stock movement written so far.
    pub fn stock_adjustments(&self) -> &[StockAdjustment] {
        &self.stock
    }
}

impl OrderStore for MemoryOrderStore {
    fn next_pk(&mut self) -> Result<OrderPk, StoreError> {
        self.last_pk = self.last_pk.saturating_add(1);

        Ok(OrderPk::new(self.last_pk))
    }

    fn order_id_exists(&self, order_id: &str) -> Result<bool, StoreError> {
        Ok(self.order(order_id).is_some())
    }

    fn persist(&mut self, order: &Order, stock: &[StockAdjustment]) -> Result<(), StoreError> {
        if self
            .orders
            .iter()
            .any(|existing| existing.pk != order.pk && existing.order_id == order.order_id)
        {
            return Err(StoreError::DuplicateOrderId(order.order_id.clone()));
        }

        match self.orders.iter_mut().find(|existing| existing.pk == order.pk) {
            Some(existing) => *existing = order.clone(),
            None => self.orders.push(order.clone()),
        }

        self.stock.extend_from_slice(stock);

        Ok(())
    }
}
