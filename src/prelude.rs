//! Trolley prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    addresses::Address,
    basket::{
        Basket, BasketDict, BasketItem, BasketMessage, BasketRecordError, CheckoutOptions,
        LineRequest, MessageKind, RestoreMode,
    },
    catalogue::{
        Catalogue, MemoryCatalogue, Product, ProductId, ProductSku, StockMode, Variety,
        VarietyOption, VarietyOptionId,
    },
    config::BasketConfig,
    context::{BasketContext, Clock},
    delivery::{DeliveryOption, DeliveryOptionId, DeliveryQuote, Region},
    finance::{FinanceOption, FinanceOptionId},
    fingerprint::fingerprint,
    fixtures::{Fixture, FixtureError},
    money::Money,
    orders::{
        ApprovalStatus, Customer, MemoryOrderStore, Order, OrderError, OrderFactory,
        OrderIdFormat, OrderStatus, OrderStore,
    },
    receipt::{Receipt, ReceiptError},
    vouchers::{DiscountType, Voucher},
};
