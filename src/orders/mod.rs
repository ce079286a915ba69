//! Orders
//!
//! An order is a persisted basket snapshot plus the flat columns reporting needs. Once payment
//! is confirmed the snapshot is the only source of truth for what was bought.

use std::fmt::{self, Display};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    addresses::Address, delivery::DeliveryOptionId, finance::FinanceOptionId, ids::TypedId,
    money::Money,
};

pub mod factory;
pub mod numbering;
pub mod store;

pub use factory::{OrderError, OrderFactory};
pub use numbering::{OrderIdFormat, OrderNumbering};
pub use store::{MemoryOrderStore, MockOrderStore, OrderStore, StockAdjustment, StoreError};

/// Order primary key
pub type OrderPk = TypedId<Order>;

/// Customer id
pub type CustomerId = TypedId<Customer>;

/// Order lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Customer is still checking out.
    #[default]
    Checkout,

    /// Handed to the payment provider.
    PaymentAwaiting,

    /// Customer cancelled payment.
    PaymentCancelled,

    /// Payment declined.
    PaymentDeclined,

    /// Payment provider error.
    PaymentError,

    /// Payment received.
    PaymentConfirmed,

    /// Being picked and packed.
    Processing,

    /// Some lines dispatched.
    PartiallyShipped,

    /// All lines dispatched.
    Shipped,

    /// Waiting in store.
    ReadyToCollect,

    /// Collected from store.
    Collected,

    /// Cancelled after placement.
    Cancelled,

    /// Placed on account, paid by invoice.
    InvoicePlaced,

    /// Placed with nothing to pay.
    ZeroAmountPlaced,

    /// Prepared by staff, waiting for the customer to pay.
    ReadyForPayment,
}

impl OrderStatus {
    /// Whether the order has been placed, after which its basket can only be replayed.
    pub fn is_frozen(self) -> bool {
        matches!(
            self,
            OrderStatus::PaymentConfirmed
                | OrderStatus::Processing
                | OrderStatus::PartiallyShipped
                | OrderStatus::Shipped
                | OrderStatus::ReadyToCollect
                | OrderStatus::Collected
                | OrderStatus::Cancelled
                | OrderStatus::InvoicePlaced
                | OrderStatus::ZeroAmountPlaced
        )
    }

    /// Whether payment has been taken, or nothing was owed.
    pub fn is_paid(self) -> bool {
        matches!(
            self,
            OrderStatus::PaymentConfirmed
                | OrderStatus::Processing
                | OrderStatus::PartiallyShipped
                | OrderStatus::Shipped
                | OrderStatus::ReadyToCollect
                | OrderStatus::Collected
                | OrderStatus::ZeroAmountPlaced
        )
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Checkout => "Checkout",
            OrderStatus::PaymentAwaiting => "Awaiting Payment",
            OrderStatus::PaymentCancelled => "Payment Cancelled",
            OrderStatus::PaymentDeclined => "Payment Declined",
            OrderStatus::PaymentError => "Payment Error",
            OrderStatus::PaymentConfirmed => "Payment Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::PartiallyShipped => "Partially Shipped",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::ReadyToCollect => "Ready to Collect",
            OrderStatus::Collected => "Collected",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::InvoicePlaced => "Invoice Placed",
            OrderStatus::ZeroAmountPlaced => "Zero Amount Placed",
            OrderStatus::ReadyForPayment => "Ready for Payment",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Finance provider approval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// No approval needed.
    #[default]
    None,

    /// Waiting for the provider.
    Waiting,

    /// Approved
    Approved,

    /// Rejected
    Rejected,

    /// The application expired.
    Timeout,
}

impl ApprovalStatus {
    /// Whether the payment status may still move.
    pub fn can_change_payment_status(self) -> bool {
        !matches!(self, ApprovalStatus::Rejected | ApprovalStatus::Timeout)
    }
}

/// The customer an order is placed for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer id
    pub id: Option<CustomerId>,

    /// Contact email
    pub email: Option<String>,

    /// Contact telephone
    pub telephone: Option<String>,
}

/// A placed (or in-checkout) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Primary key
    pub pk: OrderPk,

    /// Customer-facing id
    pub order_id: String,

    /// Unguessable id for order links
    pub secret_id: String,

    /// Lifecycle state
    pub status: OrderStatus,

    /// Finance approval state
    pub approval_status: ApprovalStatus,

    /// Creation time
    pub created_on: Timestamp,

    /// Basket snapshot in the current shape.
    #[serde(default)]
    pub basket_json_v2: Value,

    /// Basket snapshot in the legacy shape, present on old orders only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basket_json: Option<Value>,

    /// Billing address
    pub billing: Address,

    /// Delivery address
    pub delivery: Address,

    /// Billing name
    pub full_name: Option<String>,

    /// Contact email
    pub email: Option<String>,

    /// Contact telephone
    pub telephone: Option<String>,

    /// Customer
    pub customer_id: Option<CustomerId>,

    /// Voucher code
    pub voucher_code: Option<String>,

    /// Voucher title at the time of ordering
    pub voucher_title: Option<String>,

    /// Voucher discount
    pub discount_value: Money,

    /// Delivery option
    pub delivery_option_id: Option<DeliveryOptionId>,

    /// Delivery option title at the time of ordering
    pub delivery_option_title: Option<String>,

    /// Delivery charge
    pub delivery_charge: Money,

    /// Delivery to be quoted separately
    pub is_quote_only: bool,

    /// Sum of line totals
    pub sub_total: Money,

    /// Amount payable
    pub total: Money,

    /// Number of units
    pub basket_size: u32,

    /// Survey answer
    pub survey: Option<String>,

    /// Special requirements
    pub special_req: Option<String>,

    /// Customer collects in store
    pub click_and_collect: bool,

    /// Invoice order
    pub is_invoice: bool,

    /// Invoice reference
    pub invoice_number: Option<String>,

    /// Finance option
    pub finance_option_id: Option<FinanceOptionId>,

    /// Loan deposit
    pub loan_deposit: Option<Money>,
}

impl Order {
    /// The stored basket: the current snapshot, falling back to the legacy one on orders placed
    /// before the current shape existed.
    pub fn stored_basket(&self) -> &Value {
        match (&self.basket_json_v2, &self.basket_json) {
            (Value::Null, Some(legacy)) => legacy,
            (current, _) => current,
        }
    }

    /// Whether the order's basket can only be replayed.
    pub fn is_frozen(&self) -> bool {
        self.status.is_frozen()
    }

    /// Whether the payment status may still move.
    pub fn can_change_payment_status(&self) -> bool {
        self.approval_status.can_change_payment_status()
    }
}
