//! Basket
//!
//! The basket facade: lines, addresses, voucher, delivery and finance selection, and the totals
//! derived from them. A live basket prices from the catalogue on every query. A frozen basket
//! replays the snapshot it was sealed with and ignores every mutation.

use rustc_hash::FxHashSet;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    addresses::Address,
    catalogue::{
        products::{CategoryId, ProductId},
        varieties::VarietyOptionId,
    },
    context::BasketContext,
    delivery::{self, DeliveryConditions, DeliveryLine, DeliveryOptionId, DeliveryQuote, Region},
    finance::{self, FinanceBasket, FinanceFilter, FinanceLine, FinanceOption, FinanceOptionId},
    money::Money,
    orders::Order,
    vouchers::Voucher,
};

pub mod item;
pub mod legacy;
pub mod messages;
pub mod placeholder;
pub mod serialise;

pub use item::{BasketItem, LineRequest, MAX_QUANTITY};
pub use messages::{BasketMessage, MessageKind};
pub use placeholder::{BasketPlaceholder, LinePlaceholder, PlaceholderTotals};
pub use serialise::{BasketDict, BasketRecord, BasketRecordError, ItemDict};

use item::{LineLookup, clamp_quantity};
use legacy::LegacyBasket;
use messages::{
    MESSAGE_FINANCE_AVAILABLE, MESSAGE_FINANCE_SELECTED, MESSAGE_FINANCE_UNAVAILABLE,
    MESSAGE_FROZEN_BASKET, MESSAGE_PRE_ORDER, MESSAGE_UNABLE_TO_RESTORE,
};

/// Where a stored basket is being restored from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    /// The customer's session. Broken lines and stale references are dropped.
    Session,

    /// An order still in checkout. Any missing reference seals the basket.
    Order,

    /// A sealed order. The basket replays its snapshot.
    Replay,
}

/// Checkout preferences captured alongside the basket.
#[expect(clippy::struct_excessive_bools, reason = "independent checkout opt-ins")]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutOptions {
    /// Newsletter opt-in
    pub newsletter: bool,

    /// Create an account
    pub signup: bool,

    /// Save addresses to the profile
    pub update_profile: bool,

    /// Terms accepted
    pub terms: bool,

    /// Special requirements
    pub special_req: Option<String>,

    /// Survey answer
    pub survey: Option<String>,
}

/// A shopping basket.
#[expect(clippy::struct_excessive_bools, reason = "basket delivery and state flags")]
#[derive(Debug, Clone)]
pub struct Basket<'c> {
    ctx: BasketContext<'c>,
    items: Vec<BasketItem>,
    billing_address: Address,
    delivery_address: Address,
    voucher_code: Option<String>,
    voucher: Option<Voucher>,
    delivery_option_id: Option<DeliveryOptionId>,
    finance_option_id: Option<FinanceOptionId>,
    loan_deposit: Option<Money>,
    checkout: CheckoutOptions,
    click_and_collect: bool,
    free_delivery_to: bool,
    invoice: bool,
    invoice_number: Option<String>,
    default_delivery: bool,
    can_edit_billing_address: bool,
    can_edit_delivery_address: bool,
    custom_total: Option<Money>,
    placeholder: Option<BasketPlaceholder>,
    frozen: bool,
    unable_to_restore: bool,
}

impl<'c> Basket<'c> {
    /// An empty, editable basket.
    pub fn new(ctx: BasketContext<'c>) -> Self {
        Basket {
            ctx,
            items: Vec::new(),
            billing_address: Address::default(),
            delivery_address: Address::default(),
            voucher_code: None,
            voucher: None,
            delivery_option_id: None,
            finance_option_id: None,
            loan_deposit: None,
            checkout: CheckoutOptions::default(),
            click_and_collect: false,
            free_delivery_to: false,
            invoice: false,
            invoice_number: None,
            default_delivery: false,
            can_edit_billing_address: true,
            can_edit_delivery_address: true,
            custom_total: None,
            placeholder: None,
            frozen: false,
            unable_to_restore: false,
        }
    }

    /// The context the basket prices against.
    pub fn context(&self) -> BasketContext<'c> {
        self.ctx
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[BasketItem] {
        &self.items
    }

    /// The line with fingerprint `hash`.
    pub fn item_by_hash(&self, hash: &str) -> Option<&BasketItem> {
        self.items.iter().find(|item| item.matches_hash(hash))
    }

    /// Whether the basket has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the basket replays a sealed snapshot.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether the sealed basket references catalogue entries that no longer exist.
    pub fn unable_to_restore(&self) -> bool {
        self.unable_to_restore
    }

    /// Billing address
    pub fn billing_address(&self) -> &Address {
        &self.billing_address
    }

    /// Delivery address
    pub fn delivery_address(&self) -> &Address {
        &self.delivery_address
    }

    /// The bound voucher.
    pub fn voucher(&self) -> Option<&Voucher> {
        self.voucher.as_ref()
    }

    /// The voucher code, kept on sealed baskets even when the voucher is gone.
    pub fn voucher_code(&self) -> Option<&str> {
        self.voucher_code.as_deref()
    }

    /// Selected delivery option
    pub fn delivery_option_id(&self) -> Option<DeliveryOptionId> {
        self.delivery_option_id
    }

    /// Selected finance option
    pub fn finance_option_id(&self) -> Option<FinanceOptionId> {
        self.finance_option_id
    }

    /// Deposit towards a loan
    pub fn loan_deposit(&self) -> Option<Money> {
        self.loan_deposit
    }

    /// Checkout preferences
    pub fn checkout_options(&self) -> &CheckoutOptions {
        &self.checkout
    }

    /// Customer collects in store
    pub fn is_click_and_collect(&self) -> bool {
        self.click_and_collect
    }

    /// Delivery address is flagged for free delivery
    pub fn is_free_delivery_to(&self) -> bool {
        self.free_delivery_to
    }

    /// Invoice order
    pub fn is_invoice(&self) -> bool {
        self.invoice
    }

    /// Invoice reference
    pub fn invoice_number(&self) -> Option<&str> {
        self.invoice_number.as_deref()
    }

    /// Deliver to the billing address
    pub fn is_default_delivery(&self) -> bool {
        self.default_delivery
    }

    /// Billing address may be edited
    pub fn can_edit_billing_address(&self) -> bool {
        self.can_edit_billing_address
    }

    /// Delivery address may be edited
    pub fn can_edit_delivery_address(&self) -> bool {
        self.can_edit_delivery_address
    }

    /// Total override
    pub fn custom_total(&self) -> Option<Money> {
        self.custom_total
    }

    /// Delivery country: the delivery address, the billing address when delivering there, or
    /// the shop default.
    pub fn delivery_country(&self) -> &str {
        self.delivery_address
            .country
            .as_deref()
            .or_else(|| {
                self.default_delivery
                    .then_some(self.billing_address.country.as_deref())
                    .flatten()
            })
            .unwrap_or(&self.ctx.config.default_country)
    }

    /// Delivery region
    pub fn region(&self) -> Region {
        Region::from_country(self.delivery_country(), self.ctx.config.eu_countries.as_slice())
    }

    fn refuse_if_frozen(&self, operation: &'static str) -> bool {
        if self.frozen {
            debug!(operation, "refused to change a frozen basket");
        }

        self.frozen
    }

    fn product_ids(&self) -> Vec<ProductId> {
        let mut seen = FxHashSet::default();

        self.items
            .iter()
            .map(BasketItem::product_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    fn voucher_categories(&self) -> &[CategoryId] {
        self.voucher
            .as_ref()
            .map(|voucher| voucher.categories.as_slice())
            .unwrap_or_default()
    }

    /// Add a product. Adding a line that already exists adds to its quantity.
    ///
    /// Returns `None` when the basket is frozen, the quantity is not positive, the product or
    /// one of the options is unknown or unavailable, an option is not assigned to the product,
    /// or the product cannot be bought.
    pub fn add_item(&mut self, request: LineRequest) -> Option<&BasketItem> {
        if self.refuse_if_frozen("add_item") || request.quantity <= 0 {
            return None;
        }

        let quantity = clamp_quantity(request.quantity);

        let lookup = LineLookup::load(
            self.ctx.catalogue,
            &[request.product_id],
            &request.option_ids,
        );

        let product = lookup.product(request.product_id)?;

        if !product.can_be_added_to_basket() {
            debug!(product_id = %product.id, "product cannot be added to the basket");

            return None;
        }

        let options = lookup.options(&request.option_ids)?;

        if !options.iter().all(|option| option.is_selectable()) {
            return None;
        }

        if let Some(option) = options
            .iter()
            .find(|option| !lookup.is_assigned(product.id, option.id()))
        {
            debug!(
                product_id = %product.id,
                option_id = %option.id(),
                "option is not offered for this product"
            );

            return None;
        }

        let item = lookup.bind(product, options, quantity, request.custom, request.labels);

        info!(product_id = %item.product_id(), quantity, "added basket line");

        if let Some(index) = self
            .items
            .iter()
            .position(|line| line.matches_hash(item.hash()))
        {
            let existing = self.items.get_mut(index)?;
            existing.increase_quantity_by(i64::from(quantity));

            return Some(&*existing);
        }

        self.items.push(item);
        self.items.last()
    }

    /// Remove the line with fingerprint `hash`.
    pub fn remove_item_by_hash(&mut self, hash: &str) -> Option<BasketItem> {
        if self.refuse_if_frozen("remove_item_by_hash") {
            return None;
        }

        let index = self.items.iter().position(|item| item.matches_hash(hash))?;

        Some(self.items.remove(index))
    }

    /// Set a line's quantity, clamped to `0..=9999`. Returns `true` when the line was removed.
    pub fn update_quantity_by_hash(&mut self, hash: &str, quantity: i64) -> bool {
        if self.refuse_if_frozen("update_quantity_by_hash") {
            return false;
        }

        let quantity = clamp_quantity(quantity);

        if quantity == 0 {
            return self.remove_item_by_hash(hash).is_some();
        }

        if let Some(item) = self.items.iter_mut().find(|item| item.matches_hash(hash)) {
            item.set_quantity(quantity);
        }

        false
    }

    /// Apply a voucher by code.
    ///
    /// The voucher must be enabled. Outside `restore_mode` it must also be within its validity
    /// window and below its usage cap. Restores skip those checks so an order can replay with
    /// the voucher it was placed with.
    pub fn set_voucher(&mut self, code: &str, restore_mode: bool) -> bool {
        if self.refuse_if_frozen("set_voucher") {
            return false;
        }

        self.bind_voucher(code, restore_mode)
    }

    fn bind_voucher(&mut self, code: &str, restore_mode: bool) -> bool {
        let Some(voucher) = self.ctx.catalogue.voucher_by_code(code) else {
            return false;
        };

        if !voucher.enabled {
            return false;
        }

        if !restore_mode
            && (!voucher.applies_at(self.ctx.clock.today()) || !voucher.is_available())
        {
            return false;
        }

        self.voucher_code = Some(voucher.code.clone());
        self.voucher = Some(voucher);

        true
    }

    /// Drop the voucher.
    pub fn remove_voucher(&mut self) {
        if !self.refuse_if_frozen("remove_voucher") {
            self.voucher = None;
            self.voucher_code = None;
        }
    }

    /// Select a delivery option. Unknown or disabled options are refused.
    pub fn set_delivery_option(&mut self, id: DeliveryOptionId) -> bool {
        if self.refuse_if_frozen("set_delivery_option") {
            return false;
        }

        let known = self
            .ctx
            .catalogue
            .delivery_option(id)
            .is_some_and(|option| option.enabled);

        if known {
            self.delivery_option_id = Some(id);
        }

        known
    }

    /// Set the delivery country.
    pub fn set_delivery_country(&mut self, country: &str) {
        if self.refuse_if_frozen("set_delivery_country") {
            return;
        }

        let country = country.trim();

        self.delivery_address.country =
            (!country.is_empty()).then(|| country.to_ascii_uppercase());
    }

    /// Toggle click-and-collect.
    pub fn set_click_and_collect(&mut self, click_and_collect: bool) {
        if !self.refuse_if_frozen("set_click_and_collect") {
            self.click_and_collect = click_and_collect;
        }
    }

    /// Flag the delivery address for free delivery.
    pub fn set_free_delivery_to(&mut self, free_delivery_to: bool) {
        if !self.refuse_if_frozen("set_free_delivery_to") {
            self.free_delivery_to = free_delivery_to;
        }
    }

    /// Toggle invoice ordering. Turning it off clears the invoice number.
    pub fn set_invoice(&mut self, invoice: bool, number: Option<String>) {
        if self.refuse_if_frozen("set_invoice") {
            return;
        }

        self.invoice = invoice;
        self.invoice_number = if invoice { number } else { None };
    }

    /// Deliver to the billing address.
    pub fn set_default_delivery(&mut self, default_delivery: bool) {
        if !self.refuse_if_frozen("set_default_delivery") {
            self.default_delivery = default_delivery;
        }
    }

    /// Allow or prevent address edits.
    pub fn set_can_edit_addresses(&mut self, billing: bool, delivery: bool) {
        if !self.refuse_if_frozen("set_can_edit_addresses") {
            self.can_edit_billing_address = billing;
            self.can_edit_delivery_address = delivery;
        }
    }

    /// Override the total. Negative amounts are clamped to zero.
    pub fn set_custom_total(&mut self, total: Money) {
        if !self.refuse_if_frozen("set_custom_total") {
            self.custom_total = Some(total.non_negative());
        }
    }

    /// Remove the total override.
    pub fn clear_custom_total(&mut self) {
        if !self.refuse_if_frozen("clear_custom_total") {
            self.custom_total = None;
        }
    }

    /// Set the billing address. A non-empty address without a country is refused.
    pub fn set_billing_address(&mut self, address: Address) -> bool {
        if self.refuse_if_frozen("set_billing_address") {
            return false;
        }

        let address = address.normalised();

        if !address.is_empty() && address.country.is_none() {
            return false;
        }

        self.billing_address = address;

        true
    }

    /// Set the delivery address.
    pub fn set_delivery_address(&mut self, address: Address) -> bool {
        if self.refuse_if_frozen("set_delivery_address") {
            return false;
        }

        self.delivery_address = address.normalised();

        true
    }

    /// Record checkout preferences.
    pub fn set_checkout_options(&mut self, options: CheckoutOptions) {
        if !self.refuse_if_frozen("set_checkout_options") {
            self.checkout = options;
        }
    }

    /// Select a finance option, or clear the selection. Only options the basket currently
    /// qualifies for are accepted.
    pub fn set_finance_option(&mut self, id: Option<FinanceOptionId>) -> bool {
        if self.refuse_if_frozen("set_finance_option") {
            return false;
        }

        let Some(id) = id else {
            self.finance_option_id = None;
            return true;
        };

        let eligible = self.finance_options().iter().any(|option| option.id == id);

        if eligible {
            self.finance_option_id = Some(id);
        }

        eligible
    }

    /// Set the loan deposit.
    pub fn set_loan_deposit(&mut self, deposit: Option<Money>) {
        if !self.refuse_if_frozen("set_loan_deposit") {
            self.loan_deposit = deposit.map(Money::non_negative);
        }
    }

    /// Empty the basket and reset everything attached to it.
    pub fn clear(&mut self) {
        if !self.refuse_if_frozen("clear") {
            *self = Basket::new(self.ctx);
        }
    }

    /// Seal the basket with its current totals. Further mutations are ignored.
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }

        let placeholder = self.snapshot();
        let categories = self.voucher_categories().to_vec();

        for item in &mut self.items {
            item.freeze(&categories);
        }

        self.placeholder = Some(placeholder);
        self.frozen = true;
    }

    fn placeholder_totals(&self) -> PlaceholderTotals {
        self.placeholder
            .as_ref()
            .map(|placeholder| placeholder.totals)
            .unwrap_or_default()
    }

    /// Sum of line totals.
    pub fn sub_total(&self) -> Money {
        if self.frozen {
            return self.placeholder_totals().sub_total;
        }

        self.items.iter().map(BasketItem::total).sum()
    }

    /// Sum of line totals the voucher may discount.
    pub fn sub_total_discountable(&self) -> Money {
        let categories = self.voucher_categories();

        self.items
            .iter()
            .map(|item| item.total_discountable(categories))
            .sum()
    }

    /// Number of units.
    pub fn quantity(&self) -> u32 {
        if self.frozen {
            return self.placeholder_totals().quantity;
        }

        self.items.iter().map(BasketItem::quantity).sum()
    }

    fn voucher_discount(&self, delivery: Money, include_free_delivery: bool) -> Money {
        self.voucher.as_ref().map_or(Money::ZERO, |voucher| {
            voucher.discount_amount(
                self.sub_total_discountable(),
                delivery,
                Some(self.delivery_country()),
                include_free_delivery,
            )
        })
    }

    /// The delivery calculation for the current basket.
    pub fn delivery_quote(&self) -> DeliveryQuote {
        if self.frozen {
            let placeholder = self.placeholder.as_ref();

            return DeliveryQuote {
                option_id: placeholder
                    .and_then(|placeholder| placeholder.delivery_option_id)
                    .or(self.delivery_option_id),
                charge: self.placeholder_totals().delivery,
                is_quote_only: placeholder.is_some_and(|placeholder| placeholder.is_quote_only),
                free_delivery: placeholder.is_some_and(|placeholder| placeholder.free_delivery),
            };
        }

        let region = self.region();
        let options = self.ctx.catalogue.delivery_options();

        let Some(option) = delivery::select_option(&options, self.delivery_option_id, region)
        else {
            return DeliveryQuote::NONE;
        };

        let overrides = self
            .ctx
            .catalogue
            .product_delivery_options(option.id, &self.product_ids());

        let lines: Vec<DeliveryLine> = self.items.iter().map(BasketItem::delivery_line).collect();

        let conditions = DeliveryConditions {
            region,
            click_and_collect: self.click_and_collect,
            invoice: self.invoice,
            free_delivery_to: self.free_delivery_to,
            total_before_delivery: self.sub_total() - self.voucher_discount(Money::ZERO, false),
        };

        delivery::quote(&lines, option, &overrides, &conditions)
    }

    /// Delivery charge.
    pub fn delivery(&self) -> Money {
        self.delivery_quote().charge
    }

    /// Whether delivery is quoted separately.
    pub fn is_quote_only(&self) -> bool {
        self.delivery_quote().is_quote_only
    }

    /// Voucher discount, including free delivery.
    pub fn discount_value(&self) -> Money {
        if self.frozen {
            return self.placeholder_totals().discount;
        }

        self.voucher_discount(self.delivery(), true)
    }

    /// Voucher discount with free-delivery vouchers left out.
    pub fn discount_value_excluding_free_delivery(&self) -> Money {
        if self.frozen {
            let totals = self.placeholder_totals();

            return totals
                .discount_excluding_free_delivery
                .unwrap_or(totals.discount);
        }

        self.voucher_discount(Money::ZERO, false)
    }

    /// Sub-total less discount.
    pub fn total_before_delivery(&self) -> Money {
        self.sub_total() - self.discount_value()
    }

    /// Total before any override.
    pub fn calculated_total(&self) -> Money {
        self.total_before_delivery() + self.delivery()
    }

    /// Amount payable: the override when set, otherwise the calculated total.
    pub fn total(&self) -> Money {
        if self.frozen {
            return self.placeholder_totals().total;
        }

        self.custom_total.unwrap_or_else(|| self.calculated_total())
    }

    fn finance_lines(&self) -> Vec<FinanceLine> {
        self.items.iter().map(BasketItem::finance_line).collect()
    }

    fn finance_basket<'l>(&self, lines: &'l [FinanceLine]) -> FinanceBasket<'l> {
        FinanceBasket {
            enabled: self.ctx.config.finance_enabled,
            frozen: self.frozen,
            total: self.total(),
            lines,
        }
    }

    /// Finance options the basket qualifies for.
    pub fn finance_options(&self) -> Vec<FinanceOption> {
        let options = self.ctx.catalogue.finance_options();
        let lines = self.finance_lines();

        finance::options_for(&options, &self.finance_basket(&lines), FinanceFilter::default())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Whether any finance option is offered.
    pub fn is_available_for_loan(&self) -> bool {
        !self.finance_options().is_empty()
    }

    /// Smallest total at which finance would be offered.
    pub fn loan_threshold(&self) -> Option<Money> {
        let options = self.ctx.catalogue.finance_options();
        let lines = self.finance_lines();

        finance::loan_threshold(&options, &self.finance_basket(&lines))
    }

    /// How much more must be spent before finance is offered.
    pub fn remaining_loan_total(&self) -> Money {
        let options = self.ctx.catalogue.finance_options();
        let lines = self.finance_lines();

        finance::remaining_loan_total(&options, &self.finance_basket(&lines))
    }

    /// Messages to show with the basket.
    pub fn messages(&self) -> Vec<BasketMessage> {
        let currency = self.ctx.config.currency();
        let mut messages = Vec::new();

        if self.frozen {
            messages.push(BasketMessage::new(
                MessageKind::Frozen,
                MESSAGE_FROZEN_BASKET,
                &[],
            ));
        }

        if self.unable_to_restore {
            messages.push(BasketMessage::new(
                MessageKind::UnableToRestore,
                MESSAGE_UNABLE_TO_RESTORE,
                &[],
            ));
        }

        let pre_orders: Vec<&str> = self
            .items
            .iter()
            .filter(|item| item.is_pre_order())
            .map(BasketItem::title)
            .collect();

        if !pre_orders.is_empty() {
            let items = pre_orders.join(", ");

            messages.push(BasketMessage::new(
                MessageKind::PreOrder,
                MESSAGE_PRE_ORDER,
                &[("items", items.as_str())],
            ));
        }

        if self.frozen || !self.ctx.config.finance_enabled {
            return messages;
        }

        let selected = self.finance_option_id.and_then(|id| {
            self.ctx
                .catalogue
                .finance_options()
                .into_iter()
                .find(|option| option.id == id)
        });

        if let Some(option) = selected {
            messages.push(BasketMessage::new(
                MessageKind::FinanceSelected,
                MESSAGE_FINANCE_SELECTED,
                &[("finance_option", option.title.as_str())],
            ));
        } else if let Some(threshold) = self.loan_threshold() {
            let remaining = self.remaining_loan_total();

            if remaining.is_positive() {
                let remaining = remaining.format(currency);

                messages.push(BasketMessage::new(
                    MessageKind::FinanceUnavailable,
                    MESSAGE_FINANCE_UNAVAILABLE,
                    &[("remaining", remaining.as_str())],
                ));
            } else {
                let threshold = threshold.format(currency);

                messages.push(BasketMessage::new(
                    MessageKind::FinanceAvailable,
                    MESSAGE_FINANCE_AVAILABLE,
                    &[("threshold", threshold.as_str())],
                ));
            }
        }

        messages
    }

    fn snapshot(&self) -> BasketPlaceholder {
        if self.frozen {
            return self.placeholder.clone().unwrap_or_default();
        }

        let quote = self.delivery_quote();
        let discount = self.voucher_discount(quote.charge, true);

        BasketPlaceholder {
            totals: PlaceholderTotals {
                sub_total: self.sub_total(),
                delivery: quote.charge,
                discount,
                discount_excluding_free_delivery: Some(self.voucher_discount(Money::ZERO, false)),
                total: self.total(),
                quantity: self.quantity(),
            },
            delivery_option_id: quote.option_id,
            is_quote_only: quote.is_quote_only,
            free_delivery: quote.free_delivery,
        }
    }

    /// The stored form of the basket.
    ///
    /// Order records (`for_session == false`) and frozen baskets carry snapshots of the basket
    /// and every line. Session records carry the frozen and restore flags.
    pub fn save_to_dict(&self, for_session: bool) -> BasketDict {
        let sealed = !for_session || self.frozen;
        let categories = self.voucher_categories();

        BasketDict {
            items: self
                .items
                .iter()
                .map(|item| item.to_dict(sealed, categories))
                .collect(),
            voucher: self.voucher_code.clone(),
            billing_address: self.billing_address.clone(),
            delivery_address: self.delivery_address.clone(),
            finance_option_id: self.finance_option_id,
            loan_deposit: self.loan_deposit,
            newsletter: self.checkout.newsletter,
            signup: self.checkout.signup,
            update_profile: self.checkout.update_profile,
            terms: self.checkout.terms,
            special_req: self.checkout.special_req.clone(),
            survey: self.checkout.survey.clone(),
            delivery_option: self.delivery_option_id,
            click_and_collect: self.click_and_collect,
            free_delivery_to: self.free_delivery_to,
            invoice: self.invoice,
            invoice_number: self.invoice_number.clone(),
            default_delivery: self.default_delivery,
            can_edit_billing_address: self.can_edit_billing_address,
            can_edit_delivery_address: self.can_edit_delivery_address,
            custom_total: self.custom_total,
            is_frozen: for_session.then_some(self.frozen),
            unable_to_restore: for_session.then_some(self.unable_to_restore),
            placeholder: sealed.then(|| self.snapshot()),
        }
    }

    fn from_fields(ctx: BasketContext<'c>, dict: &BasketDict) -> Self {
        Basket {
            billing_address: dict.billing_address.clone(),
            delivery_address: dict.delivery_address.clone(),
            voucher_code: dict.voucher.clone(),
            delivery_option_id: dict.delivery_option,
            finance_option_id: dict.finance_option_id,
            loan_deposit: dict.loan_deposit,
            checkout: CheckoutOptions {
                newsletter: dict.newsletter,
                signup: dict.signup,
                update_profile: dict.update_profile,
                terms: dict.terms,
                special_req: dict.special_req.clone(),
                survey: dict.survey.clone(),
            },
            click_and_collect: dict.click_and_collect,
            free_delivery_to: dict.free_delivery_to,
            invoice: dict.invoice,
            invoice_number: dict.invoice_number.clone(),
            default_delivery: dict.default_delivery,
            can_edit_billing_address: dict.can_edit_billing_address,
            can_edit_delivery_address: dict.can_edit_delivery_address,
            custom_total: dict.custom_total,
            ..Basket::new(ctx)
        }
    }

    /// Rebuild a basket from its stored form.
    ///
    /// Lines are rebound with one catalogue query per entity kind. What happens to references
    /// that no longer resolve depends on `mode`: a session drops them, an order seals the
    /// basket as unable to restore so its snapshot keeps answering.
    pub fn load_from_dict(ctx: BasketContext<'c>, dict: BasketDict, mode: RestoreMode) -> Self {
        let replay = match mode {
            RestoreMode::Replay => true,
            RestoreMode::Session => dict.is_frozen.unwrap_or(false),
            RestoreMode::Order => false,
        };

        if replay {
            return Self::replay(ctx, dict, false);
        }

        let from_order = mode == RestoreMode::Order;
        let mut basket = Self::from_fields(ctx, &dict);
        let mut broken = false;

        let lookup = lookup_for(&ctx, &dict.items);

        for entry in &dict.items {
            match BasketItem::restore(entry, &lookup) {
                Some(item) => basket.push_restored(item),
                None => {
                    warn!(product_id = %entry.product_id, "basket line no longer resolves");
                    broken = true;
                }
            }
        }

        if let Some(code) = dict.voucher.as_deref() {
            basket.voucher_code = None;

            if !basket.bind_voucher(code, from_order) {
                warn!(voucher = code, "voucher could not be restored");
                broken = true;
            }
        }

        if let Some(id) = dict.delivery_option {
            let restored = ctx
                .catalogue
                .delivery_option(id)
                .is_some_and(|option| from_order || option.enabled);

            if !restored {
                warn!(delivery_option_id = %id, "delivery option could not be restored");
                basket.delivery_option_id = None;
                broken = true;
            }
        }

        if let Some(id) = dict.finance_option_id {
            let restored = ctx
                .catalogue
                .finance_options()
                .iter()
                .any(|option| option.id == id && (from_order || option.enabled));

            if !restored {
                warn!(finance_option_id = %id, "finance option could not be restored");
                basket.finance_option_id = None;
                broken = true;
            }
        }

        if broken && from_order {
            return Self::replay(ctx, dict, true);
        }

        basket
    }

    fn push_restored(&mut self, item: BasketItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|existing| existing.matches_hash(item.hash()))
        {
            existing.increase_quantity_by(i64::from(item.quantity()));
        } else {
            self.items.push(item);
        }
    }

    fn replay(ctx: BasketContext<'c>, dict: BasketDict, unable_to_restore: bool) -> Self {
        let mut basket = Self::from_fields(ctx, &dict);
        let mut missing = unable_to_restore || dict.unable_to_restore.unwrap_or(false);

        let lookup = lookup_for(&ctx, &dict.items);

        missing |= dict
            .items
            .iter()
            .any(|entry| BasketItem::restore(entry, &lookup).is_none());

        if let Some(code) = dict.voucher.as_deref() {
            missing |= !basket.bind_voucher(code, true);
            basket.voucher_code = Some(code.to_string());
        }

        if let Some(id) = dict.delivery_option {
            missing |= ctx.catalogue.delivery_option(id).is_none();
        }

        if let Some(id) = dict.finance_option_id {
            missing |= !ctx
                .catalogue
                .finance_options()
                .iter()
                .any(|option| option.id == id);
        }

        if missing {
            warn!("sealed basket references missing catalogue entries");
        }

        basket.items = dict.items.into_iter().map(BasketItem::frozen).collect();
        basket.placeholder = Some(dict.placeholder.unwrap_or_default());
        basket.unable_to_restore = missing;
        basket.frozen = true;

        basket
    }

    /// Restore the basket kept in a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a stored basket.
    pub fn from_session(ctx: BasketContext<'c>, value: Value) -> Result<Self, BasketRecordError> {
        let dict = BasketRecord::from_json(value)?.into_dict();

        Ok(Self::load_from_dict(ctx, dict, RestoreMode::Session))
    }

    /// The value to keep in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_session(&self) -> Result<Value, BasketRecordError> {
        self.save_to_dict(true).to_json()
    }

    /// Replay the basket an order was sealed with. The result is always frozen.
    ///
    /// # Errors
    ///
    /// Returns an error if the order's stored basket does not decode.
    pub fn restore_from_order(
        ctx: BasketContext<'c>,
        order: &Order,
    ) -> Result<Self, BasketRecordError> {
        let dict = BasketRecord::from_json(order.stored_basket().clone())?.into_dict();

        Ok(Self::load_from_dict(ctx, dict, RestoreMode::Replay))
    }

    /// Rebuild a live basket from an order that has not been frozen, e.g. to resume checkout.
    /// Returns `None` for frozen orders. The result is frozen anyway if the catalogue no longer
    /// holds everything the order references.
    ///
    /// # Errors
    ///
    /// Returns an error if the order's stored basket does not decode.
    pub fn thaw_from_order(
        ctx: BasketContext<'c>,
        order: &Order,
    ) -> Result<Option<Self>, BasketRecordError> {
        if order.status.is_frozen() {
            return Ok(None);
        }

        Self::rebuild_from_order(ctx, order).map(Some)
    }

    /// Rebind an order's basket to the current catalogue whatever the order's status, e.g. to
    /// copy it into a new order. Lines that no longer resolve leave the result frozen and
    /// unable to restore.
    ///
    /// # Errors
    ///
    /// Returns an error if the order's stored basket does not decode.
    pub fn rebuild_from_order(
        ctx: BasketContext<'c>,
        order: &Order,
    ) -> Result<Self, BasketRecordError> {
        let mut dict = BasketRecord::from_json(order.stored_basket().clone())?.into_dict();
        dict.is_frozen = None;

        Ok(Self::load_from_dict(ctx, dict, RestoreMode::Order))
    }

    /// The basket in the legacy shape used by admin and analytics views.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn as_legacy_dict(&self) -> Result<Value, BasketRecordError> {
        Ok(serde_json::to_value(LegacyBasket::from_basket(self))?)
    }
}

fn lookup_for(ctx: &BasketContext<'_>, items: &[ItemDict]) -> LineLookup {
    let mut product_ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let mut option_ids: Vec<VarietyOptionId> = items
        .iter()
        .flat_map(|item| item.variety_option_ids.iter().copied())
        .collect();
    option_ids.sort_unstable();
    option_ids.dedup();

    LineLookup::load(ctx.catalogue, &product_ids, &option_ids)
}
