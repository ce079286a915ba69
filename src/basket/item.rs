//! Basket Lines
//!
//! A line is either live, bound to catalogue records and priced from them, or frozen, answering
//! every query from the snapshot it was sealed with.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    basket::{
        placeholder::{LinePlaceholder, PlaceholderSku, PlaceholderVariety},
        serialise::ItemDict,
    },
    catalogue::{
        Catalogue,
        products::{CategoryId, Product, ProductId, StockMode},
        varieties::{ProductSku, ResolvedOption, VarietyAssignment, VarietyOptionId},
    },
    delivery::DeliveryLine,
    finance::FinanceLine,
    fingerprint::line_fingerprint,
    money::Money,
    skus,
};

/// Largest quantity a line may carry.
pub const MAX_QUANTITY: u32 = 9999;

/// Variety option ids selected on a line.
pub type OptionIds = SmallVec<[VarietyOptionId; 4]>;

/// Clamp a requested quantity to `0..=MAX_QUANTITY`.
pub fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.clamp(0, i64::from(MAX_QUANTITY))).unwrap_or(0)
}

/// A request to add a product to a basket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    pub(crate) product_id: ProductId,
    pub(crate) option_ids: OptionIds,
    pub(crate) quantity: i64,
    pub(crate) custom: BTreeMap<String, String>,
    pub(crate) labels: BTreeMap<VarietyOptionId, String>,
}

impl LineRequest {
    /// One unit of `product_id` with no options.
    pub fn new(product_id: ProductId) -> Self {
        LineRequest {
            product_id,
            option_ids: OptionIds::new(),
            quantity: 1,
            custom: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }

    /// Select variety options.
    #[must_use]
    pub fn options(mut self, ids: impl IntoIterator<Item = VarietyOptionId>) -> Self {
        self.option_ids.extend(ids);
        self
    }

    /// Set the quantity.
    #[must_use]
    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the quantity from submitted text. Anything that is not a number becomes zero, which
    /// the basket refuses; fractions are truncated.
    #[must_use]
    pub fn quantity_from_str(self, raw: &str) -> Self {
        let quantity = raw
            .trim()
            .parse::<Decimal>()
            .ok()
            .and_then(|value| value.trunc().to_i64())
            .unwrap_or(0);

        self.quantity(quantity)
    }

    /// Attach a custom property.
    #[must_use]
    pub fn custom(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Attach a free-text label to a selected option.
    #[must_use]
    pub fn label(mut self, option: VarietyOptionId, text: impl Into<String>) -> Self {
        self.labels.insert(option, text.into());
        self
    }
}

/// Catalogue records needed to bind a batch of lines, fetched with one query per kind.
#[derive(Debug, Default)]
pub(crate) struct LineLookup {
    products: FxHashMap<ProductId, Product>,
    options: FxHashMap<VarietyOptionId, ResolvedOption>,
    assignments: Vec<VarietyAssignment>,
    skus: Vec<ProductSku>,
}

impl LineLookup {
    pub(crate) fn load(
        catalogue: &dyn Catalogue,
        product_ids: &[ProductId],
        option_ids: &[VarietyOptionId],
    ) -> Self {
        let products = catalogue.products(product_ids);
        let found: Vec<ProductId> = products.keys().copied().collect();

        LineLookup {
            options: catalogue.variety_options(option_ids),
            assignments: catalogue.assignments(&found),
            skus: catalogue.skus(&found),
            products,
        }
    }

    pub(crate) fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    /// Whether `option` is assigned to `product`.
    pub(crate) fn is_assigned(&self, product: ProductId, option: VarietyOptionId) -> bool {
        self.assignments
            .iter()
            .any(|entry| entry.product_id == product && entry.option_id == option)
    }

    /// The options with the given ids, or `None` if any is missing.
    pub(crate) fn options(&self, ids: &[VarietyOptionId]) -> Option<Vec<ResolvedOption>> {
        ids.iter().map(|id| self.options.get(id).cloned()).collect()
    }

    pub(crate) fn bind(
        &self,
        product: &Product,
        options: Vec<ResolvedOption>,
        quantity: u32,
        custom: BTreeMap<String, String>,
        labels: BTreeMap<VarietyOptionId, String>,
    ) -> BasketItem {
        let skus: Vec<ProductSku> = self
            .skus
            .iter()
            .filter(|sku| sku.product_id == product.id)
            .cloned()
            .collect();

        BasketItem::bind(
            product.clone(),
            options,
            &self.assignments,
            &skus,
            quantity,
            custom,
            labels,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LiveLine {
    product: Product,
    options: Vec<ResolvedOption>,
    offsets: FxHashMap<VarietyOptionId, Money>,
    sku: Option<ProductSku>,
}

#[derive(Debug, Clone, PartialEq)]
struct FrozenLine {
    placeholder: LinePlaceholder,
    sku: Option<PlaceholderSku>,
}

#[derive(Debug, Clone, PartialEq)]
enum LineSource {
    Live(Box<LiveLine>),
    Frozen(Box<FrozenLine>),
}

/// One basket line.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketItem {
    product_id: ProductId,
    option_ids: OptionIds,
    quantity: u32,
    custom: BTreeMap<String, String>,
    labels: BTreeMap<VarietyOptionId, String>,
    hash: String,
    processed: bool,
    source: LineSource,
}

impl BasketItem {
    /// Bind a live line. Labels on options that cannot carry one are dropped.
    pub fn bind(
        product: Product,
        options: Vec<ResolvedOption>,
        assignments: &[VarietyAssignment],
        skus: &[ProductSku],
        quantity: u32,
        custom: BTreeMap<String, String>,
        mut labels: BTreeMap<VarietyOptionId, String>,
    ) -> Self {
        labels.retain(|id, _| {
            options
                .iter()
                .any(|option| option.id() == *id && option.option.text_label)
        });

        let offsets = assignments
            .iter()
            .filter(|entry| entry.product_id == product.id)
            .filter(|entry| options.iter().any(|option| option.id() == entry.option_id))
            .map(|entry| (entry.option_id, entry.price))
            .collect();

        let sku = skus::resolve(skus, &options).cloned();

        let hash = line_fingerprint(
            &product,
            &options,
            custom.iter().map(|(key, value)| (key.as_str(), value.as_str())),
            labels.iter().map(|(id, text)| (*id, text.as_str())),
        );

        BasketItem {
            product_id: product.id,
            option_ids: options.iter().map(ResolvedOption::id).collect(),
            quantity: quantity.clamp(1, MAX_QUANTITY),
            custom,
            labels,
            hash,
            processed: false,
            source: LineSource::Live(Box::new(LiveLine {
                product,
                options,
                offsets,
                sku,
            })),
        }
    }

    /// Rebuild a frozen line from its stored record.
    pub fn frozen(dict: ItemDict) -> Self {
        let placeholder = dict.placeholder.unwrap_or_default();

        let sku = dict
            .sku_code
            .map(|code| PlaceholderSku {
                id: dict.sku_id,
                code,
                barcode: dict.sku_barcode,
                price: placeholder.sku.as_ref().and_then(|sku| sku.price),
            })
            .or_else(|| placeholder.sku.clone());

        BasketItem {
            product_id: dict.product_id,
            option_ids: dict.variety_option_ids.into_iter().collect(),
            quantity: dict.quantity.min(MAX_QUANTITY),
            custom: dict.custom,
            labels: dict.labels,
            hash: dict.hash,
            processed: dict.processed,
            source: LineSource::Frozen(Box::new(FrozenLine { placeholder, sku })),
        }
    }

    /// Rebind a stored line to live catalogue data. Returns `None` when the product or one of
    /// the selected options no longer exists.
    pub(crate) fn restore(dict: &ItemDict, lookup: &LineLookup) -> Option<Self> {
        let product = lookup.product(dict.product_id)?;
        let options = lookup.options(&dict.variety_option_ids)?;

        let mut item = lookup.bind(
            product,
            options,
            dict.quantity,
            dict.custom.clone(),
            dict.labels.clone(),
        );

        item.processed = dict.processed;

        Some(item)
    }

    /// Seal the line with its current values.
    pub fn freeze(&mut self, categories: &[CategoryId]) {
        if self.is_frozen() {
            return;
        }

        let placeholder = self.placeholder(categories);
        let sku = placeholder.sku.clone();

        self.source = LineSource::Frozen(Box::new(FrozenLine { placeholder, sku }));
    }

    /// Whether the line replays from a snapshot.
    pub fn is_frozen(&self) -> bool {
        matches!(self.source, LineSource::Frozen(_))
    }

    /// Line fingerprint
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Whether `hash` identifies this line.
    pub fn matches_hash(&self, hash: &str) -> bool {
        self.hash == hash
    }

    /// Product id
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// The bound product, for live lines.
    pub fn product(&self) -> Option<&Product> {
        match &self.source {
            LineSource::Live(line) => Some(&line.product),
            LineSource::Frozen(_) => None,
        }
    }

    /// How the product's stock is tracked.
    pub fn stock_mode(&self) -> StockMode {
        match &self.source {
            LineSource::Live(line) => line.product.stock,
            LineSource::Frozen(line) => line.placeholder.stock,
        }
    }

    /// Selected variety option ids, in selection order.
    pub fn option_ids(&self) -> &[VarietyOptionId] {
        &self.option_ids
    }

    /// Custom properties
    pub fn custom(&self) -> &BTreeMap<String, String> {
        &self.custom
    }

    /// Labels attached to selected options
    pub fn labels(&self) -> &BTreeMap<VarietyOptionId, String> {
        &self.labels
    }

    /// Units on this line
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        if !self.is_frozen() {
            self.quantity = quantity.clamp(1, MAX_QUANTITY);
        }
    }

    /// Add `amount` units. Non-positive amounts are ignored.
    pub fn increase_quantity_by(&mut self, amount: i64) {
        if amount <= 0 || self.is_frozen() {
            return;
        }

        let quantity = i64::from(self.quantity).saturating_add(amount);

        self.quantity = clamp_quantity(quantity).max(1);
    }

    /// Backend bookkeeping flag.
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Mark the line as handled by the backend.
    pub fn set_processed(&mut self, processed: bool) {
        self.processed = processed;
    }

    /// Product title
    pub fn title(&self) -> &str {
        match &self.source {
            LineSource::Live(line) => &line.product.title,
            LineSource::Frozen(line) => &line.placeholder.title,
        }
    }

    /// Product category, for live lines.
    pub fn category(&self) -> Option<CategoryId> {
        self.product().and_then(|product| product.category)
    }

    /// The matched SKU.
    pub fn sku(&self) -> Option<PlaceholderSku> {
        match &self.source {
            LineSource::Live(line) => line.sku.as_ref().map(|sku| PlaceholderSku {
                id: Some(sku.id),
                code: sku.code.clone(),
                barcode: sku.barcode.clone(),
                price: sku.price,
            }),
            LineSource::Frozen(line) => line.sku.clone(),
        }
    }

    /// Product base price.
    pub fn product_price(&self) -> Money {
        match &self.source {
            LineSource::Live(line) => line.product.price.unwrap_or(Money::ZERO),
            LineSource::Frozen(line) => line.placeholder.product_price,
        }
    }

    /// Per-unit surcharge of the selected options outside the SKU matrix.
    pub fn total_varieties(&self) -> Money {
        match &self.source {
            LineSource::Live(line) => line
                .options
                .iter()
                .filter(|option| !option.is_sku())
                .map(|option| {
                    line.offsets
                        .get(&option.id())
                        .copied()
                        .or(option.option.offset)
                        .unwrap_or(Money::ZERO)
                })
                .sum(),
            LineSource::Frozen(line) => line.placeholder.total_varieties,
        }
    }

    /// Per-unit price ignoring deposits: the SKU price when one matched, otherwise the product
    /// price, plus option surcharges.
    pub fn total_product_without_deposit(&self) -> Money {
        match &self.source {
            LineSource::Live(line) => {
                let base = line
                    .sku
                    .as_ref()
                    .and_then(|sku| sku.price)
                    .unwrap_or_else(|| self.product_price());

                base + self.total_varieties()
            }
            LineSource::Frozen(line) => line.placeholder.total_product_without_deposit,
        }
    }

    /// Per-unit charge.
    pub fn total_product(&self) -> Money {
        match &self.source {
            LineSource::Live(line) if line.product.deposit_only => line.product.deposit,
            LineSource::Live(_) => self.total_product_without_deposit(),
            LineSource::Frozen(line) => line.placeholder.total_product,
        }
    }

    /// Line total.
    pub fn total(&self) -> Money {
        match &self.source {
            LineSource::Live(_) => self.total_product().times(self.quantity),
            LineSource::Frozen(line) => line.placeholder.total,
        }
    }

    /// Line total ignoring deposits.
    pub fn total_without_deposit(&self) -> Money {
        match &self.source {
            LineSource::Live(_) => self.total_product_without_deposit().times(self.quantity),
            LineSource::Frozen(line) => line.placeholder.total_without_deposit,
        }
    }

    /// The part of the line total a voucher restricted to `categories` may discount. An empty
    /// slice means the voucher is unrestricted.
    pub fn total_discountable(&self, categories: &[CategoryId]) -> Money {
        match &self.source {
            LineSource::Live(line) => {
                let product = &line.product;

                let excluded = product.deposit_only
                    || product.exempt_from_discount
                    || (!categories.is_empty()
                        && !product
                            .category
                            .is_some_and(|category| categories.contains(&category)));

                if excluded { Money::ZERO } else { self.total() }
            }
            LineSource::Frozen(line) => line.placeholder.total_discountable,
        }
    }

    /// Deposit charged per unit for deposit-only products.
    pub fn deposit(&self) -> Money {
        match &self.source {
            LineSource::Live(line) => line.product.deposit,
            LineSource::Frozen(line) => line.placeholder.deposit,
        }
    }

    /// Only a deposit is charged
    pub fn is_deposit_only(&self) -> bool {
        match &self.source {
            LineSource::Live(line) => line.product.deposit_only,
            LineSource::Frozen(line) => line.placeholder.deposit_only,
        }
    }

    /// Pre-order product
    pub fn is_pre_order(&self) -> bool {
        match &self.source {
            LineSource::Live(line) => line.product.pre_order,
            LineSource::Frozen(line) => line.placeholder.is_pre_order,
        }
    }

    /// Excluded from finance
    pub fn is_loan_exempt(&self) -> bool {
        match &self.source {
            LineSource::Live(line) => line.product.loan_exempt,
            LineSource::Frozen(line) => line.placeholder.is_loan_exempt,
        }
    }

    /// Blocks the free delivery threshold
    pub fn is_exempt_from_free_delivery(&self) -> bool {
        match &self.source {
            LineSource::Live(line) => line.product.exempt_from_free_delivery,
            LineSource::Frozen(line) => line.placeholder.is_exempt_from_free_delivery,
        }
    }

    /// Never discounted
    pub fn is_exempt_from_discount(&self) -> bool {
        match &self.source {
            LineSource::Live(line) => line.product.exempt_from_discount,
            LineSource::Frozen(line) => line.placeholder.is_exempt_from_discount,
        }
    }

    /// Cannot be returned
    pub fn is_non_returnable(&self) -> bool {
        match &self.source {
            LineSource::Live(line) => line.product.non_returnable,
            LineSource::Frozen(line) => line.placeholder.is_non_returnable,
        }
    }

    /// Store collection only
    pub fn is_collection_only(&self) -> bool {
        match &self.source {
            LineSource::Live(line) => line.product.collection_only,
            LineSource::Frozen(line) => line.placeholder.is_collection_only,
        }
    }

    /// "Variety: Option" descriptions of the selected options.
    pub fn variety_descriptions(&self) -> Vec<String> {
        match &self.source {
            LineSource::Live(line) => line
                .options
                .iter()
                .map(|option| {
                    option.describe(self.labels.get(&option.id()).map(String::as_str))
                })
                .collect(),
            LineSource::Frozen(line) => line.placeholder.variety_data.clone(),
        }
    }

    /// Product page URL preselecting the line's options.
    pub fn url(&self) -> String {
        match &self.source {
            LineSource::Live(line) => line.product.absolute_url_with_varieties(&self.option_ids),
            LineSource::Frozen(line) => line.placeholder.get_absolute_url_with_varieties.clone(),
        }
    }

    pub(crate) fn delivery_line(&self) -> DeliveryLine {
        DeliveryLine {
            product_id: self.product_id,
            deposit_only: self.is_deposit_only(),
            exempt_from_free_delivery: self.is_exempt_from_free_delivery(),
        }
    }

    pub(crate) fn finance_line(&self) -> FinanceLine {
        FinanceLine {
            product_id: self.product_id,
            loan_exempt: self.is_loan_exempt(),
            pre_order: self.is_pre_order(),
            deposit: self.deposit(),
            finance_options: self
                .product()
                .map(|product| product.finance_options.clone())
                .unwrap_or_default(),
        }
    }

    /// The snapshot this line would be sealed with.
    pub fn placeholder(&self, categories: &[CategoryId]) -> LinePlaceholder {
        let line = match &self.source {
            LineSource::Live(line) => line,
            LineSource::Frozen(line) => return line.placeholder.clone(),
        };

        let product = &line.product;
        let url = product.absolute_url();

        LinePlaceholder {
            title: product.title.clone(),
            excerpt: product.excerpt.clone(),
            image_id: product.image.as_ref().map(|image| image.id),
            variety_data: self.variety_descriptions(),
            product_price: self.product_price(),
            total_product: self.total_product(),
            total_varieties: self.total_varieties(),
            total_product_without_deposit: self.total_product_without_deposit(),
            total: self.total(),
            total_without_deposit: self.total_without_deposit(),
            total_discountable: self.total_discountable(categories),
            quantity: self.quantity,
            deposit_only: product.deposit_only,
            deposit: product.deposit,
            barcode: product.barcode.clone(),
            is_pre_order: product.pre_order,
            is_loan_exempt: product.loan_exempt,
            is_exempt_from_free_delivery: product.exempt_from_free_delivery,
            is_exempt_from_discount: product.exempt_from_discount,
            is_non_returnable: product.non_returnable,
            is_collection_only: product.collection_only,
            stock: product.stock,
            part_number: product.part_number.clone(),
            icon_url: product.image.as_ref().map(|image| image.url.clone()),
            get_absolute_url: url.clone(),
            url,
            get_absolute_url_with_varieties: self.url(),
            varieties: line
                .options
                .iter()
                .map(|option| PlaceholderVariety {
                    id: Some(option.id()),
                    variety_id: Some(option.variety.id),
                    variety: option.variety.title.clone(),
                    title: option.option.title.clone(),
                    label: self.labels.get(&option.id()).cloned(),
                })
                .collect(),
            sku: self.sku(),
            custom_properties: self.custom.clone(),
            image_attribute_url: None,
        }
    }

    /// The stored form of this line. Frozen lines always carry their snapshot.
    pub fn to_dict(&self, with_placeholder: bool, categories: &[CategoryId]) -> ItemDict {
        let sku = self.sku();

        ItemDict {
            product_id: self.product_id,
            processed: self.processed,
            sku_id: sku.as_ref().and_then(|sku| sku.id),
            sku_code: sku.as_ref().map(|sku| sku.code.clone()),
            sku_barcode: sku.and_then(|sku| sku.barcode),
            custom: self.custom.clone(),
            labels: self.labels.clone(),
            quantity: self.quantity,
            hash: self.hash.clone(),
            variety_option_ids: self.option_ids.to_vec(),
            placeholder: (with_placeholder || self.is_frozen())
                .then(|| self.placeholder(categories)),
        }
    }
}
