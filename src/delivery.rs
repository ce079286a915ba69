//! Delivery
//!
//! Region-dependent delivery charges. A basket inherits the most expensive shipping class of
//! any of its lines, after which quote-only, zero-charge and free-delivery-threshold rules are
//! applied in that order.

use rustc_hash::FxHashMap;

use crate::{catalogue::products::ProductId, ids::TypedId, money::Money};

/// Delivery option id
pub type DeliveryOptionId = TypedId<DeliveryOption>;

/// Destination region of a delivery address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// United Kingdom
    Uk,

    /// EU member states
    Eu,

    /// Everywhere else
    World,
}

impl Region {
    /// Maps an ISO country code to its region.
    pub fn from_country<S: AsRef<str>>(iso: &str, eu_countries: &[S]) -> Self {
        let iso = iso.trim();

        if iso.eq_ignore_ascii_case("GB") {
            Region::Uk
        } else if eu_countries
            .iter()
            .any(|member| member.as_ref().eq_ignore_ascii_case(iso))
        {
            Region::Eu
        } else {
            Region::World
        }
    }
}

/// A delivery method with per-region default charges.
#[expect(clippy::struct_excessive_bools, reason = "per-region delivery and quote flags")]
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOption {
    /// Option id
    pub id: DeliveryOptionId,

    /// Display title
    pub title: String,

    /// Disabled options are never offered.
    pub enabled: bool,

    /// Default UK charge
    pub uk_def: Option<Money>,

    /// Default EU charge
    pub eu_def: Option<Money>,

    /// Default rest-of-world charge
    pub world_def: Option<Money>,

    /// Delivers to the UK
    pub deliver_uk: bool,

    /// Delivers to the EU
    pub deliver_eu: bool,

    /// Delivers to the rest of the world
    pub deliver_world: bool,

    /// Charge for the UK is quoted separately
    pub quote_uk: bool,

    /// Charge for the EU is quoted separately
    pub quote_eu: bool,

    /// Charge for the rest of the world is quoted separately
    pub quote_world: bool,

    /// Whether UK orders above the threshold ship free.
    pub free_delivery: bool,

    /// Threshold for free UK delivery.
    pub free_delivery_threshold: Option<Money>,
}

impl DeliveryOption {
    /// Creates an enabled option that only delivers to the UK at `uk_def`.
    #[must_use]
    pub fn new(id: DeliveryOptionId, title: impl Into<String>, uk_def: Money) -> Self {
        DeliveryOption {
            id,
            title: title.into(),
            enabled: true,
            uk_def: Some(uk_def),
            eu_def: None,
            world_def: None,
            deliver_uk: true,
            deliver_eu: false,
            deliver_world: false,
            quote_uk: false,
            quote_eu: false,
            quote_world: false,
            free_delivery: false,
            free_delivery_threshold: None,
        }
    }

    /// Whether the option delivers to `region`.
    pub fn delivers_to(&self, region: Region) -> bool {
        match region {
            Region::Uk => self.deliver_uk,
            Region::Eu => self.deliver_eu,
            Region::World => self.deliver_world,
        }
    }

    /// Whether the charge for `region` is quoted separately.
    pub fn is_quote_only(&self, region: Region) -> bool {
        match region {
            Region::Uk => self.quote_uk,
            Region::Eu => self.quote_eu,
            Region::World => self.quote_world,
        }
    }

    /// Whether the option can be offered for `region` at all.
    pub fn is_deliverable(&self, region: Region) -> bool {
        self.enabled && (self.delivers_to(region) || self.is_quote_only(region))
    }

    /// The option's default charge for `region`.
    pub fn default_charge(&self, region: Region) -> Option<Money> {
        match region {
            Region::Uk => self.uk_def,
            Region::Eu => self.eu_def,
            Region::World => self.world_def,
        }
    }
}

/// A per-product override of a delivery option's regional charges.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDeliveryOption {
    /// Product
    pub product_id: ProductId,

    /// Delivery option
    pub option_id: DeliveryOptionId,

    /// UK charge override
    pub uk: Option<Money>,

    /// EU charge override
    pub eu: Option<Money>,

    /// Rest-of-world charge override
    pub world: Option<Money>,
}

impl ProductDeliveryOption {
    /// The override for `region`, if set.
    pub fn charge(&self, region: Region) -> Option<Money> {
        match region {
            Region::Uk => self.uk,
            Region::Eu => self.eu,
            Region::World => self.world,
        }
    }
}

/// What the calculator needs to know about a basket line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryLine {
    /// Product on the line
    pub product_id: ProductId,

    /// Line only charges a deposit
    pub deposit_only: bool,

    /// Line blocks the free delivery threshold
    pub exempt_from_free_delivery: bool,
}

/// Basket-level conditions affecting the charge.
#[expect(clippy::struct_excessive_bools, reason = "independent basket conditions")]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryConditions {
    /// Destination region
    pub region: Region,

    /// Customer collects in store
    pub click_and_collect: bool,

    /// Invoice order, delivery is settled separately
    pub invoice: bool,

    /// The delivery address is flagged for free delivery
    pub free_delivery_to: bool,

    /// Total before delivery with free-delivery vouchers left out.
    pub total_before_delivery: Money,
}

/// The outcome of a delivery calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryQuote {
    /// Option the quote was computed for
    pub option_id: Option<DeliveryOptionId>,

    /// Charge to add to the basket
    pub charge: Money,

    /// The vendor quotes delivery separately
    pub is_quote_only: bool,

    /// The free delivery threshold was met
    pub free_delivery: bool,
}

impl DeliveryQuote {
    /// Quote used when no option can deliver the basket.
    pub const NONE: DeliveryQuote = DeliveryQuote {
        option_id: None,
        charge: Money::ZERO,
        is_quote_only: false,
        free_delivery: false,
    };
}

/// Picks the option to price with: the selected one when it can deliver to `region`, otherwise
/// the first enabled deliverable option in catalogue order.
pub fn select_option<'a>(
    options: &'a [DeliveryOption],
    selected: Option<DeliveryOptionId>,
    region: Region,
) -> Option<&'a DeliveryOption> {
    let selected = selected.and_then(|id| {
        options
            .iter()
            .find(|option| option.id == id && option.is_deliverable(region))
    });

    selected.or_else(|| options.iter().find(|option| option.is_deliverable(region)))
}

/// Computes the delivery charge for a set of lines using `option`.
pub fn quote(
    lines: &[DeliveryLine],
    option: &DeliveryOption,
    overrides: &[ProductDeliveryOption],
    conditions: &DeliveryConditions,
) -> DeliveryQuote {
    let region = conditions.region;

    let mut quote = DeliveryQuote {
        option_id: Some(option.id),
        charge: Money::ZERO,
        is_quote_only: false,
        free_delivery: false,
    };

    if option.is_quote_only(region) {
        quote.is_quote_only = true;
        return quote;
    }

    let all_deposit_only = lines.iter().all(|line| line.deposit_only);

    if conditions.click_and_collect
        || conditions.invoice
        || conditions.free_delivery_to
        || all_deposit_only
    {
        return quote;
    }

    let threshold_met = region == Region::Uk
        && option.free_delivery
        && option
            .free_delivery_threshold
            .is_some_and(|threshold| conditions.total_before_delivery >= threshold)
        && !lines.iter().any(|line| line.exempt_from_free_delivery);

    if threshold_met {
        quote.free_delivery = true;
        return quote;
    }

    quote.charge = regional_charge(lines, option, overrides, region);
    quote
}

/// The most expensive per-line charge for `region`.
fn regional_charge(
    lines: &[DeliveryLine],
    option: &DeliveryOption,
    overrides: &[ProductDeliveryOption],
    region: Region,
) -> Money {
    let overrides: FxHashMap<ProductId, &ProductDeliveryOption> = overrides
        .iter()
        .filter(|entry| entry.option_id == option.id)
        .map(|entry| (entry.product_id, entry))
        .collect();

    let fallback = option.default_charge(region).unwrap_or(Money::ZERO);

    lines
        .iter()
        .map(|line| {
            overrides
                .get(&line.product_id)
                .and_then(|entry| entry.charge(region))
                .unwrap_or(fallback)
        })
        .fold(Money::ZERO, Money::max)
}
