//! Fixtures
//!
//! YAML catalogues and baskets for tests and demos. A fixture set `name` is read from
//! `<base>/catalogues/<name>.yml` and, when present, `<base>/baskets/<name>.yml`.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::{
    basket::{Basket, LineRequest},
    catalogue::{
        MemoryCatalogue,
        products::{Product, ProductId},
        varieties::{VarietyId, VarietyOptionId},
    },
    context::BasketContext,
    delivery::{DeliveryOption, DeliveryOptionId},
    finance::FinanceOption,
    fixtures::{baskets::BasketFixture, catalogue::CatalogueFixture},
    vouchers::Voucher,
};

pub mod baskets;
pub mod catalogue;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Variety option not found
    #[error("Variety option not found: {0}")]
    OptionNotFound(String),

    /// No basket loaded
    #[error("No basket loaded")]
    NoBasket,

    /// The basket refused a line
    #[error("Basket refused line for product: {0}")]
    LineRefused(String),

    /// The basket refused the voucher
    #[error("Basket refused voucher: {0}")]
    VoucherRefused(String),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    catalogue: MemoryCatalogue,

    /// String key -> id mappings for lookups
    product_ids: FxHashMap<String, ProductId>,
    option_ids: FxHashMap<String, VarietyOptionId>,

    basket: Option<BasketFixture>,

    /// Currency for the fixture set
    currency: Option<String>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalogue: MemoryCatalogue::new(),
            product_ids: FxHashMap::default(),
            option_ids: FxHashMap::default(),
            basket: None,
            currency: None,
        }
    }

    /// Load a catalogue from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or references unknown keys.
    pub fn load_catalogue(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("catalogues").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CatalogueFixture = serde_norway::from_str(&contents)?;

        self.apply_catalogue(fixture)?;

        Ok(self)
    }

    /// Load a catalogue from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or references unknown keys.
    pub fn load_catalogue_str(&mut self, yaml: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CatalogueFixture = serde_norway::from_str(yaml)?;

        self.apply_catalogue(fixture)?;

        Ok(self)
    }

    fn apply_catalogue(&mut self, fixture: CatalogueFixture) -> Result<(), FixtureError> {
        if fixture.currency.is_some() {
            self.currency = fixture.currency;
        }

        for (key, product_fixture) in fixture.products {
            let product = Product::try_from(product_fixture)?;

            self.product_ids.insert(key, product.id);
            self.catalogue.insert_product(product);
        }

        for variety_fixture in fixture.varieties.values() {
            let variety = variety_fixture.variety();
            let variety_id: VarietyId = variety.id;

            self.catalogue.insert_variety(variety);

            for (key, option_fixture) in &variety_fixture.options {
                let option = option_fixture.option(variety_id)?;

                self.option_ids.insert(key.clone(), option.id);
                self.catalogue.insert_variety_option(option);
            }
        }

        for assignment in fixture.assignments {
            let product = self.product_id(&assignment.product)?;
            let option = self.option_id(&assignment.option)?;
            let price = catalogue::parse_price(&assignment.price)?;

            self.catalogue.assign(product, option, price);
        }

        for sku_fixture in fixture.skus {
            let product = self.product_id(&sku_fixture.product)?;
            let options = sku_fixture
                .options
                .iter()
                .map(|key| self.option_id(key))
                .collect::<Result<Vec<_>, _>>()?;

            self.catalogue.insert_sku(sku_fixture.sku(product, options)?);
        }

        for voucher_fixture in fixture.vouchers.into_values() {
            self.catalogue
                .insert_voucher(Voucher::try_from(voucher_fixture)?);
        }

        for option_fixture in fixture.delivery_options {
            self.catalogue
                .insert_delivery_option(DeliveryOption::try_from(option_fixture)?);
        }

        for entry in fixture.product_delivery_options {
            let product = self.product_id(&entry.product)?;

            self.catalogue
                .insert_product_delivery_option(entry.entry(product)?);
        }

        for option_fixture in fixture.finance_options {
            self.catalogue
                .insert_finance_option(FinanceOption::try_from(option_fixture)?);
        }

        Ok(())
    }

    /// Load basket lines from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_basket(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("baskets").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        self.basket = Some(serde_norway::from_str(&contents)?);

        Ok(self)
    }

    /// Load a complete fixture set (catalogue, plus basket lines when the set has them)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_catalogue(name)?;

        if fixture.base_path.join("baskets").join(format!("{name}.yml")).exists() {
            fixture.load_basket(name)?;
        } else {
            debug!(name, "fixture set has no basket");
        }

        Ok(fixture)
    }

    /// The loaded catalogue
    pub fn catalogue(&self) -> &MemoryCatalogue {
        &self.catalogue
    }

    /// The loaded catalogue, for simulating catalogue changes
    pub fn catalogue_mut(&mut self) -> &mut MemoryCatalogue {
        &mut self.catalogue
    }

    /// Currency code declared by the catalogue
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    /// Get a product id by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product_id(&self, key: &str) -> Result<ProductId, FixtureError> {
        self.product_ids
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a variety option id by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the option is not found.
    pub fn option_id(&self, key: &str) -> Result<VarietyOptionId, FixtureError> {
        self.option_ids
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::OptionNotFound(key.to_string()))
    }

    /// Line requests for the loaded basket
    ///
    /// # Errors
    ///
    /// Returns an error if no basket is loaded or a line references unknown keys.
    pub fn line_requests(&self) -> Result<Vec<LineRequest>, FixtureError> {
        let basket = self.basket.as_ref().ok_or(FixtureError::NoBasket)?;

        basket
            .lines
            .iter()
            .map(|line| {
                let mut request = LineRequest::new(self.product_id(&line.product)?)
                    .quantity(line.quantity)
                    .options(
                        line.options
                            .iter()
                            .map(|key| self.option_id(key))
                            .collect::<Result<Vec<_>, _>>()?,
                    );

                for (key, value) in &line.custom {
                    request = request.custom(key.clone(), value.clone());
                }

                for (key, text) in &line.labels {
                    request = request.label(self.option_id(key)?, text.clone());
                }

                Ok(request)
            })
            .collect()
    }

    /// Create a basket from the loaded basket fixture
    ///
    /// # Errors
    ///
    /// Returns an error if no basket is loaded, or the basket refuses a line or the voucher.
    pub fn basket<'c>(&self, ctx: BasketContext<'c>) -> Result<Basket<'c>, FixtureError> {
        let fixture = self.basket.as_ref().ok_or(FixtureError::NoBasket)?;
        let mut basket = Basket::new(ctx);

        if let Some(country) = &fixture.country {
            basket.set_delivery_country(country);
        }

        if let Some(id) = fixture.delivery_option {
            basket.set_delivery_option(DeliveryOptionId::new(id));
        }

        for (line, request) in fixture.lines.iter().zip(self.line_requests()?) {
            if basket.add_item(request).is_none() {
                return Err(FixtureError::LineRefused(line.product.clone()));
            }
        }

        if let Some(code) = &fixture.voucher
            && !basket.set_voucher(code, false)
        {
            return Err(FixtureError::VoucherRefused(code.clone()));
        }

        Ok(basket)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{catalogue::Catalogue, config::BasketConfig, money::Money};

    use super::*;

    const CATALOGUE: &str = r#"
products:
  pot:
    id: 1
    title: Plant Pot
    price: "50.00"
varieties:
  colour:
    id: 1
    title: Colour
    options:
      red:
        id: 10
        title: Red
assignments:
  - product: pot
    option: red
    price: "1.50"
delivery_options:
  - id: 1
    title: Standard
    uk: "7.00"
"#;

    #[test]
    fn loads_catalogue_from_yaml() -> TestResult {
        let mut fixture = Fixture::new();
        fixture.load_catalogue_str(CATALOGUE)?;

        let pot = fixture.product_id("pot")?;

        assert_eq!(pot, ProductId::new(1));
        assert_eq!(fixture.option_id("red")?, VarietyOptionId::new(10));
        assert_eq!(fixture.catalogue().assignments(&[pot]).len(), 1);
        assert_eq!(fixture.catalogue().delivery_options().len(), 1);

        Ok(())
    }

    #[test]
    fn unknown_keys_are_reported() -> TestResult {
        let mut fixture = Fixture::new();
        fixture.load_catalogue_str(CATALOGUE)?;

        assert!(matches!(
            fixture.product_id("chair"),
            Err(FixtureError::ProductNotFound(key)) if key == "chair"
        ));
        assert!(matches!(fixture.line_requests(), Err(FixtureError::NoBasket)));

        Ok(())
    }

    #[test]
    fn from_set_builds_a_priced_basket() -> TestResult {
        let fixture = Fixture::from_set("scenarios")?;
        let config = BasketConfig::default();
        let basket = fixture.basket(BasketContext::new(fixture.catalogue(), &config))?;

        assert_eq!(basket.sub_total(), Money::from(50));
        assert_eq!(basket.total(), Money::from(57));

        Ok(())
    }
}
