//! Configuration

use clap::{ArgAction, Parser};
use rusty_money::iso::{self, Currency};

use crate::orders::numbering::OrderIdFormat;

/// EU member states used to derive the EU delivery region.
pub const EU_COUNTRIES: [&str; 26] = [
    "AT", "BE", "BG", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT", "LV", "LT",
    "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
];

const EU_COUNTRY_LIST: &str = "AT,BE,BG,CY,CZ,DK,EE,FI,FR,DE,GR,HU,IE,IT,LV,LT,LU,MT,NL,PL,PT,RO,SK,SI,ES,SE";

/// Shop-wide settings consumed by baskets and orders.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "trolley", about = "Basket engine configuration", long_about = None)]
pub struct BasketConfig {
    /// ISO code of the delivery country assumed when none is known
    #[arg(long, env = "TROLLEY_DEFAULT_COUNTRY", default_value = "GB")]
    pub default_country: String,

    /// ISO 4217 code of the shop currency
    #[arg(long, env = "TROLLEY_CURRENCY", default_value = "GBP")]
    pub currency: String,

    /// Prefix of the session slot holding the basket
    #[arg(long, env = "TROLLEY_SESSION_PREFIX", default_value = "basket")]
    pub session_prefix: String,

    /// Extra basket prefixes staff may use for override baskets
    #[arg(long, env = "TROLLEY_BASKET_PREFIXES", value_delimiter = ',')]
    pub allowed_basket_prefixes: Vec<String>,

    /// Offer finance options at checkout
    #[arg(long, env = "TROLLEY_FINANCE_ENABLED", default_value_t = false, action = ArgAction::Set)]
    pub finance_enabled: bool,

    /// ISO codes making up the EU delivery region
    #[arg(long, env = "TROLLEY_EU_COUNTRIES", value_delimiter = ',', default_value = EU_COUNTRY_LIST)]
    pub eu_countries: Vec<String>,

    /// Order id scheme
    #[arg(long, env = "TROLLEY_ORDER_ID_FORMAT", value_enum, default_value_t = OrderIdFormat::Numeric)]
    pub order_id_format: OrderIdFormat,

    /// Prepended to generated order ids
    #[arg(long, env = "TROLLEY_ORDER_ID_PREFIX")]
    pub order_id_prefix: Option<String>,

    /// Appended to generated order ids
    #[arg(long, env = "TROLLEY_ORDER_ID_SUFFIX")]
    pub order_id_suffix: Option<String>,

    /// Process secret mixed into order secret ids
    #[arg(long, env = "TROLLEY_SECRET_KEY", hide_env_values = true, default_value = "")]
    pub secret_key: String,
}

impl BasketConfig {
    /// Load configuration from `.env` and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, clap::Error> {
        // A missing .env file is fine
        _ = dotenvy::dotenv();

        Self::try_parse_from([env!("CARGO_PKG_NAME")])
    }

    /// The shop currency, falling back to GBP for unknown codes.
    pub fn currency(&self) -> &'static Currency {
        iso::find(&self.currency).unwrap_or(iso::GBP)
    }

    /// Session slot for a basket. A custom prefix is only honoured when it is allowed.
    pub fn session_key(&self, prefix: Option<&str>) -> Option<String> {
        match prefix {
            None => Some(self.session_prefix.clone()),
            Some(prefix)
                if self
                    .allowed_basket_prefixes
                    .iter()
                    .any(|allowed| allowed == prefix) =>
            {
                Some(format!("{}_{prefix}", self.session_prefix))
            }
            Some(_) => None,
        }
    }
}

impl Default for BasketConfig {
    fn default() -> Self {
        BasketConfig {
            default_country: "GB".to_string(),
            currency: "GBP".to_string(),
            session_prefix: "basket".to_string(),
            allowed_basket_prefixes: Vec::new(),
            finance_enabled: false,
            eu_countries: EU_COUNTRIES.iter().map(ToString::to_string).collect(),
            order_id_format: OrderIdFormat::Numeric,
            order_id_prefix: None,
            order_id_suffix: None,
            secret_key: String::new(),
        }
    }
}
