//! Utils

use clap::Parser;

/// Arguments for the quote demo
#[derive(Debug, Parser)]
pub struct QuoteArgs {
    /// Fixture set to load the catalogue and basket from
    #[clap(short, long, default_value = "scenarios")]
    pub fixture: String,

    /// Delivery country, overriding the fixture basket's
    #[clap(short, long)]
    pub country: Option<String>,

    /// Voucher code to apply
    #[clap(short, long)]
    pub voucher: Option<String>,

    /// Place an order for the basket and print its identifiers
    #[clap(short, long)]
    pub order: bool,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_short_flags() -> TestResult {
        let args = QuoteArgs::try_parse_from(["quote", "-f", "garden", "-c", "DE", "-v", "SAVE40", "-o"])?;

        assert_eq!(args.fixture, "garden");
        assert_eq!(args.country.as_deref(), Some("DE"));
        assert_eq!(args.voucher.as_deref(), Some("SAVE40"));
        assert!(args.order);

        Ok(())
    }

    #[test]
    fn defaults_to_scenarios() -> TestResult {
        let args = QuoteArgs::try_parse_from(["quote"])?;

        assert_eq!(args.fixture, "scenarios");
        assert!(args.country.is_none());

        Ok(())
    }
}
