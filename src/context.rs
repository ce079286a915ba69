//! Basket Context
//!
//! Everything a basket needs from the outside world, passed explicitly.

use jiff::{Timestamp, civil::Date, tz::TimeZone};

use crate::{catalogue::Catalogue, config::BasketConfig};

/// Source of the current time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// The system clock.
    #[default]
    System,

    /// A fixed instant, for tests and replays.
    Fixed(Timestamp),
}

impl Clock {
    /// The current instant.
    pub fn now(self) -> Timestamp {
        match self {
            Clock::System => Timestamp::now(),
            Clock::Fixed(timestamp) => timestamp,
        }
    }

    /// Today's date in UTC.
    pub fn today(self) -> Date {
        self.now().to_zoned(TimeZone::UTC).date()
    }
}

/// Catalogue, configuration and clock a basket operates against.
#[derive(Debug, Clone, Copy)]
pub struct BasketContext<'c> {
    /// Catalogue reads
    pub catalogue: &'c dyn Catalogue,

    /// Shop settings
    pub config: &'c BasketConfig,

    /// Time source
    pub clock: Clock,
}

impl<'c> BasketContext<'c> {
    /// Context using the system clock.
    pub fn new(catalogue: &'c dyn Catalogue, config: &'c BasketConfig) -> Self {
        BasketContext {
            catalogue,
            config,
            clock: Clock::System,
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        BasketContext { clock, ..self }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn fixed_clock_reports_utc_date() -> TestResult {
        let clock = Clock::Fixed("2025-03-31T23:30:00Z".parse()?);

        assert_eq!(clock.today(), date(2025, 3, 31));

        Ok(())
    }
}
