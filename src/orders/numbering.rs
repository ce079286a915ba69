//! Order Numbering
//!
//! Customer-facing order ids and the secret id used in unauthenticated order links.

use clap::ValueEnum;
use jiff::civil::Date;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224};

/// How order ids are generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderIdFormat {
    /// `YYYY-MM-<pk>`
    #[default]
    Numeric,

    /// `<pk>`
    Sequential,

    /// Base-36 of the primary key followed by four random digits.
    Base36,
}

/// Number of random digits mixed into a secret id.
const SECRET_DIGITS: usize = 30;

/// Number of random digits appended to base-36 order ids.
const BASE36_DIGITS: usize = 4;

/// Candidate order ids for an order with primary key `pk`.
#[derive(Debug, Clone, Copy)]
pub struct OrderNumbering<'a> {
    /// Id format
    pub format: OrderIdFormat,

    /// Prepended to every id.
    pub prefix: Option<&'a str>,

    /// Appended to every id.
    pub suffix: Option<&'a str>,
}

impl OrderNumbering<'_> {
    /// The candidate for retry `attempt` (starting at zero). Numeric and sequential ids move to
    /// the next number on each retry, base-36 ids draw fresh random digits.
    pub fn candidate<R: Rng>(
        &self,
        pk: u64,
        attempt: u32,
        today: Date,
        rng: &mut R,
    ) -> String {
        let number = pk.saturating_add(u64::from(attempt));

        let body = match self.format {
            OrderIdFormat::Numeric => {
                format!("{:04}-{:02}-{number}", today.year(), today.month())
            }
            OrderIdFormat::Sequential => number.to_string(),
            OrderIdFormat::Base36 => {
                format!("{}{}", to_base36(pk), random_digits(rng, BASE36_DIGITS))
            }
        };

        format!(
            "{}{body}{}",
            self.prefix.unwrap_or_default(),
            self.suffix.unwrap_or_default()
        )
    }
}

/// Secret id for order `pk`: SHA-224 over the primary key, thirty random digits and the process
/// secret, as 56 lowercase hex characters.
pub fn secret_id<R: Rng>(pk: u64, secret: &str, rng: &mut R) -> String {
    let mut hasher = Sha224::new();

    hasher.update(pk.to_string().as_bytes());
    hasher.update(random_digits(rng, SECRET_DIGITS).as_bytes());
    hasher.update(secret.as_bytes());

    format!("{:x}", hasher.finalize())
}

fn random_digits<R: Rng>(rng: &mut R, count: usize) -> String {
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Upper-case base-36 rendering of `value`.
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let mut out = Vec::new();

    loop {
        let digit = usize::try_from(value % 36).unwrap_or_default();
        out.push(DIGITS.get(digit).copied().unwrap_or(b'0'));
        value /= 36;

        if value == 0 {
            break;
        }
    }

    out.iter().rev().map(|byte| char::from(*byte)).collect()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn numbering(format: OrderIdFormat) -> OrderNumbering<'static> {
        OrderNumbering {
            format,
            prefix: None,
            suffix: None,
        }
    }

    #[test]
    fn numeric_ids_carry_year_and_month() {
        let mut rng = StdRng::seed_from_u64(1);

        let id = numbering(OrderIdFormat::Numeric).candidate(41, 1, date(2026, 3, 9), &mut rng);

        assert_eq!(id, "2026-03-42");
    }

    #[test]
    fn prefix_and_suffix_wrap_the_id() {
        let mut rng = StdRng::seed_from_u64(1);

        let numbering = OrderNumbering {
            format: OrderIdFormat::Sequential,
            prefix: Some("WEB-"),
            suffix: Some("/A"),
        };

        assert_eq!(numbering.candidate(7, 0, date(2026, 1, 1), &mut rng), "WEB-7/A");
    }

    #[test]
    fn base36_ids_append_random_digits() {
        let mut rng = StdRng::seed_from_u64(9);

        let id = numbering(OrderIdFormat::Base36).candidate(71, 0, date(2026, 1, 1), &mut rng);

        assert!(id.starts_with("1Z"));
        assert_eq!(id.len(), 6);
        assert!(id.chars().skip(2).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn base36_renders_zero_and_large_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn secret_ids_are_56_hex_characters_and_differ() {
        let mut rng = StdRng::seed_from_u64(3);

        let first = secret_id(1, "secret", &mut rng);
        let second = secret_id(1, "secret", &mut rng);

        assert_eq!(first.len(), 56);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
