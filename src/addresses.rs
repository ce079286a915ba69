//! Addresses

use serde::{Deserialize, Serialize};

/// A billing or delivery address as stored on baskets and orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Salutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Full name, when first/last are not split
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Company name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// First address line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,

    /// Second address line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,

    /// Third address line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address3: Option<String>,

    /// Town or city
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// County
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,

    /// State or province
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Postal code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,

    /// ISO 3166 alpha-2 country code
    #[serde(rename = "country-iso", default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Contact number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,

    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Address {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Address::default()
    }

    /// Display name: `name`, or first and last name joined.
    pub fn full_name(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }

        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect();

        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// Trim values, drop blank ones, upper-case the country and fold US counties into `state`.
    #[must_use]
    pub fn normalised(mut self) -> Self {
        for field in [
            &mut self.title,
            &mut self.first_name,
            &mut self.last_name,
            &mut self.name,
            &mut self.company,
            &mut self.address1,
            &mut self.address2,
            &mut self.address3,
            &mut self.city,
            &mut self.county,
            &mut self.state,
            &mut self.postcode,
            &mut self.country,
            &mut self.telephone,
            &mut self.email,
        ] {
            *field = field
                .take()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
        }

        self.country = self.country.map(|country| country.to_ascii_uppercase());

        if self.country.as_deref() == Some("US")
            && let Some(county) = self.county.take()
        {
            self.state = Some(county);
        }

        self
    }
}
