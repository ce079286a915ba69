//! Basket Messages

use serde::Serialize;

/// Shown when the basket holds pre-order products.
pub const MESSAGE_PRE_ORDER: &str =
    "Your basket contains pre-order items ({items}). They will be dispatched when available.";

/// Shown when a finance option is selected.
pub const MESSAGE_FINANCE_SELECTED: &str = "You have chosen to pay with {finance_option}.";

/// Shown when finance can be offered.
pub const MESSAGE_FINANCE_AVAILABLE: &str =
    "Finance is available on this order from {threshold}.";

/// Shown when finance would be offered on a larger basket.
pub const MESSAGE_FINANCE_UNAVAILABLE: &str =
    "Spend {remaining} more to pay for this order with finance.";

/// Shown on sealed baskets.
pub const MESSAGE_FROZEN_BASKET: &str =
    "This basket belongs to a placed order and can no longer be changed.";

/// Shown when a sealed basket references catalogue entries that no longer exist.
pub const MESSAGE_UNABLE_TO_RESTORE: &str = "Some items on this order are no longer available. \
     Prices shown are those at the time the order was placed.";

/// Condition a message was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Pre-order products present
    PreOrder,

    /// A finance option is selected
    FinanceSelected,

    /// Finance is available
    FinanceAvailable,

    /// Finance needs a larger basket
    FinanceUnavailable,

    /// Basket is sealed
    Frozen,

    /// Basket is sealed and partly missing from the catalogue
    UnableToRestore,
}

/// A message to show alongside the basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasketMessage {
    /// Condition
    pub kind: MessageKind,

    /// Expanded text
    pub text: String,
}

impl BasketMessage {
    /// Expand `template` for `kind`.
    pub fn new(kind: MessageKind, template: &str, values: &[(&str, &str)]) -> Self {
        BasketMessage {
            kind,
            text: expand(template, values),
        }
    }
}

/// Replace `{key}` placeholders in `template`. Unknown placeholders are left as they are.
pub fn expand(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{key}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_keys() {
        let text = expand(MESSAGE_FINANCE_UNAVAILABLE, &[("remaining", "£12.00")]);

        assert_eq!(text, "Spend £12.00 more to pay for this order with finance.");
    }

    #[test]
    fn leaves_unknown_keys() {
        assert_eq!(expand("{a} {b}", &[("a", "1")]), "1 {b}");
    }
}
