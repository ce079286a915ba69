//! Receipt

use std::{fmt::Write, io};

use rusty_money::iso::Currency;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    basket::{Basket, BasketItem},
    money::Money,
};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// IO error
    #[error("IO error")]
    IO,
}

/// A printable basket line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    /// Product title
    pub title: String,

    /// "Variety: Option" descriptions
    pub options: Vec<String>,

    /// Matched SKU code
    pub sku: Option<String>,

    /// Units
    pub quantity: u32,

    /// Per-unit charge
    pub unit_price: Money,

    /// Line total
    pub total: Money,

    /// Pre-order, deposit-only and similar markers.
    pub notes: Vec<&'static str>,
}

impl ReceiptLine {
    fn from_item(item: &BasketItem) -> Self {
        let notes = [
            (item.is_pre_order(), "pre-order"),
            (item.is_deposit_only(), "deposit"),
            (item.is_collection_only(), "collection only"),
            (item.is_non_returnable(), "non-returnable"),
        ]
        .into_iter()
        .filter_map(|(set, note)| set.then_some(note))
        .collect();

        ReceiptLine {
            title: item.title().to_string(),
            options: item.variety_descriptions(),
            sku: item.sku().map(|sku| sku.code),
            quantity: item.quantity(),
            unit_price: item.total_product(),
            total: item.total(),
            notes,
        }
    }
}

/// Printable summary of a basket.
#[derive(Debug, Clone)]
pub struct Receipt {
    lines: Vec<ReceiptLine>,
    sub_total: Money,
    discount: Money,
    voucher: Option<String>,
    delivery: Money,
    is_quote_only: bool,
    total: Money,
    messages: Vec<String>,
    currency: &'static Currency,
}

impl Receipt {
    /// Capture the lines and totals of `basket`.
    pub fn from_basket(basket: &Basket<'_>) -> Self {
        Receipt {
            lines: basket.items().iter().map(ReceiptLine::from_item).collect(),
            sub_total: basket.sub_total(),
            discount: basket.discount_value(),
            voucher: basket.voucher_code().map(ToString::to_string),
            delivery: basket.delivery(),
            is_quote_only: basket.is_quote_only(),
            total: basket.total(),
            messages: basket
                .messages()
                .into_iter()
                .map(|message| message.text)
                .collect(),
            currency: basket.context().config.currency(),
        }
    }

    /// Lines in basket order.
    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    /// Sum of line totals
    pub fn sub_total(&self) -> Money {
        self.sub_total
    }

    /// Voucher discount
    pub fn discount(&self) -> Money {
        self.discount
    }

    /// Delivery charge
    pub fn delivery(&self) -> Money {
        self.delivery
    }

    /// Amount payable
    pub fn total(&self) -> Money {
        self.total
    }

    /// Currency used for all monetary values.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Writes the receipt as a table followed by its totals.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Options", "Qty", "Unit Price", "Total"]);

        let mut grey_cells = Vec::new();

        for (idx, line) in self.lines.iter().enumerate() {
            let mut options = line.options.clone();

            if let Some(sku) = &line.sku {
                options.push(format!("SKU {sku}"));
            }

            options.extend(line.notes.iter().map(|note| format!("({note})")));

            builder.push_record([
                format!("#{:<3}", idx + 1),
                line.title.clone(),
                options.join("\n"),
                line.quantity.to_string(),
                line.unit_price.format(self.currency),
                line.total.format(self.currency),
            ]);

            grey_cells.push((idx + 1, 2));
        }

        write_table(&mut out, builder, &grey_cells)?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let discount_label = match &self.voucher {
            Some(code) => format!(" Discount ({code}):"),
            None => " Discount:".to_string(),
        };

        let delivery_value = if self.is_quote_only {
            "Quote  ".to_string()
        } else {
            format!("{}  ", self.delivery.format(self.currency))
        };

        let rows = [
            (
                " Subtotal:".to_string(),
                format!("{}  ", self.sub_total.format(self.currency)),
            ),
            (
                discount_label,
                format!("-{}  ", self.discount.format(self.currency)),
            ),
            (" Delivery:".to_string(), delivery_value),
            (
                " \x1b[1mTotal:\x1b[0m".to_string(),
                format!("\x1b[1m{}  \x1b[0m", self.total.format(self.currency)),
            ),
        ];

        let label_width = rows
            .iter()
            .map(|(label, _)| visible_width(label))
            .max()
            .unwrap_or_default();

        let value_width = rows
            .iter()
            .map(|(_, value)| visible_width(value))
            .max()
            .unwrap_or_default();

        for (label, value) in &rows {
            write_summary_line(out, label, value, label_width, value_width)?;
        }

        for message in &self.messages {
            writeln!(out, " {message}").map_err(|_err| ReceiptError::IO)?;
        }

        writeln!(out).map_err(|_err| ReceiptError::IO)
    }
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    grey_cells: &[(usize, usize)],
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..6), Alignment::right());

    for &(row, col) in grey_cells {
        table.modify((row, col), color_dark_grey());
    }

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

/// Wraps runs of box-drawing characters (U+2500..U+257F) in dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

/// ANSI dark grey foreground.
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        basket::LineRequest,
        catalogue::{
            MemoryCatalogue,
            products::{Product, ProductId},
        },
        config::BasketConfig,
        context::BasketContext,
        delivery::{DeliveryOption, DeliveryOptionId},
        vouchers::{DiscountType, Voucher, VoucherId},
    };

    use super::*;

    fn catalogue() -> MemoryCatalogue {
        let mut pre_order = Product::new(ProductId::new(2), "Garden Bench", Money::from(120));
        pre_order.pre_order = true;

        let mut catalogue = MemoryCatalogue::new();
        catalogue
            .insert_product(Product::new(ProductId::new(1), "Plant Pot", Money::from(50)))
            .insert_product(pre_order)
            .insert_delivery_option(DeliveryOption::new(
                DeliveryOptionId::new(1),
                "Standard",
                Money::from(7),
            ))
            .insert_voucher(Voucher::new(
                VoucherId::new(1),
                "TENOFF",
                DiscountType::FixedPrice,
                dec!(10),
            ));

        catalogue
    }

    #[test]
    fn captures_lines_and_totals() -> TestResult {
        let catalogue = catalogue();
        let config = BasketConfig::default();
        let mut basket = Basket::new(BasketContext::new(&catalogue, &config));

        basket
            .add_item(LineRequest::new(ProductId::new(1)).quantity(2))
            .ok_or("add refused")?;

        let receipt = Receipt::from_basket(&basket);
        let line = receipt.lines().first().ok_or("no line")?;

        assert_eq!(line.title, "Plant Pot");
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, Money::from(50));
        assert_eq!(line.total, Money::from(100));
        assert_eq!(receipt.sub_total(), Money::from(100));
        assert_eq!(receipt.total(), Money::from(107));

        Ok(())
    }

    #[test]
    fn write_to_renders_lines_summary_and_messages() -> TestResult {
        let catalogue = catalogue();
        let config = BasketConfig::default();
        let mut basket = Basket::new(BasketContext::new(&catalogue, &config));

        basket
            .add_item(LineRequest::new(ProductId::new(1)))
            .ok_or("add refused")?;
        basket
            .add_item(LineRequest::new(ProductId::new(2)))
            .ok_or("add refused")?;
        basket.set_voucher("TENOFF", false);

        let mut out = Vec::new();
        Receipt::from_basket(&basket).write_to(&mut out)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains("Plant Pot"));
        assert!(output.contains("Garden Bench"));
        assert!(output.contains("(pre-order)"));
        assert!(output.contains("Subtotal:"));
        assert!(output.contains("Discount (TENOFF):"));
        assert!(output.contains("Delivery:"));
        assert!(output.contains("Total:"));
        assert!(output.contains("pre-order items (Garden Bench)"));

        Ok(())
    }

    #[test]
    fn visible_width_ignores_escape_codes() {
        assert_eq!(visible_width("\x1b[1mTotal:\x1b[0m"), 6);
        assert_eq!(visible_width("abc"), 3);
    }

    #[test]
    fn colorize_borders_wraps_box_runs() {
        assert_eq!(colorize_borders("a──b"), "a\x1b[90m──\x1b[0mb");
    }
}
