//! Receipt
//!
//! Terminal rendering of a discounted cart.

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
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
    cart::{Cart, CartError, CartItem, PerCouponDiscounts},
    pricing::percent_points,
};

/// Errors that can occur when building or writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error calculating cart totals.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Summary of a cart after coupons were applied and saved.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    items: Vec<CartItem<'a>>,

    /// Applied coupon codes, in application order.
    coupons: Vec<String>,

    /// Discount granted by each applied coupon.
    per_coupon_discounts: PerCouponDiscounts<'a>,

    /// Sum of line subtotals before any discount.
    subtotal: Money<'a, Currency>,

    /// Sum of manual and coupon discounts.
    discounts: Money<'a, Currency>,

    /// Amount due today.
    total: Money<'a, Currency>,

    currency: &'a Currency,
}

impl<'a> Receipt<'a> {
    /// Build a receipt from a saved cart.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if the cart totals cannot be calculated.
    pub fn from_cart(cart: &Cart<'a>) -> Result<Self, ReceiptError> {
        let currency = cart.currency();

        let discounts = cart
            .items()
            .iter()
            .try_fold(Money::from_minor(0, currency), |acc, item| {
                acc.add(item.discount_total())
            })?;

        Ok(Receipt {
            items: cart.items().to_vec(),
            coupons: cart.coupons().to_vec(),
            per_coupon_discounts: cart.checkout_data().per_coupon_discounts.clone(),
            subtotal: cart.subtotal()?,
            discounts,
            total: cart.total()?,
            currency,
        })
    }

    /// Total before any discount.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Amount due today.
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Manual and coupon discounts combined.
    pub fn savings(&self) -> Money<'a, Currency> {
        self.discounts
    }

    /// Savings as a fraction of the subtotal.
    pub fn savings_percent(&self) -> Percentage {
        let subtotal = self.subtotal.to_minor_units();

        if subtotal == 0 {
            return Percentage::from(0.0);
        }

        let savings = Decimal::from_i64(self.discounts.to_minor_units()).unwrap_or(Decimal::ZERO);
        let subtotal = Decimal::from_i64(subtotal).unwrap_or(Decimal::ONE);

        Percentage::from(savings / subtotal)
    }

    /// Applied coupon codes.
    pub fn coupons(&self) -> &[String] {
        &self.coupons
    }

    /// Receipt currency.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Writes the receipt table and summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record([
            "",
            "Item",
            "Categories",
            "Qty",
            "Subtotal",
            "Discount",
            "Line Total",
            "Renewal",
        ]);

        let mut color_ops: SmallVec<[(usize, usize, Color); 16]> = SmallVec::new();

        for (idx, item) in self.items.iter().enumerate() {
            let row = idx + 1;
            let discounted = item.coupon_discount().to_minor_units() > 0;

            builder.push_record([
                format!("#{row}"),
                item_label(item),
                item.categories().to_strs().join("\n"),
                item.quantity().to_string(),
                format!("{}", item.subtotal()),
                discount_cell(item),
                format!("{}", item.line_total()),
                renewal_cell(item),
            ]);

            color_ops.push((row, 0, color_dark_grey()));

            if discounted {
                color_ops.push((row, 6, Color::FG_GREEN));
            }

            if item.is_locked() {
                color_ops.push((row, 1, color_dark_grey()));
            }
        }

        write_table(&mut out, builder, color_ops)?;
        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let savings_points = percent_points(self.savings_percent()).round_dp(2);

        let mut lines: SmallVec<[(String, String); 8]> = SmallVec::new();

        lines.push((" Subtotal:".to_string(), format!("{}  ", self.subtotal)));

        for (code, discount) in &self.per_coupon_discounts {
            lines.push((format!(" {code}:"), format!("-{discount}  ")));
        }

        lines.push((
            " \x1b[1mTotal:\x1b[0m".to_string(),
            format!("\x1b[1m{}  \x1b[0m", self.total),
        ));

        lines.push((
            " Savings:".to_string(),
            format!("({savings_points:.2}%) {}  ", self.discounts),
        ));

        let label_width = lines
            .iter()
            .map(|(label, _)| visible_width(label))
            .max()
            .unwrap_or_default();

        let value_width = lines
            .iter()
            .map(|(_, value)| visible_width(value))
            .max()
            .unwrap_or_default();

        for (label, value) in &lines {
            write_summary_line(out, label, value, label_width, value_width)?;
        }

        writeln!(out).map_err(|_err| ReceiptError::IO)
    }
}

fn item_label(item: &CartItem<'_>) -> String {
    let mut label = item.name().to_string();

    if item.payment().has_trial() {
        _ = write!(label, "\n(trial, signup {})", item.effective_subtotal());
    } else if item.payment().is_subscription() {
        label.push_str("\n(subscription)");
    }

    if item.is_locked() {
        label.push_str("\n(locked)");
    }

    label
}

fn discount_cell(item: &CartItem<'_>) -> String {
    if item.discount_total().to_minor_units() == 0 {
        return String::new();
    }

    let mut cell = format!("-{}", item.discount_total());

    if item.manual_discount().to_minor_units() > 0 {
        _ = write!(cell, "\n(manual -{})", item.manual_discount());
    }

    cell
}

fn renewal_cell(item: &CartItem<'_>) -> String {
    item.recurring_discounts()
        .filter(|recurring| recurring.amount.to_minor_units() > 0)
        .map(|recurring| format!("-{}", recurring.amount))
        .unwrap_or_default()
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    color_ops: SmallVec<[(usize, usize, Color); 16]>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..8), Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

/// Wraps runs of box-drawing characters (U+2500..U+257F) in dark grey.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            out.push_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            out.push_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        out.push_str("\x1b[0m");
    }

    out
}

/// Width of a string once ANSI escapes are stripped.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            in_escape = !ch.is_ascii_alphabetic();
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
        "{}{label}  {}{value}",
        " ".repeat(label_pad),
        " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}
