//! Fixed-width text layout for receipt columns
//!
//! Widths are counted in `char`s: the target code pages are single-byte,
//! so one char occupies exactly one column on paper.

use rust_decimal::prelude::*;
use shared::is_zero_decimal_currency;

/// Column count of a string
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Take at most `width` chars
fn take_chars(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

/// Greedy word wrap
///
/// Words longer than the line are hard-cut. Empty or blank input yields a
/// single empty line so callers can always print at least one row.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        // Hard-cut words that cannot fit on any line
        while word.len() > width {
            if cur_len > 0 {
                lines.push(std::mem::take(&mut cur));
                cur_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }

        let sep = usize::from(cur_len > 0);
        if cur_len + sep + word.len() <= width {
            if sep == 1 {
                cur.push(' ');
            }
            cur.extend(word.iter());
            cur_len += sep + word.len();
        } else {
            lines.push(std::mem::take(&mut cur));
            cur = word.iter().collect();
            cur_len = word.len();
        }
    }

    if cur_len > 0 || lines.is_empty() {
        lines.push(cur);
    }
    lines
}

/// Single-line truncation with a trailing ellipsis
pub fn fit(text: &str, width: usize) -> String {
    if text_width(text) <= width {
        return text.to_string();
    }
    if width <= 1 {
        return take_chars(text, width);
    }
    let mut out = take_chars(text, width - 1);
    out.push('…');
    out
}

/// `left` and `right` on one line, right-justified against `width`
///
/// When both do not fit with at least one space between them, the joined
/// text is cut to `width`.
pub fn pad_left_right(left: &str, right: &str, width: usize) -> String {
    let used = text_width(left) + text_width(right);
    if used >= width {
        return take_chars(&format!("{left} {right}"), width);
    }
    format!("{left}{}{right}", " ".repeat(width - used))
}

/// A full-width rule
pub fn separator(ch: char, width: usize) -> String {
    std::iter::repeat_n(ch, width).collect()
}

/// Group an absolute, already-rounded amount: "." thousands, "," decimals
fn group_digits(amount: Decimal, decimals: u32) -> String {
    let formatted = format!("{:.*}", decimals as usize, amount.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (idx, d) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*d);
    }
    if let Some(frac) = frac_part {
        grouped.push(',');
        grouped.push_str(frac);
    }
    grouped
}

fn signed(amount: Decimal, decimals: u32) -> String {
    let rounded = amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let body = group_digits(rounded, decimals);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{body}")
    } else {
        body
    }
}

/// Money with currency prefix
///
/// IDR-class currencies print without decimals as `Rp 40.000`; others
/// print two decimals as `USD 1.234,50`.
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let code = currency.trim();
    if is_zero_decimal_currency(code) {
        return format!("Rp {}", signed(amount, 0));
    }
    let number = signed(amount, 2);
    if code.is_empty() {
        number
    } else {
        format!("{} {number}", code.to_uppercase())
    }
}

/// Bare grouped number without decimals (tight columns)
pub fn format_number(amount: Decimal) -> String {
    signed(amount, 0)
}

/// Quantity: integral values without decimals, others trimmed
pub fn format_qty(qty: Decimal) -> String {
    if qty.fract().is_zero() {
        qty.trunc().normalize().to_string()
    } else {
        qty.normalize().to_string()
    }
}
