//! Segment primitives: one `*`-delimited, `~`-terminated record.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

pub const ELEMENT_SEPARATOR: char = '*';
pub const COMPONENT_SEPARATOR: char = ':';
pub const SEGMENT_TERMINATOR: char = '~';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: &'static str,
    pub elements: Vec<String>,
}

impl Segment {
    pub fn new<I, S>(id: &'static str, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    /// Render without the trailing line break: `ID*el1*el2~`.
    pub fn render(&self) -> String {
        let mut out = String::from(self.id);
        for element in &self.elements {
            out.push(ELEMENT_SEPARATOR);
            out.push_str(element);
        }
        out.push(SEGMENT_TERMINATOR);
        out
    }
}

/// Monetary amount: exactly two decimal digits, no thousands separators.
pub fn fmt_amount(amount: Decimal) -> String {
    format!("{amount:.2}")
}

/// `YYYYMMDD`.
pub fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Two-digit year date used in ISA09.
pub fn fmt_date_short(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// `HHMM`.
pub fn fmt_time(stamp: NaiveDateTime) -> String {
    stamp.format("%H%M").to_string()
}

/// Fixed-width ISA element: right-padded with spaces, truncated when
/// oversized.
pub fn fixed_width(value: &str, width: usize) -> String {
    let mut out: String = value.chars().take(width).collect();
    while out.len() < width {
        out.push(' ');
    }
    out
}
