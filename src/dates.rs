//! Conversion of listing dates such as `"07 يناير 2024"` into calendar dates.
//!
//! Month names are resolved through an injected [`MonthTable`]. What happens
//! to an unknown month name depends on the [`DateMode`]:
//!
//! - [`DateMode::Strict`] rejects it with [`NormalizationError::UnknownMonth`]
//! - [`DateMode::Lenient`] maps it to January
//!
//! Malformed token counts and non-numeric day/year tokens are errors in
//! both modes.

use crate::errors::NormalizationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to treat a month name missing from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateMode {
    #[default]
    Strict,
    Lenient,
}

/// Which built-in month table to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MonthLocale {
    #[default]
    Arabic,
    English,
}

/// Month name to 1-12 lookup.
#[derive(Debug, Clone)]
pub struct MonthTable {
    months: HashMap<String, u32>,
}

const ARABIC_MONTHS: [&str; 12] = [
    "يناير", "فبراير", "مارس", "أبريل", "مايو", "يونيو", "يوليو", "أغسطس", "سبتمبر", "أكتوبر",
    "نوفمبر", "ديسمبر",
];

const ENGLISH_MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

impl MonthTable {
    /// Build a table from names in calendar order (January first).
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let months = names
            .into_iter()
            .zip(1u32..=12)
            .map(|(name, index)| (name.as_ref().to_lowercase(), index))
            .collect();
        Self { months }
    }

    /// Modern Standard Arabic month names as printed on Al Hurra listings.
    pub fn arabic() -> Self {
        Self::from_names(ARABIC_MONTHS)
    }

    /// English names, matched case-insensitively.
    pub fn english() -> Self {
        Self::from_names(ENGLISH_MONTHS)
    }

    /// Built-in table for a configured [`MonthLocale`].
    pub fn for_locale(locale: MonthLocale) -> Self {
        match locale {
            MonthLocale::Arabic => Self::arabic(),
            MonthLocale::English => Self::english(),
        }
    }

    /// Month number (1-12) for `name`, ignoring case.
    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.months.get(&name.to_lowercase()).copied()
    }
}

/// Parses `"{day} {month-name} {year}"` strings. Holds no mutable state.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    table: MonthTable,
    mode: DateMode,
}

impl DateNormalizer {
    /// Pair a month table with the policy for names it does not contain.
    pub fn new(table: MonthTable, mode: DateMode) -> Self {
        Self { table, mode }
    }

    /// Parse a raw listing date.
    ///
    /// Surrounding and repeated whitespace is ignored and Arabic-Indic
    /// digits are accepted in the day and year.
    ///
    /// # Arguments
    ///
    /// * `raw` - Listing text such as `"07 يناير 2024"`
    ///
    /// # Returns
    ///
    /// The calendar date, or a [`NormalizationError`] naming the bad token.
    /// An unknown month name is only an error in [`DateMode::Strict`].
    pub fn normalize(&self, raw: &str) -> Result<NaiveDate, NormalizationError> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let [day, month, year] = tokens.as_slice() else {
            return Err(NormalizationError::TokenCount(tokens.len()));
        };

        let day: u32 = ascii_digits(day)
            .parse()
            .map_err(|_| NormalizationError::InvalidDay(day.to_string()))?;
        let year: i32 = ascii_digits(year)
            .parse()
            .map_err(|_| NormalizationError::InvalidYear(year.to_string()))?;
        let month = match (self.table.lookup(month), self.mode) {
            (Some(m), _) => m,
            (None, DateMode::Lenient) => 1,
            (None, DateMode::Strict) => {
                return Err(NormalizationError::UnknownMonth(month.to_string()));
            }
        };

        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(NormalizationError::InvalidDate { year, month, day })
    }
}

/// Fold Arabic-Indic digits (U+0660..U+0669) into ASCII.
fn ascii_digits(token: &str) -> String {
    token
        .chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            _ => c,
        })
        .collect()
}
