use anyhow::{Context, Result};
use regex::Regex;

const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "#N/A", "#NA", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None",
    "<NA>",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawCell<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
}

impl<'a> RawCell<'a> {
    pub fn classify(field: &'a str) -> Self {
        let trimmed = field.trim();
        if NULL_TOKENS.contains(&trimmed) {
            return Self::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number(value),
            _ => Self::Text(trimmed),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Parses a share that may be written as a fraction (`0.23`) or a percentage
/// (`23`, `"23%"`, `"23,5%"`).
///
/// Values at or below 1 are read as fractions and scaled by 100, so a genuine
/// `1%` comes back as `100.0`. That ambiguity is kept as-is.
pub fn percent_parse(cell: RawCell<'_>) -> Option<f64> {
    let value = match cell {
        RawCell::Missing => return None,
        RawCell::Number(value) => value,
        RawCell::Text(text) => {
            let cleaned = text.replace('%', "").replace(',', ".");
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
    };

    if value.is_nan() {
        return None;
    }

    Some(if value <= 1.0 { value * 100.0 } else { value })
}

pub fn numeric_coerce(cell: RawCell<'_>) -> Option<f64> {
    match cell {
        RawCell::Missing => None,
        RawCell::Number(value) => Some(value),
        RawCell::Text(text) => text.trim().parse::<f64>().ok().filter(|value| !value.is_nan()),
    }
}

pub struct CurrencyParser {
    noise: Regex,
}

impl CurrencyParser {
    pub fn new() -> Result<Self> {
        let noise = Regex::new(r"[^\d,.\-]").context("failed to compile currency noise pattern")?;
        Ok(Self { noise })
    }

    /// Commas are thousands separators whenever a period is present, and also
    /// when one to three of them appear alone. A comma-decimal locale
    /// (`"1.234,56"`) is therefore misread.
    pub fn parse(&self, cell: RawCell<'_>) -> Option<f64> {
        let text = match cell {
            RawCell::Missing => return None,
            RawCell::Number(value) => return Some(value),
            RawCell::Text(text) => text,
        };

        let mut cleaned = self.noise.replace_all(text, "").into_owned();
        let comma_count = cleaned.matches(',').count();
        if comma_count > 0 && (cleaned.contains('.') || comma_count <= 3) {
            cleaned.retain(|ch| ch != ',');
        }

        cleaned.parse::<f64>().ok().filter(|value| !value.is_nan())
    }
}
