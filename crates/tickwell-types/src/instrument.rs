//! Financial instrument definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instrument category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Foreign exchange currency pairs.
    Forex,
    /// Cryptocurrencies.
    Crypto,
    /// Stock indices.
    Index,
    /// Commodities (metals, energy).
    Commodity,
}

impl Category {
    /// Returns the category as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Forex => "forex",
            Self::Crypto => "crypto",
            Self::Index => "index",
            Self::Commodity => "commodity",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forex" | "fx" => Ok(Self::Forex),
            "crypto" => Ok(Self::Crypto),
            "index" | "indices" => Ok(Self::Index),
            "commodity" | "commodities" | "metal" => Ok(Self::Commodity),
            _ => Err(format!(
                "unknown category '{s}', expected one of: forex, crypto, index, commodity"
            )),
        }
    }
}

/// A tradable instrument and the divisor that turns its raw integer prices
/// into decimal prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique identifier (e.g., "eurusd", "xauusd").
    id: String,
    /// Human-readable name (e.g., "EUR/USD").
    name: String,
    /// Description of the instrument.
    description: String,
    /// Instrument category.
    category: Category,
    /// Divisor applied to raw bi5 prices.
    decimal_factor: u32,
    /// Earliest available tick data timestamp.
    #[serde(default)]
    start_tick_date: Option<DateTime<Utc>>,
}

impl Instrument {
    /// Creates a new instrument.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        decimal_factor: u32,
        start_tick_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category,
            decimal_factor,
            start_tick_date,
        }
    }

    /// Returns the instrument identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the symbol as it appears in feed URLs and table names.
    #[must_use]
    pub fn symbol(&self) -> String {
        self.id.to_uppercase()
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the instrument category.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Returns the decimal factor for price normalization.
    #[must_use]
    pub const fn decimal_factor(&self) -> u32 {
        self.decimal_factor
    }

    /// Returns the earliest available tick data timestamp.
    #[must_use]
    pub const fn start_tick_date(&self) -> Option<DateTime<Utc>> {
        self.start_tick_date
    }

    /// Returns true if tick data is available for the given date.
    #[must_use]
    pub fn has_data_for(&self, date: DateTime<Utc>) -> bool {
        self.start_tick_date.is_none_or(|start| date >= start)
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn eurusd() -> Instrument {
        let start = Utc.with_ymd_and_hms(2003, 5, 5, 0, 0, 0).unwrap();
        Instrument::new(
            "eurusd",
            "EUR/USD",
            "Euro vs US Dollar",
            Category::Forex,
            100_000,
            Some(start),
        )
    }

    #[test]
    fn test_instrument_creation() {
        let instrument = eurusd();
        assert_eq!(instrument.id(), "eurusd");
        assert_eq!(instrument.symbol(), "EURUSD");
        assert_eq!(instrument.name(), "EUR/USD");
        assert_eq!(instrument.decimal_factor(), 100_000);
        assert_eq!(instrument.category(), Category::Forex);
    }

    #[test]
    fn test_has_data_for() {
        let instrument = eurusd();
        let before = Utc.with_ymd_and_hms(2003, 1, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert!(!instrument.has_data_for(before));
        assert!(instrument.has_data_for(after));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("FX".parse::<Category>().unwrap(), Category::Forex);
        assert_eq!("metal".parse::<Category>().unwrap(), Category::Commodity);
        assert!("bond".parse::<Category>().is_err());
    }
}
