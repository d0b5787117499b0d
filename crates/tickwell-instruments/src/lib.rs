//! Instrument scaling table for the tickwell tick ingestion pipeline.
//!
//! This crate maps asset symbols to their metadata, most importantly the
//! decimal factor that converts raw bi5 integer prices into decimal prices:
//! 10^5 for most FX majors, 10^3 for metals and rare pairs, 10^2 for yen
//! crosses and indices, 10^4 for the crypto pair.
//!
//! # Example
//!
//! ```
//! use tickwell_instruments::InstrumentRegistry;
//!
//! let registry = InstrumentRegistry::global();
//! let eurusd = registry.resolve("EURUSD").unwrap();
//! assert_eq!(eurusd.decimal_factor(), 100_000);
//! ```

#![doc(issue_tracker_base_url = "https://github.com/tickwell/tickwell/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::OnceLock;

use tickwell_types::{Category, ConfigError, Instrument};

/// The instrument metadata JSON embedded at compile time.
const INSTRUMENTS_JSON: &str = include_str!("../data/instruments.json");

/// Global instrument registry instance.
static REGISTRY: OnceLock<InstrumentRegistry> = OnceLock::new();

/// Registry of all supported instruments.
#[derive(Debug)]
pub struct InstrumentRegistry {
    instruments: HashMap<String, Instrument>,
}

impl InstrumentRegistry {
    /// Returns the global instrument registry.
    ///
    /// The registry is initialized lazily on first access.
    #[must_use]
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::load)
    }

    /// Loads instruments from the embedded JSON data.
    fn load() -> Self {
        let instruments: HashMap<String, Instrument> =
            serde_json::from_str(INSTRUMENTS_JSON).expect("Invalid instruments.json");
        Self { instruments }
    }

    /// Looks up an instrument by ID (case-insensitive).
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Instrument> {
        self.instruments.get(&id.trim().to_lowercase())
    }

    /// Looks up an instrument, failing with a configuration error when the
    /// asset has no scaling entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownInstrument`] for unrecognized assets.
    pub fn resolve(&self, id: &str) -> Result<&Instrument, ConfigError> {
        self.get(id)
            .ok_or_else(|| ConfigError::UnknownInstrument(id.to_string()))
    }

    /// Returns all instruments as an iterator.
    pub fn all(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }

    /// Returns the total number of instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Returns instruments matching the given category.
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Instrument> {
        self.instruments
            .values()
            .filter(move |i| i.category() == category)
    }

    /// Searches instruments by name or ID pattern (case-insensitive).
    pub fn search(&self, pattern: &str) -> Vec<&Instrument> {
        let pattern = pattern.to_lowercase();
        self.instruments
            .values()
            .filter(|i| {
                i.id().to_lowercase().contains(&pattern)
                    || i.name().to_lowercase().contains(&pattern)
            })
            .collect()
    }
}
