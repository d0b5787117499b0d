//! List command implementation.

use anyhow::Result;
use tickwell_lib::prelude::*;

/// List known instruments with optional category filter or search pattern.
pub(crate) fn list_instruments(category: Option<&str>, search: Option<&str>) -> Result<()> {
    let registry = InstrumentRegistry::global();

    let instruments: Vec<_> = match (category, search) {
        (Some(cat), _) => {
            let category: Category = cat.parse().map_err(anyhow::Error::msg)?;
            registry.by_category(category).collect()
        }
        (_, Some(pattern)) => registry.search(pattern),
        (None, None) => registry.all().collect(),
    };

    if instruments.is_empty() {
        println!("No instruments found.");
        return Ok(());
    }

    println!("{:<15} {:<20} {:<10} {:>8}", "ID", "NAME", "CATEGORY", "SCALE");
    println!("{}", "-".repeat(56));

    for instrument in &instruments {
        println!(
            "{:<15} {:<20} {:<10} {:>8}",
            instrument.id(),
            instrument.name(),
            instrument.category(),
            instrument.decimal_factor()
        );
    }

    println!("\nTotal: {} instruments", instruments.len());
    Ok(())
}
