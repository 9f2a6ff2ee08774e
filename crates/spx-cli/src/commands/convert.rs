//! `spx convert`.

use anyhow::Result;
use spx_config::{ConverterLookup, ValueType};

/// Execute `spx convert`: print the decoded value in decimal.
pub fn convert(value_type: ValueType, value: &str) -> Result<()> {
    let converted = ConverterLookup::default().convert(value_type, value)?;
    tracing::debug!(%value_type, input = value, "converted");
    println!("{converted}");
    Ok(())
}
