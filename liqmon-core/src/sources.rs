//! Source collections and the JSON interchange adapter.
//!
//! A run processes a mapping from source name to table. Acquisition hands
//! the data over as one JSON document:
//!
//! ```json
//! {
//!   "ecb_data": [{"date": "2024-06-10", "rate_type": "MRO", "value": 4.25}],
//!   "market_data": []
//! }
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{LiqmonError, Result};
use crate::table::TableView;

/// Tables keyed by source name, iterated in name order.
pub type Sources = BTreeMap<String, TableView>;

/// Parses a JSON document of sources into tables.
pub fn parse_sources(json: &str) -> Result<Sources> {
    let document: Value = serde_json::from_str(json)
        .map_err(|e| LiqmonError::serialization("Failed to parse sources document", e))?;
    sources_from_value(&document)
}

/// Builds tables from an already parsed JSON document of sources.
///
/// The document must be an object whose values are arrays of row objects.
/// An empty array is a valid source with zero rows.
pub fn sources_from_value(document: &Value) -> Result<Sources> {
    let object = document
        .as_object()
        .ok_or_else(|| LiqmonError::malformed_input("sources document must be a JSON object"))?;

    let mut sources = Sources::new();
    for (name, rows) in object {
        let rows = rows.as_array().ok_or_else(|| {
            LiqmonError::malformed_input(format!("source '{}' must be an array of rows", name))
        })?;

        let table =
            TableView::from_json_rows(rows).map_err(|e| LiqmonError::table(name.clone(), e))?;
        tracing::debug!(
            "Loaded source '{}': {} row(s), {} column(s)",
            name,
            table.row_count(),
            table.column_count()
        );
        sources.insert(name.clone(), table);
    }

    Ok(sources)
}
