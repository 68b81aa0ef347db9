use std::collections::BTreeMap;

use super::model::{ColumnKeys, Dataset, RawRecord, RawValue, Row};

/// Canonical string form of a raw cell: null → "", anything else → its
/// display form with surrounding whitespace trimmed.
pub fn normalize_value(value: Option<&RawValue>) -> String {
    match value {
        None | Some(RawValue::Null) => String::new(),
        Some(RawValue::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Convert raw records into the canonical [`Dataset`].
///
/// Every key in `columns` is present in every output row; missing fields
/// degrade to the empty string. Fields outside `columns` are dropped.
pub fn normalize(records: &[RawRecord], columns: ColumnKeys) -> Dataset {
    let rows = records
        .iter()
        .map(|rec| {
            let cells: BTreeMap<String, String> = columns
                .iter()
                .map(|key| (key.to_string(), normalize_value(rec.get(key))))
                .collect();
            Row::with_cells(cells)
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Normalized {} rows across {} columns",
        rows.len(),
        columns.len()
    );
    Dataset::new(columns, rows)
}
