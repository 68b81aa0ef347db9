//! Property tests for normalization and filtering.

use facet_grid::data::normalize::normalize;
use facet_grid::{ColumnKeys, FacetTable, PreFilter, RawRecord, RawValue, Row};
use proptest::prelude::*;

const KEYS: [&str; 3] = ["status", "course", "gender"];
const VALUES: [&str; 4] = ["", "Open", "Placed", "10"];

fn arb_raw_value() -> impl Strategy<Value = RawValue> {
    prop_oneof![
        Just(RawValue::Null),
        any::<bool>().prop_map(RawValue::Bool),
        any::<i64>().prop_map(RawValue::Integer),
        (-1.0e6..1.0e6f64).prop_map(RawValue::Float),
        "[ a-zA-Z0-9]{0,8}".prop_map(RawValue::String),
    ]
}

fn arb_record() -> impl Strategy<Value = RawRecord> {
    prop::collection::btree_map(prop::sample::select(KEYS.to_vec()), arb_raw_value(), 0..4)
        .prop_map(|m| {
            m.into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<RawRecord>()
        })
}

/// Rows as indices into `VALUES`, one per key.
fn arb_rows() -> impl Strategy<Value = Vec<[usize; 3]>> {
    prop::collection::vec(prop::array::uniform3(0..VALUES.len()), 0..40)
}

/// Requested allow-list per key, as indices into `VALUES`.
fn arb_filters() -> impl Strategy<Value = [Vec<usize>; 3]> {
    prop::array::uniform3(prop::collection::vec(0..VALUES.len(), 0..5))
}

fn table(rows: &[[usize; 3]], pre_filter: Option<PreFilter>) -> FacetTable {
    let records: Vec<RawRecord> = rows
        .iter()
        .map(|row| {
            KEYS.iter()
                .zip(row)
                .map(|(k, &v)| (k.to_string(), RawValue::from(VALUES[v])))
                .collect::<RawRecord>()
        })
        .collect();
    FacetTable::new(&records, ColumnKeys::new(KEYS), pre_filter).unwrap()
}

fn placed_only() -> PreFilter {
    PreFilter::new("placed", |row: &Row| row.value("status") == "Placed")
}

proptest! {
    #[test]
    fn normalized_rows_hold_a_trimmed_string_for_every_key(
        records in prop::collection::vec(arb_record(), 0..20),
    ) {
        let ds = normalize(&records, ColumnKeys::new(KEYS));
        prop_assert_eq!(ds.len(), records.len());
        for row in ds.rows() {
            for key in KEYS {
                let value = row.get(key);
                prop_assert!(value.is_some());
                let value = value.unwrap();
                prop_assert_eq!(value, value.trim());
            }
        }
    }

    #[test]
    fn visible_rows_satisfy_every_requested_filter(rows in arb_rows(), wanted in arb_filters()) {
        let mut t = table(&rows, None);
        for (key, allowed) in KEYS.iter().zip(&wanted) {
            t.set_column_filter(key, allowed.iter().map(|&i| VALUES[i])).unwrap();
        }

        let expected: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                (0..KEYS.len()).all(|c| {
                    let observed: Vec<usize> = rows.iter().map(|r| r[c]).collect();
                    let restricts = !wanted[c].is_empty()
                        && !observed.iter().all(|v| wanted[c].contains(v));
                    !restricts || wanted[c].contains(&row[c])
                })
            })
            .map(|(i, _)| i)
            .collect();

        let got: Vec<usize> = t.visible_rows().indices().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn empty_filter_map_returns_the_gated_dataset(rows in arb_rows(), gated in any::<bool>()) {
        let gate = gated.then(placed_only);
        let t = table(&rows, gate.clone());

        let expected: Vec<Row> = t
            .raw_data()
            .rows()
            .iter()
            .filter(|row| gate.as_ref().is_none_or(|g| g.test(row).unwrap()))
            .cloned()
            .collect();
        prop_assert_eq!(t.current_rows(), expected);
    }

    #[test]
    fn snapshot_mutation_never_changes_results(rows in arb_rows(), wanted in arb_filters()) {
        let mut t = table(&rows, None);
        for (key, allowed) in KEYS.iter().zip(&wanted) {
            t.set_column_filter(key, allowed.iter().map(|&i| VALUES[i])).unwrap();
        }
        let before = t.current_rows();

        let mut snap = t.snapshot();
        snap.clear();
        snap.insert("status".into(), vec!["nothing matches this".into()]);

        prop_assert_eq!(t.current_rows(), before);
    }

    #[test]
    fn setting_the_full_choice_list_equals_clearing(rows in arb_rows(), col in 0..KEYS.len()) {
        let mut a = table(&rows, Some(placed_only()));
        let mut b = table(&rows, Some(placed_only()));
        let key = KEYS[col];

        let full: Vec<String> = a.choices(key).unwrap().to_vec();
        a.set_column_filter(key, full).unwrap();
        b.clear_column(key).unwrap();

        prop_assert!(a.column_filter(key).is_none());
        prop_assert_eq!(a.snapshot(), b.snapshot());
        prop_assert_eq!(a.current_rows(), b.current_rows());
    }
}
