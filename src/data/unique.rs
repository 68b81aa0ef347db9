use std::cell::OnceCell;
use std::cmp::Ordering;
use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::model::{ColumnKeys, Dataset};

// ---------------------------------------------------------------------------
// Unique-value cache: distinct values per column, choice lists on demand
// ---------------------------------------------------------------------------

/// Distinct normalized values per column, collected in one scan of the
/// dataset. Only used to populate choice lists, never for filtering itself.
///
/// Choice lists (case-collapsed, sorted) are computed the first time a
/// column is asked for and memoized per column afterwards.
#[derive(Debug, Default)]
pub struct UniqueValueCache {
    columns: ColumnKeys,
    /// Per column, distinct values in first-seen order.
    distinct: Vec<Vec<String>>,
    choices: Vec<OnceCell<Vec<String>>>,
}

impl UniqueValueCache {
    /// Single pass over `dataset`: O(rows × columns).
    pub fn build(dataset: &Dataset) -> Self {
        let columns = dataset.columns().clone();
        let mut seen: Vec<HashSet<&str>> = vec![HashSet::new(); columns.len()];
        let mut distinct: Vec<Vec<String>> = vec![Vec::new(); columns.len()];

        for row in dataset.rows() {
            for (idx, key) in columns.iter().enumerate() {
                let value = row.value(key);
                if seen[idx].insert(value) {
                    distinct[idx].push(value.to_string());
                }
            }
        }

        let choices = (0..columns.len()).map(|_| OnceCell::new()).collect();
        log::debug!(
            "Cached distinct values for {} columns ({} values total)",
            columns.len(),
            distinct.iter().map(Vec::len).sum::<usize>()
        );
        UniqueValueCache {
            columns,
            distinct,
            choices,
        }
    }

    /// Distinct values of `key` exactly as observed, in first-seen order.
    pub fn distinct(&self, key: &str) -> Option<&[String]> {
        let idx = self.columns.position(key)?;
        Some(&self.distinct[idx])
    }

    /// The display choice list for `key`: values differing only by case are
    /// collapsed to their first-seen spelling, blank first, then
    /// numeric-aware order. Computed on first request, reused afterwards.
    pub fn choices(&self, key: &str) -> Option<&[String]> {
        let idx = self.columns.position(key)?;
        let list = self.choices[idx].get_or_init(|| {
            log::debug!("Populating choice list for column '{key}'");
            build_choice_list(&self.distinct[idx])
        });
        Some(list)
    }

    /// Whether the choice list of `key` has been computed yet.
    pub fn is_populated(&self, key: &str) -> bool {
        self.columns
            .position(key)
            .is_some_and(|idx| self.choices[idx].get().is_some())
    }

    /// Whether `values` selects every entry of the already populated choice
    /// list of `key`. `None` when the column is unknown or not populated.
    pub fn covers_populated(&self, key: &str, values: &[String]) -> Option<bool> {
        let idx = self.columns.position(key)?;
        let choices = self.choices[idx].get()?;
        Some(covers(choices, values))
    }

    /// Like [`covers_populated`](Self::covers_populated) but populates the
    /// choice list first if needed.
    pub fn covers(&self, key: &str, values: &[String]) -> Option<bool> {
        let choices = self.choices(key)?;
        Some(covers(choices, values))
    }
}

fn covers(choices: &[String], values: &[String]) -> bool {
    let selected: HashSet<&str> = values.iter().map(String::as_str).collect();
    choices.iter().all(|c| selected.contains(c.as_str()))
}

fn build_choice_list(distinct: &[String]) -> Vec<String> {
    let mut folded = HashSet::new();
    let mut list: Vec<String> = distinct
        .iter()
        .filter(|v| folded.insert(v.to_lowercase()))
        .cloned()
        .collect();
    list.sort_by(|a, b| choice_cmp(a, b));
    list
}

/// Blank sorts first, everything else by [`natural_cmp`].
pub fn choice_cmp(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => natural_cmp(a, b),
    }
}

// ---------------------------------------------------------------------------
// Locale-style, numeric-aware comparison
// ---------------------------------------------------------------------------

/// Compare two strings the way a collator with numeric ordering does:
///
/// * embedded numbers order by value ("2" before "10", "item9" before
///   "item10");
/// * punctuation and whitespace sort before digits, digits before letters;
/// * letters compare by base letter, ignoring accents and case
///   ("Émile" between "Eaton" and "Eva").
///
/// Accents, then case (lowercase first), only break ties.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);
    let mut tie = Ordering::Equal;

    loop {
        match (left.next(), right.next()) {
            (None, None) => return tie,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let (primary, secondary) = cmp_chunk(x, y);
                if primary != Ordering::Equal {
                    return primary;
                }
                if tie == Ordering::Equal {
                    tie = secondary;
                }
            }
        }
    }
}

/// Split into maximal runs of ASCII digits and non-digits.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

const RANK_PUNCT: u8 = 0;
const RANK_DIGIT: u8 = 1;
const RANK_LETTER: u8 = 2;

fn rank(c: char) -> u8 {
    if c.is_ascii_digit() {
        RANK_DIGIT
    } else if c.is_alphanumeric() {
        RANK_LETTER
    } else {
        RANK_PUNCT
    }
}

/// Primary collation key: decomposed, combining marks dropped, lowercased,
/// each char tagged with its rank.
fn primary_key(s: &str) -> impl Iterator<Item = (u8, char)> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| (rank(c), c))
}

/// Returns (primary, tie-break) ordering for one pair of chunks.
fn cmp_chunk(x: &str, y: &str) -> (Ordering, Ordering) {
    let is_num = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match (is_num(x), is_num(y)) {
        (true, true) => {
            let xs = x.trim_start_matches('0');
            let ys = y.trim_start_matches('0');
            let primary = xs.len().cmp(&ys.len()).then_with(|| xs.cmp(ys));
            (primary, x.len().cmp(&y.len()))
        }
        // A text run never starts with a digit, so its first rank decides.
        (true, false) => (RANK_DIGIT.cmp(&first_rank(y)), Ordering::Equal),
        (false, true) => (first_rank(x).cmp(&RANK_DIGIT), Ordering::Equal),
        (false, false) => {
            let primary = primary_key(x).cmp(primary_key(y));
            let accents = x
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(y.chars().flat_map(char::to_lowercase));
            // Uppercase code points sort below lowercase ones, so reverse to
            // put lowercase first.
            (primary, accents.then_with(|| x.cmp(y).reverse()))
        }
    }
}

fn first_rank(s: &str) -> u8 {
    primary_key(s).next().map_or(RANK_PUNCT, |(r, _)| r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{RawRecord, RawValue};
    use crate::data::normalize::normalize;

    fn dataset(column: &str, values: &[&str]) -> Dataset {
        let records: Vec<RawRecord> = values
            .iter()
            .map(|v| {
                let mut rec = RawRecord::new();
                rec.insert(column.to_string(), RawValue::from(*v));
                rec
            })
            .collect();
        normalize(&records, ColumnKeys::new([column]))
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
        assert_eq!(natural_cmp("item9", "item10"), Ordering::Less);
        assert_eq!(natural_cmp("007", "7"), Ordering::Greater);
        assert_eq!(natural_cmp("7.5", "7.25"), Ordering::Less);
    }

    #[test]
    fn letters_compare_case_insensitively() {
        assert_eq!(natural_cmp("cs", "EE"), Ordering::Less);
        assert_eq!(natural_cmp("Mech", "civil"), Ordering::Greater);
        assert_eq!(natural_cmp("a", "A"), Ordering::Less);
        assert_eq!(natural_cmp("A", "b"), Ordering::Less);
    }

    #[test]
    fn accents_fold_to_their_base_letter() {
        assert_eq!(natural_cmp("Émile", "Zoe"), Ordering::Less);
        assert_eq!(natural_cmp("Émile", "Eva"), Ordering::Less);
        assert_eq!(natural_cmp("Eaton", "Émile"), Ordering::Less);
        assert_eq!(natural_cmp("Rene", "René"), Ordering::Less);
        assert_eq!(natural_cmp("résumé", "Resume"), Ordering::Greater);
    }

    #[test]
    fn punctuation_sorts_before_digits_and_letters() {
        assert_eq!(natural_cmp("_misc", "1st"), Ordering::Less);
        assert_eq!(natural_cmp("(none)", "a"), Ordering::Less);
        assert_eq!(natural_cmp("a b", "ab"), Ordering::Less);
        assert_eq!(natural_cmp("1st", "Ann"), Ordering::Less);
    }

    #[test]
    fn choice_list_uses_collation_order() {
        let ds = dataset("name", &["Zoe", "Émile", "Eva", "_misc", "1st", ""]);
        let cache = UniqueValueCache::build(&ds);
        assert_eq!(
            cache.choices("name").unwrap(),
            &["", "_misc", "1st", "Émile", "Eva", "Zoe"]
        );
    }

    #[test]
    fn blank_sorts_first() {
        let mut v = vec!["10", "", "2", "Open"];
        v.sort_by(|a, b| choice_cmp(a, b));
        assert_eq!(v, vec!["", "2", "10", "Open"]);
    }

    #[test]
    fn distinct_values_keep_first_seen_order() {
        let ds = dataset("course", &["EE", "cs", "EE", "CS"]);
        let cache = UniqueValueCache::build(&ds);
        assert_eq!(cache.distinct("course").unwrap(), &["EE", "cs", "CS"]);
        assert!(cache.distinct("status").is_none());
    }

    #[test]
    fn choices_collapse_case_keeping_first_spelling() {
        let ds = dataset("course", &["cs", "CS", "EE"]);
        let cache = UniqueValueCache::build(&ds);
        assert_eq!(cache.choices("course").unwrap(), &["cs", "EE"]);
    }

    #[test]
    fn choices_are_populated_lazily() {
        let ds = dataset("ctc", &["10", "", "2"]);
        let cache = UniqueValueCache::build(&ds);
        assert!(!cache.is_populated("ctc"));
        assert_eq!(cache.covers_populated("ctc", &[]), None);

        assert_eq!(cache.choices("ctc").unwrap(), &["", "2", "10"]);
        assert!(cache.is_populated("ctc"));
    }

    #[test]
    fn coverage_requires_every_choice() {
        let ds = dataset("status", &["Placed", "Open"]);
        let cache = UniqueValueCache::build(&ds);
        let all = vec!["Open".to_string(), "Placed".to_string()];
        assert_eq!(cache.covers("status", &all), Some(true));
        assert_eq!(cache.covers("status", &all[..1]), Some(false));
        assert_eq!(cache.covers("missing", &all), None);
    }
}
