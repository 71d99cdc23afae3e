//! Locale folding for the language dimension

use crate::query::types::MetricRow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One merged base-language bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageBucket {
    /// Lowercase primary subtag (`"en-US"` folds to `"en"`)
    pub code: String,
    pub count: i64,
}

/// Ordering of the folded output.
///
/// `FirstSeen` preserves the insertion order of each code's first
/// occurrence, so a bucket whose merged count overtakes an earlier one stays
/// where it first appeared. `MergedCount` re-sorts descending by the merged
/// counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LanguageOrder {
    #[default]
    FirstSeen,
    MergedCount,
}

/// Fold ranked locale rows into base-language buckets. Counts are conserved:
/// the bucket totals always sum to the input total.
pub fn fold_locales(rows: &[MetricRow], order: LanguageOrder) -> Vec<LanguageBucket> {
    let mut buckets: Vec<LanguageBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let code = row
            .x
            .to_lowercase()
            .split('-')
            .next()
            .unwrap_or_default()
            .to_string();
        match index.get(&code) {
            Some(&i) => buckets[i].count += row.y,
            None => {
                index.insert(code.clone(), buckets.len());
                buckets.push(LanguageBucket { code, count: row.y });
            }
        }
    }

    if order == LanguageOrder::MergedCount {
        // Stable sort keeps first-seen order among equal counts.
        buckets.sort_by(|a, b| b.count.cmp(&a.count));
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(pairs: &[(&str, i64)]) -> Vec<MetricRow> {
        pairs
            .iter()
            .map(|(x, y)| MetricRow { x: (*x).to_string(), y: *y })
            .collect()
    }

    #[test]
    fn folds_region_variants_into_base_language() {
        let input = rows(&[("en-US", 10), ("es-MX", 5), ("en-GB", 3)]);
        let buckets = fold_locales(&input, LanguageOrder::FirstSeen);

        assert_eq!(
            buckets,
            vec![
                LanguageBucket { code: "en".to_string(), count: 13 },
                LanguageBucket { code: "es".to_string(), count: 5 },
            ]
        );
    }

    #[test]
    fn first_seen_order_survives_merges_that_overtake() {
        // "fr" ends up with the largest merged count but keeps its original
        // position behind "de".
        let input = rows(&[("de", 6), ("fr-FR", 5), ("fr-CA", 4)]);
        let buckets = fold_locales(&input, LanguageOrder::FirstSeen);

        assert_eq!(buckets[0].code, "de");
        assert_eq!(buckets[1].code, "fr");
        assert_eq!(buckets[1].count, 9);
    }

    #[test]
    fn merged_count_order_resorts_descending() {
        let input = rows(&[("de", 6), ("fr-FR", 5), ("fr-CA", 4)]);
        let buckets = fold_locales(&input, LanguageOrder::MergedCount);

        assert_eq!(buckets[0].code, "fr");
        assert_eq!(buckets[0].count, 9);
        assert_eq!(buckets[1].code, "de");
    }

    #[test]
    fn counts_are_conserved() {
        let input = rows(&[("en-US", 10), ("en-GB", 3), ("pt-BR", 7), ("pt", 2), ("zh", 1)]);
        let total: i64 = input.iter().map(|r| r.y).sum();
        for order in [LanguageOrder::FirstSeen, LanguageOrder::MergedCount] {
            let buckets = fold_locales(&input, order);
            assert_eq!(buckets.iter().map(|b| b.count).sum::<i64>(), total);
        }
    }

    #[test]
    fn case_is_normalized() {
        let input = rows(&[("EN-us", 2), ("en", 1)]);
        let buckets = fold_locales(&input, LanguageOrder::FirstSeen);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].code, "en");
        assert_eq!(buckets[0].count, 3);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(fold_locales(&[], LanguageOrder::FirstSeen).is_empty());
    }
}
