//! Shannon entropy of category frequencies

use std::collections::{BTreeMap, HashMap};

use landmix_core::{AmenityRecord, CategoryLevel};

/// Entropy of a frequency distribution given as raw counts.
///
/// `H = -Σ pᵢ · log_base(pᵢ)` with `pᵢ = countᵢ / Σ count`. Zero counts are
/// ignored and an all-zero (or empty) distribution has entropy 0.
pub fn entropy_from_counts(counts: impl IntoIterator<Item = usize>, base: f64) -> f64 {
    let counts: Vec<usize> = counts.into_iter().filter(|&c| c > 0).collect();
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }

    let total_f = total as f64;
    let ln_base = base.ln();
    let mut h = 0.0;

    for count in counts {
        let pi = count as f64 / total_f;
        h -= pi * pi.ln();
    }

    // -0.0 for a single category
    (h / ln_base).max(0.0)
}

/// Shannon entropy of the empirical distribution of `labels`
pub fn shannon_entropy<'a>(labels: impl IntoIterator<Item = &'a str>, base: f64) -> f64 {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    entropy_from_counts(counts.into_values(), base)
}

/// Number of records per category at the given taxonomy level, sorted by
/// category name
pub fn category_counts(records: &[AmenityRecord], level: CategoryLevel) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.category(level).to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo_types::Point;
    use landmix_core::{Classification, RawRecord};

    #[test]
    fn test_single_category_is_zero() {
        let h = shannon_entropy(["Shopping"; 12], 2.0);
        assert_abs_diff_eq!(h, 0.0);
        assert!(h.is_sign_positive());
    }

    #[test]
    fn test_equal_categories_is_log2_k() {
        for k in 1..=8usize {
            let labels: Vec<String> = (0..k * 3).map(|i| format!("c{}", i % k)).collect();
            let h = shannon_entropy(labels.iter().map(String::as_str), 2.0);
            assert_abs_diff_eq!(h, (k as f64).log2(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_uneven_distribution() {
        // p = (1/2, 1/4, 1/4)
        assert_abs_diff_eq!(entropy_from_counts([2, 1, 1], 2.0), 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(
            entropy_from_counts([2, 1, 1], std::f64::consts::E),
            1.5 * std::f64::consts::LN_2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_empty_and_zero_counts() {
        assert_abs_diff_eq!(entropy_from_counts(std::iter::empty(), 2.0), 0.0);
        assert_abs_diff_eq!(entropy_from_counts([0, 0], 2.0), 0.0);
        assert_abs_diff_eq!(entropy_from_counts([0, 3, 3], 2.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_category_counts() {
        let record = |l0: &str, l1: &str| {
            let classification = Classification {
                primary_tag: Some("amenity".into()),
                secondary_tag: Some("x".into()),
                l0: l0.into(),
                l1: l1.into(),
            };
            AmenityRecord::new(RawRecord::node(1, 0.0, 0.0), Point::new(0.0, 0.0), classification)
        };
        let records = vec![
            record("Shopping", "Food"),
            record("Healthcare", "Pharmacy"),
            record("Shopping", "Crafts"),
        ];

        let l0 = category_counts(&records, CategoryLevel::L0);
        assert_eq!(l0.get("Shopping"), Some(&2));
        assert_eq!(l0.get("Healthcare"), Some(&1));
        assert_eq!(l0.keys().collect::<Vec<_>>(), ["Healthcare", "Shopping"]);

        let l1 = category_counts(&records, CategoryLevel::L1);
        assert_eq!(l1.len(), 3);
    }
}
