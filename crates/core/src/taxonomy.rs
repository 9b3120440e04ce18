//! Two-level amenity taxonomy
//!
//! The taxonomy table maps `(primary tag, secondary tag)` to an L0 category
//! and `(secondary tag, L0 category)` to an L1 category. It is loaded once
//! from CSV and shared read-only (behind an [`Arc`]) by every classifier.
//!
//! Primary tag resolution scans the table's primary tags in first-appearance
//! order and picks the first one present in a record's tags. A record with
//! two known primary tags (say `amenity` and `shop`) is therefore classified
//! by whichever comes first in the table.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::UNCATEGORISED;

/// One row of the taxonomy CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRow {
    #[serde(rename = "primary tag")]
    pub primary_tag: String,
    #[serde(rename = "secondary tag")]
    pub secondary_tag: String,
    #[serde(rename = "L0 category")]
    pub l0_category: String,
    #[serde(rename = "L1 category", default)]
    pub l1_category: String,
}

impl TaxonomyRow {
    pub fn new(primary: &str, secondary: &str, l0: &str, l1: &str) -> Self {
        Self {
            primary_tag: primary.to_string(),
            secondary_tag: secondary.to_string(),
            l0_category: l0.to_string(),
            l1_category: l1.to_string(),
        }
    }
}

/// Read-only lookup structure built from taxonomy rows.
///
/// When several rows share a lookup key the first row wins.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyTable {
    primary_tags: Vec<String>,
    /// primary tag -> secondary tag -> L0
    l0: HashMap<String, HashMap<String, String>>,
    /// secondary tag -> L0 -> L1
    l1: HashMap<String, HashMap<String, String>>,
    rows: usize,
}

impl TaxonomyTable {
    pub fn from_rows(rows: impl IntoIterator<Item = TaxonomyRow>) -> Self {
        let mut table = Self::default();

        for row in rows {
            table.rows += 1;

            if row.primary_tag.is_empty() {
                continue;
            }
            if !table.primary_tags.contains(&row.primary_tag) {
                table.primary_tags.push(row.primary_tag.clone());
            }
            if row.l0_category.is_empty() {
                continue;
            }

            table
                .l0
                .entry(row.primary_tag)
                .or_default()
                .entry(row.secondary_tag.clone())
                .or_insert_with(|| row.l0_category.clone());

            if !row.l1_category.is_empty() {
                table
                    .l1
                    .entry(row.secondary_tag)
                    .or_default()
                    .entry(row.l0_category)
                    .or_insert(row.l1_category);
            }
        }

        table
    }

    /// Parse a CSV with a `primary tag,secondary tag,L0 category,L1 category` header
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let rows = rdr
            .deserialize::<TaxonomyRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self::from_rows(rows))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let table = Self::from_reader(file)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            rows = table.rows,
            primary_tags = table.primary_tags.len(),
            "loaded taxonomy table"
        );
        Ok(table)
    }

    /// Known primary tags in resolution order
    pub fn primary_tags(&self) -> &[String] {
        &self.primary_tags
    }

    pub fn l0_category(&self, primary: &str, secondary: &str) -> Option<&str> {
        self.l0.get(primary)?.get(secondary).map(String::as_str)
    }

    pub fn l1_category(&self, secondary: &str, l0: &str) -> Option<&str> {
        self.l1.get(secondary)?.get(l0).map(String::as_str)
    }

    /// Number of rows read, including rows that added no lookup entry
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Outcome of classifying one tag mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub primary_tag: Option<String>,
    pub secondary_tag: Option<String>,
    pub l0: String,
    pub l1: String,
}

impl Classification {
    pub fn uncategorised() -> Self {
        Self {
            primary_tag: None,
            secondary_tag: None,
            l0: UNCATEGORISED.to_string(),
            l1: UNCATEGORISED.to_string(),
        }
    }
}

/// Resolves raw tags into `(L0, L1)` categories.
///
/// Cloning is cheap; all clones share one table.
#[derive(Debug, Clone)]
pub struct TaxonomyClassifier {
    table: Arc<TaxonomyTable>,
}

impl TaxonomyClassifier {
    pub fn new(table: Arc<TaxonomyTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TaxonomyTable {
        &self.table
    }

    /// First known primary tag present in `tags`
    pub fn primary_tag(&self, tags: &HashMap<String, String>) -> Option<&str> {
        self.table
            .primary_tags()
            .iter()
            .find(|tag| tags.contains_key(tag.as_str()))
            .map(String::as_str)
    }

    /// Classify a tag mapping. Lookup misses resolve to `"Uncategorised"`.
    pub fn classify(&self, tags: &HashMap<String, String>) -> Classification {
        let Some(primary) = self.primary_tag(tags) else {
            return Classification::uncategorised();
        };
        let Some(secondary) = tags.get(primary) else {
            return Classification::uncategorised();
        };

        let l0 = self
            .table
            .l0_category(primary, secondary)
            .unwrap_or(UNCATEGORISED);
        let l1 = self
            .table
            .l1_category(secondary, l0)
            .unwrap_or(UNCATEGORISED);

        Classification {
            primary_tag: Some(primary.to_string()),
            secondary_tag: Some(secondary.clone()),
            l0: l0.to_string(),
            l1: l1.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
primary tag,secondary tag,L0 category,L1 category
amenity,restaurant,Food and drinks,Restaurant
amenity,cafe,Food and drinks,Cafe
amenity,bank,Financial,Bank
shop,bakery,Shopping,Groceries
shop,cafe,Shopping,Shopping_Other
amenity,restaurant,Duplicate,Ignored
leisure,park,Recreation,
";

    fn classifier() -> TaxonomyClassifier {
        let table = TaxonomyTable::from_reader(CSV.as_bytes()).unwrap();
        TaxonomyClassifier::new(Arc::new(table))
    }

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_loads_rows_and_primary_tag_order() {
        let c = classifier();
        assert_eq!(c.table().len(), 7);
        assert_eq!(c.table().primary_tags(), ["amenity", "shop", "leisure"]);
    }

    #[test]
    fn test_resolves_both_levels() {
        let result = classifier().classify(&tags(&[("amenity", "cafe"), ("name", "Koffie")]));
        assert_eq!(result.primary_tag.as_deref(), Some("amenity"));
        assert_eq!(result.secondary_tag.as_deref(), Some("cafe"));
        assert_eq!(result.l0, "Food and drinks");
        assert_eq!(result.l1, "Cafe");
    }

    #[test]
    fn test_first_row_wins_on_duplicate_keys() {
        let result = classifier().classify(&tags(&[("amenity", "restaurant")]));
        assert_eq!(result.l0, "Food and drinks");
        assert_eq!(result.l1, "Restaurant");
    }

    #[test]
    fn test_misses_resolve_to_uncategorised() {
        let c = classifier();

        let no_primary = c.classify(&tags(&[("highway", "bus_stop")]));
        assert_eq!(no_primary, Classification::uncategorised());

        let unknown_secondary = c.classify(&tags(&[("amenity", "bench")]));
        assert_eq!(unknown_secondary.primary_tag.as_deref(), Some("amenity"));
        assert_eq!(unknown_secondary.l0, UNCATEGORISED);
        assert_eq!(unknown_secondary.l1, UNCATEGORISED);

        // L0 found, but the row has no L1 value
        let missing_l1 = c.classify(&tags(&[("leisure", "park")]));
        assert_eq!(missing_l1.l0, "Recreation");
        assert_eq!(missing_l1.l1, UNCATEGORISED);
    }

    #[test]
    fn test_classification_is_pure() {
        let c = classifier();
        let t = tags(&[("shop", "bakery"), ("opening_hours", "Mo-Sa 07:00-18:00")]);
        let first = c.classify(&t);
        let _ = c.classify(&tags(&[("amenity", "bank")]));
        assert_eq!(first, c.classify(&t));
    }

    /// Known tie-break: with both `amenity` and `shop` present, the table's
    /// primary-tag order decides, regardless of which pairing is a better fit.
    /// Kept as-is for compatibility with existing category tables.
    #[test]
    fn test_two_primary_tags_resolve_by_table_order() {
        let c = classifier();
        let both = tags(&[("shop", "bakery"), ("amenity", "cafe")]);

        let result = c.classify(&both);
        assert_eq!(result.primary_tag.as_deref(), Some("amenity"));
        assert_eq!(result.l0, "Food and drinks");

        // `shop=bakery` alone would have been Shopping
        assert_eq!(c.classify(&tags(&[("shop", "bakery")])).l0, "Shopping");
    }

    #[test]
    fn test_l1_lookup_is_keyed_by_l0() {
        // "cafe" maps to different L1 values under different L0 parents
        let c = classifier();
        assert_eq!(c.table().l1_category("cafe", "Food and drinks"), Some("Cafe"));
        assert_eq!(c.table().l1_category("cafe", "Shopping"), Some("Shopping_Other"));
        assert_eq!(c.table().l1_category("cafe", "Financial"), None);
    }

    #[test]
    fn test_rejects_malformed_csv() {
        let bad = "primary tag,secondary tag\namenity,cafe\n";
        assert!(TaxonomyTable::from_reader(bad.as_bytes()).is_err());
    }
}
