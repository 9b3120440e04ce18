//! Category filter profiles
//!
//! Three fixed profiles (levels 0, 1 and 2) remove categories before
//! entropy computation. Each level excludes everything the previous level
//! excludes, plus more. Records with an `Uncategorised` level are always
//! dropped first, whatever the profile.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::record::{AmenityRecord, UNCATEGORISED};

/// Exclusion rules applied to classified records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterProfile {
    level: u8,
    l0_blacklist: BTreeSet<String>,
    l1_blacklist: BTreeMap<String, BTreeSet<String>>,
}

impl FilterProfile {
    /// Highest predefined level
    pub const MAX_LEVEL: u8 = 2;

    /// Select one of the predefined profiles
    pub fn level(level: u8) -> Result<Self> {
        match level {
            0 => Ok(Self::level_0()),
            1 => Ok(Self::level_1()),
            2 => Ok(Self::level_2()),
            other => Err(Error::InvalidFilterLevel(other)),
        }
    }

    /// All predefined profiles, in level order
    pub fn all() -> [Self; 3] {
        [Self::level_0(), Self::level_1(), Self::level_2()]
    }

    fn level_0() -> Self {
        Self::build(0, &[UNCATEGORISED], &[])
    }

    fn level_1() -> Self {
        Self::build(
            1,
            &[
                UNCATEGORISED,
                "Private transportation",
                "Facilities",
                "Waste management",
            ],
            &[
                ("Healthcare", &["Healthcare_Other"]),
                ("Shopping", &["Shopping_Other"]),
                ("Public service", &["PS_Other"]),
            ],
        )
    }

    fn level_2() -> Self {
        Self::build(
            2,
            &[
                UNCATEGORISED,
                "Private transportation",
                "Facilities",
                "Waste management",
                "Financial",
            ],
            &[
                ("Healthcare", &["Healthcare_Other"]),
                ("Entertainment, arts and culture", &["EAC_Other"]),
                (
                    "Shopping",
                    &[
                        "Shopping_Other",
                        "Clothing and accessoires",
                        "Crafts",
                        "House and interior",
                        "Media, appliances and hardware",
                        "Mobility",
                    ],
                ),
                ("Public service", &["PS_Other"]),
            ],
        )
    }

    fn build(level: u8, l0: &[&str], l1: &[(&str, &[&str])]) -> Self {
        Self {
            level,
            l0_blacklist: l0.iter().map(|s| s.to_string()).collect(),
            l1_blacklist: l1
                .iter()
                .map(|(parent, children)| {
                    (
                        parent.to_string(),
                        children.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn level_index(&self) -> u8 {
        self.level
    }

    pub fn l0_blacklist(&self) -> &BTreeSet<String> {
        &self.l0_blacklist
    }

    pub fn l1_blacklist(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.l1_blacklist
    }

    /// Whether this profile removes the record
    pub fn excludes(&self, record: &AmenityRecord) -> bool {
        if record.is_uncategorised() {
            return true;
        }
        if self.l0_blacklist.contains(&record.l0_category) {
            return true;
        }
        self.l1_blacklist
            .get(&record.l0_category)
            .is_some_and(|children| children.contains(&record.l1_category))
    }

    /// Keep only the records this profile does not exclude (input order is preserved)
    pub fn apply(&self, records: Vec<AmenityRecord>) -> Vec<AmenityRecord> {
        records.into_iter().filter(|r| !self.excludes(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;
    use crate::taxonomy::Classification;
    use geo_types::Point;

    fn record(id: u64, l0: &str, l1: &str) -> AmenityRecord {
        AmenityRecord::new(
            RawRecord::node(id, 0.0, 0.0),
            Point::new(0.0, 0.0),
            Classification {
                primary_tag: Some("amenity".into()),
                secondary_tag: Some("x".into()),
                l0: l0.into(),
                l1: l1.into(),
            },
        )
    }

    fn sample() -> Vec<AmenityRecord> {
        let pairs = [
            ("Food and drinks", "Restaurant"),
            ("Food and drinks", UNCATEGORISED),
            (UNCATEGORISED, UNCATEGORISED),
            ("Private transportation", "Parking"),
            ("Facilities", "Toilets"),
            ("Waste management", "Recycling"),
            ("Financial", "Bank"),
            ("Healthcare", "Healthcare_Other"),
            ("Healthcare", "Pharmacy"),
            ("Shopping", "Shopping_Other"),
            ("Shopping", "Crafts"),
            ("Shopping", "Groceries"),
            ("Public service", "PS_Other"),
            ("Public service", "Library"),
            ("Entertainment, arts and culture", "EAC_Other"),
            ("Entertainment, arts and culture", "Museum"),
            // L1 value blacklisted under a different parent only
            ("Education", "Shopping_Other"),
        ];
        pairs
            .iter()
            .enumerate()
            .map(|(i, (l0, l1))| record(i as u64, l0, l1))
            .collect()
    }

    fn ids(records: &[AmenityRecord]) -> BTreeSet<u64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        assert!(matches!(FilterProfile::level(3), Err(Error::InvalidFilterLevel(3))));
    }

    #[test]
    fn test_level_zero_only_drops_uncategorised() {
        let kept = FilterProfile::level(0).unwrap().apply(sample());
        assert_eq!(kept.len(), sample().len() - 2);
        assert!(kept.iter().all(|r| !r.is_uncategorised()));
    }

    #[test]
    fn test_level_one_rules() {
        let kept = FilterProfile::level(1).unwrap().apply(sample());
        let kept_l0: Vec<_> = kept.iter().map(|r| r.l0_category.as_str()).collect();

        assert!(!kept_l0.contains(&"Private transportation"));
        assert!(!kept_l0.contains(&"Facilities"));
        assert!(kept_l0.contains(&"Financial"));
        assert!(kept.iter().any(|r| r.l1_category == "Crafts"));
        assert!(kept.iter().any(|r| r.l0_category == "Education"));
        assert!(!kept.iter().any(|r| r.l1_category == "PS_Other"));
    }

    #[test]
    fn test_no_kept_record_matches_a_blacklist() {
        for profile in FilterProfile::all() {
            for r in profile.apply(sample()) {
                assert!(!profile.l0_blacklist().contains(&r.l0_category));
                if let Some(children) = profile.l1_blacklist().get(&r.l0_category) {
                    assert!(!children.contains(&r.l1_category));
                }
            }
        }
    }

    #[test]
    fn test_levels_are_nested() {
        let [p0, p1, p2] = FilterProfile::all();
        let k0 = ids(&p0.apply(sample()));
        let k1 = ids(&p1.apply(sample()));
        let k2 = ids(&p2.apply(sample()));

        assert!(k2.is_subset(&k1));
        assert!(k1.is_subset(&k0));
        assert!(k2.len() < k1.len() && k1.len() < k0.len());
    }

    #[test]
    fn test_apply_preserves_order_and_records() {
        let input = sample();
        let kept = FilterProfile::level(2).unwrap().apply(input.clone());
        let expected: Vec<_> = input
            .into_iter()
            .filter(|r| !FilterProfile::level(2).unwrap().excludes(r))
            .collect();
        assert_eq!(kept, expected);
    }
}
