//! Cross-report merging of parsed class records into one `MergedUnit` per
//! group key.
//!
//! Two strategies exist and they are not interchangeable:
//!
//! - [`MaxCoverageDedup`] groups by (package, class). When a class shows up
//!   more than once, the single observation with the most covered lines is
//!   kept wholesale and the others are dropped. Used for the per-class
//!   detail report.
//! - [`MaxHitMerge`] groups by package (assembly) and merges line by line,
//!   keyed by (class, line number), keeping the max hit count. Used for the
//!   per-assembly gate.
//!
//! Swapping one for the other changes the reported percentage.
use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::model::{rate, ClassCoverage};

/// Grouping granularity for a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Class,
    Assembly,
}

/// Identity of a merged coverage unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitKey {
    Class { package: String, class: String },
    Assembly(String),
}

impl UnitKey {
    /// The name shown in reports: the class name or the assembly name.
    pub fn name(&self) -> &str {
        match self {
            UnitKey::Class { class, .. } => class,
            UnitKey::Assembly(name) => name,
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKey::Class { package, class } => write!(f, "{package}::{class}"),
            UnitKey::Assembly(name) => f.write_str(name),
        }
    }
}

/// Line identity inside a unit. The class name is part of the key so that
/// two classes of one assembly never collide on a shared line number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId {
    pub class: String,
    pub line_number: u32,
}

/// A unit with its best-known hit count per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedUnit {
    pub key: UnitKey,
    pub lines: BTreeMap<LineId, u64>,
}

impl MergedUnit {
    pub fn new(key: UnitKey) -> Self {
        Self {
            key,
            lines: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.lines.len() as u64
    }

    #[must_use]
    pub fn covered(&self) -> u64 {
        self.lines.values().filter(|&&h| h > 0).count() as u64
    }

    #[must_use]
    pub fn uncovered(&self) -> u64 {
        self.total() - self.covered()
    }

    #[must_use]
    pub fn rate(&self) -> f64 {
        rate(self.covered(), self.total())
    }

    /// Record an observation, never lowering an already-known hit count.
    pub fn observe(&mut self, id: LineId, hit_count: u64) {
        let entry = self.lines.entry(id).or_insert(0);
        *entry = (*entry).max(hit_count);
    }
}

/// A policy for collapsing repeated observations into merged units.
pub trait MergeStrategy {
    fn granularity(&self) -> Granularity;

    /// Merge records from all reports, in any order. Units come back sorted
    /// by key.
    fn merge(&self, records: &[ClassCoverage]) -> Vec<MergedUnit>;
}

/// Class-level dedup: per (package, class), keep the observation with the
/// strictly greatest covered-line count. On an exact tie the first one seen
/// wins.
pub struct MaxCoverageDedup;

impl MergeStrategy for MaxCoverageDedup {
    fn granularity(&self) -> Granularity {
        Granularity::Class
    }

    fn merge(&self, records: &[ClassCoverage]) -> Vec<MergedUnit> {
        let mut best: BTreeMap<(&str, &str), (&ClassCoverage, u64)> = BTreeMap::new();

        for record in records {
            let covered = record.covered();
            let key = (record.package.as_str(), record.name.as_str());
            match best.get(&key).map(|&(_, kept)| kept) {
                Some(kept) if covered <= kept => {
                    debug!(
                        package = key.0,
                        class = key.1,
                        covered,
                        kept,
                        "dropping duplicate class observation"
                    );
                }
                _ => {
                    best.insert(key, (record, covered));
                }
            }
        }

        best.into_iter()
            .map(|((package, class), (record, _))| {
                let mut unit = MergedUnit::new(UnitKey::Class {
                    package: package.to_string(),
                    class: class.to_string(),
                });
                for line in &record.lines {
                    unit.observe(
                        LineId {
                            class: class.to_string(),
                            line_number: line.line_number,
                        },
                        line.hit_count,
                    );
                }
                unit
            })
            .collect()
    }
}

/// Assembly-level merge: per package, keep the max hit count for every
/// (class, line number) seen in any report.
pub struct MaxHitMerge;

impl MergeStrategy for MaxHitMerge {
    fn granularity(&self) -> Granularity {
        Granularity::Assembly
    }

    fn merge(&self, records: &[ClassCoverage]) -> Vec<MergedUnit> {
        let mut units: BTreeMap<&str, MergedUnit> = BTreeMap::new();

        for record in records {
            let unit = units
                .entry(record.package.as_str())
                .or_insert_with(|| MergedUnit::new(UnitKey::Assembly(record.package.clone())));
            for line in &record.lines {
                unit.observe(
                    LineId {
                        class: record.name.clone(),
                        line_number: line.line_number,
                    },
                    line.hit_count,
                );
            }
        }

        units.into_values().collect()
    }
}

/// Merge with the strategy that belongs to the given granularity.
pub fn merge(records: &[ClassCoverage], granularity: Granularity) -> Vec<MergedUnit> {
    let units = match granularity {
        Granularity::Class => MaxCoverageDedup.merge(records),
        Granularity::Assembly => MaxHitMerge.merge(records),
    };
    debug!(
        ?granularity,
        records = records.len(),
        units = units.len(),
        "merged coverage records"
    );
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineCoverage;

    fn class(package: &str, name: &str, hits: &[(u32, u64)]) -> ClassCoverage {
        ClassCoverage {
            package: package.to_string(),
            name: name.to_string(),
            filename: format!("{name}.cs"),
            lines: hits
                .iter()
                .map(|&(line_number, hit_count)| LineCoverage {
                    line_number,
                    hit_count,
                })
                .collect(),
        }
    }

    #[test]
    fn test_class_dedup_keeps_best_observation_wholesale() {
        // A: lines 1 and 3 covered. B: only line 2 covered.
        let a = class("App", "Foo", &[(1, 1), (2, 0), (3, 1)]);
        let b = class("App", "Foo", &[(1, 0), (2, 1), (3, 0)]);

        let units = MaxCoverageDedup.merge(&[a.clone(), b.clone()]);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].total(), 3);
        assert_eq!(units[0].covered(), 2);

        // Order does not matter when one side is strictly better.
        let units = MaxCoverageDedup.merge(&[b, a]);
        assert_eq!(units[0].covered(), 2);
    }

    #[test]
    fn test_class_dedup_tie_first_seen_wins() {
        let first = class("App", "Foo", &[(1, 1), (2, 0)]);
        let second = class("App", "Foo", &[(1, 0), (2, 7), (3, 0)]);

        let units = MaxCoverageDedup.merge(&[first, second]);
        assert_eq!(units[0].total(), 2);
        let line1 = LineId {
            class: "Foo".to_string(),
            line_number: 1,
        };
        assert_eq!(units[0].lines[&line1], 1);
    }

    #[test]
    fn test_class_dedup_separates_packages() {
        let a = class("App", "Foo", &[(1, 1)]);
        let b = class("Other", "Foo", &[(1, 0)]);

        let units = MaxCoverageDedup.merge(&[a, b]);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].key.to_string(), "App::Foo");
        assert_eq!(units[1].key.to_string(), "Other::Foo");
    }

    #[test]
    fn test_assembly_merge_is_line_wise() {
        // Line 3 always covered; A covers 1, B covers 2.
        let a = class("App", "Foo", &[(1, 1), (2, 0), (3, 1)]);
        let b = class("App", "Foo", &[(1, 0), (2, 1), (3, 1)]);

        let units = MaxHitMerge.merge(&[a, b]);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].key, UnitKey::Assembly("App".to_string()));
        assert_eq!(units[0].total(), 3);
        assert_eq!(units[0].covered(), 3);
    }

    #[test]
    fn test_assembly_merge_never_lowers_hits() {
        let a = class("App", "Foo", &[(10, 3)]);
        let b = class("App", "Foo", &[(10, 0)]);

        let units = MaxHitMerge.merge(&[a, b]);
        let id = LineId {
            class: "Foo".to_string(),
            line_number: 10,
        };
        assert_eq!(units[0].lines[&id], 3);
    }

    #[test]
    fn test_assembly_merge_keys_lines_by_class() {
        let a = class("App", "Foo", &[(1, 1)]);
        let b = class("App", "Bar", &[(1, 0)]);

        let units = MaxHitMerge.merge(&[a, b]);
        assert_eq!(units[0].total(), 2);
        assert_eq!(units[0].covered(), 1);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let records = vec![
            class("App", "Foo", &[(1, 1), (2, 0)]),
            class("Lib", "Bar", &[(5, 0), (6, 4)]),
        ];
        let doubled: Vec<ClassCoverage> = records.iter().chain(records.iter()).cloned().collect();

        for granularity in [Granularity::Class, Granularity::Assembly] {
            assert_eq!(merge(&records, granularity), merge(&doubled, granularity));
        }
    }

    #[test]
    fn test_strategy_granularity() {
        assert_eq!(MaxCoverageDedup.granularity(), Granularity::Class);
        assert_eq!(MaxHitMerge.granularity(), Granularity::Assembly);
    }

    #[test]
    fn test_unit_counts_empty() {
        let unit = MergedUnit::new(UnitKey::Assembly("Empty".to_string()));
        assert_eq!(unit.total(), 0);
        assert_eq!(unit.uncovered(), 0);
        assert_eq!(unit.rate(), 0.0);
    }
}
