//! Category Partitioner
//!
//! Groups detection records by category and applies the minimum-confidence
//! floor. The group-by is computed once and shared by the calibrator, the
//! binner and the threshold evaluator.
use crate::data::{DetectionRecord, DetectionTable};
use crate::utils::is_missing;
use hashbrown::HashMap;

#[inline]
fn keep(record: &DetectionRecord, min_conf: f64) -> bool {
    !is_missing(record.confidence) && record.confidence >= min_conf
}

/// Records of `category` with a confidence of at least `min_conf`, in table order.
///
/// An empty result is a valid outcome.
pub fn select_category<'a>(table: &'a DetectionTable, category: &str, min_conf: f64) -> Vec<&'a DetectionRecord> {
    table
        .records()
        .iter()
        .filter(|r| r.category == category && keep(r, min_conf))
        .collect()
}

/// Filtered records of every category in a table.
#[derive(Debug)]
pub struct Partition<'a> {
    min_conf: f64,
    groups: HashMap<&'a str, Vec<&'a DetectionRecord>>,
}

impl<'a> Partition<'a> {
    pub fn new(table: &'a DetectionTable, min_conf: f64) -> Self {
        let mut groups: HashMap<&'a str, Vec<&'a DetectionRecord>> = HashMap::new();
        for record in table.records() {
            let group = groups.entry(record.category.as_str()).or_default();
            if keep(record, min_conf) {
                group.push(record);
            }
        }
        Partition { min_conf, groups }
    }

    pub fn min_conf(&self) -> f64 {
        self.min_conf
    }

    /// Filtered records for a category, empty when the category has none
    /// or is unknown.
    pub fn get(&self, category: &str) -> &[&'a DetectionRecord] {
        self.groups.get(category).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Whether the category appears in the table at all, regardless of the floor.
    pub fn contains(&self, category: &str) -> bool {
        self.groups.contains_key(category)
    }

    /// All categories in the table, sorted.
    pub fn categories(&self) -> Vec<&'a str> {
        let mut categories: Vec<&'a str> = self.groups.keys().copied().collect();
        categories.sort_unstable();
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Label;

    fn table() -> DetectionTable {
        DetectionTable::new(vec![
            DetectionRecord::new("a", 0.5, Label::TruePositive),
            DetectionRecord::new("a", 0.49, Label::TruePositive),
            DetectionRecord::new("b", 0.9, Label::FalsePositive),
            DetectionRecord::new("a", f64::NAN, Label::FalsePositive),
            DetectionRecord::new("a", 0.7, Label::FalsePositive),
            DetectionRecord::new("c", 0.1, Label::FalsePositive),
        ])
        .unwrap()
    }

    #[test]
    fn test_select_category_floor_is_inclusive() {
        let table = table();
        let a = select_category(&table, "a", 0.5);
        let confidences: Vec<f64> = a.iter().map(|r| r.confidence).collect();
        assert_eq!(confidences, vec![0.5, 0.7]);
        assert!(select_category(&table, "missing", 0.5).is_empty());
    }

    #[test]
    fn test_partition_matches_select() {
        let table = table();
        let partition = Partition::new(&table, 0.5);
        for category in ["a", "b", "c", "zzz"] {
            let expected = select_category(&table, category, 0.5);
            assert_eq!(partition.get(category), expected.as_slice());
        }
        assert_eq!(partition.categories(), vec!["a", "b", "c"]);
        assert!(partition.contains("c"));
        assert!(partition.get("c").is_empty());
        assert_eq!(partition.min_conf(), 0.5);
    }
}
