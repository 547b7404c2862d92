// ============================================================
// Layer 3 — Tagged Record
// ============================================================
// The output of the regex tagger for one judgment:
//
//   facts_vector    — circumstances of the case (model input)
//   demands_vector  — what the parties asked for
//   outcomes_vector — what the tribunal decided (model target)
//
// Every vector of a category has the same length and index
// meaning across the corpus; the IntentIndex names each slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered sequence of feature values.
/// BOOLEAN slots hold 0.0 / 1.0, NUMERIC slots hold any real.
pub type FeatureVector = Vec<f64>;

/// The three vector categories a pattern catalogue is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Facts,
    Demands,
    Outcomes,
}

impl Category {
    /// All categories in catalogue order
    pub const ALL: [Category; 3] = [Category::Facts, Category::Demands, Category::Outcomes];

    /// Key of this category inside a pattern catalogue file
    pub fn regex_key(self) -> &'static str {
        match self {
            Category::Facts    => "regex_facts",
            Category::Demands  => "regex_demands",
            Category::Outcomes => "regex_outcomes",
        }
    }

    /// Name of the vector this category produces
    pub fn vector_name(self) -> &'static str {
        match self {
            Category::Facts    => "facts_vector",
            Category::Demands  => "demands_vector",
            Category::Outcomes => "outcomes_vector",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vector_name())
    }
}

/// One tagged judgment. Immutable once produced by the tagger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedRecord {
    pub document_id:     String,
    pub facts_vector:    FeatureVector,
    pub demands_vector:  FeatureVector,
    pub outcomes_vector: FeatureVector,
}

impl TaggedRecord {
    pub fn new(
        document_id:     impl Into<String>,
        facts_vector:    FeatureVector,
        demands_vector:  FeatureVector,
        outcomes_vector: FeatureVector,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            facts_vector,
            demands_vector,
            outcomes_vector,
        }
    }

    /// Borrow the vector of a given category
    pub fn vector(&self, category: Category) -> &[f64] {
        match category {
            Category::Facts    => &self.facts_vector,
            Category::Demands  => &self.demands_vector,
            Category::Outcomes => &self.outcomes_vector,
        }
    }

    /// True when outcome dimension `column` applies to this case
    pub fn outcome_active(&self, column: usize) -> bool {
        self.outcomes_vector
            .get(column)
            .map(|v| *v != 0.0)
            .unwrap_or(false)
    }
}

/// Activation slots are 0/1; anything above one half counts as set.
pub fn is_active(value: f64) -> bool {
    value > 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_names_match_catalogue_keys() {
        assert_eq!(Category::Facts.vector_name(), "facts_vector");
        assert_eq!(Category::Demands.regex_key(), "regex_demands");
        assert_eq!(Category::Outcomes.to_string(), "outcomes_vector");
    }

    #[test]
    fn test_outcome_active() {
        let r = TaggedRecord::new("1.txt", vec![1.0], vec![0.0], vec![0.0, 1500.0, 1.0]);
        assert!(!r.outcome_active(0));
        assert!(r.outcome_active(1));
        assert!(r.outcome_active(2));
        // Out of range is never active
        assert!(!r.outcome_active(7));
    }

    #[test]
    fn test_is_active_threshold() {
        assert!(is_active(1.0));
        assert!(!is_active(0.0));
    }
}
