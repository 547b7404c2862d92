// ============================================================
// Layer 3 — Intent Index and Column Label Table
// ============================================================
// The IntentIndex names every slot of every vector category:
//
//   "facts_vector"    → [(0, "tenant_owes_rent"), (1, ...), ...]
//   "demands_vector"  → [...]
//   "outcomes_vector" → [...]
//
// It is derived once from the compiled pattern catalogue, so it
// can never drift from how the tagger builds vectors.
//
// The ColumnLabelTable is the outcomes slice of that index. It
// decides which regressor handles which outcome position and is
// handed to the classifier, ensemble and resolver explicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::record::Category;

/// Vector name → ordered (position, label) pairs
pub type IntentIndex = BTreeMap<String, Vec<(usize, String)>>;

/// One named outcome column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabel {
    pub index: usize,
    pub name:  String,
}

/// Ordered outcome column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabelTable {
    columns: Vec<ColumnLabel>,
}

impl ColumnLabelTable {
    /// Build a table from names in column order
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| ColumnLabel { index, name: name.into() })
            .collect();
        Self { columns }
    }

    /// Take the outcomes entry of an intent index.
    /// Returns an empty table if the index has no outcomes vector.
    pub fn from_intent_index(index: &IntentIndex) -> Self {
        let names = index
            .get(Category::Outcomes.vector_name())
            .map(|pairs| pairs.iter().map(|(_, label)| label.clone()).collect::<Vec<_>>())
            .unwrap_or_default();
        Self::from_names(names)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Semantic name of a column, if the column exists
    pub fn name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|c| c.name.as_str())
    }

    /// Position of a named column
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnLabel> {
        self.columns.iter()
    }
}
