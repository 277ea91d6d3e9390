use serde::{Deserialize, Serialize};

use crate::entities::TagID;

/// Desired complete tag set for a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertHabitTagDto {
    pub tag_ids: Vec<TagID>,
}

impl UpsertHabitTagDto {
    /// Requested ids with duplicates removed, first occurrence kept.
    pub fn distinct_tag_ids(&self) -> Vec<TagID> {
        let mut seen = std::collections::HashSet::new();
        self.tag_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}
