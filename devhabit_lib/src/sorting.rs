//! Sort mapping definitions for every sortable collection.

use devhabit_query::{QueryError, SortMapping, SortMappingRegistry};

use crate::dto::HabitDto;
use crate::entities::Habit;

/// Client-facing `HabitDto` sort fields mapped to `Habit` storage paths.
pub const HABIT_SORT_MAPPINGS: &[SortMapping] = &[
    SortMapping::new("name", &["name"]),
    SortMapping::new("description", &["description"]),
    SortMapping::new("type", &["type"]),
    SortMapping::new("frequency.type", &["frequency.type"]),
    SortMapping::new("frequency.timesPerPeriod", &["frequency.timesPerPeriod"]),
    SortMapping::new("target.value", &["target.value"]),
    SortMapping::new("target.unit", &["target.unit"]),
    SortMapping::new("status", &["status"]),
    SortMapping::new("endDate", &["endDate"]),
    SortMapping::new("milestone", &["milestone.current", "milestone.target"]),
    SortMapping::new("createdAtUtc", &["createdAtUtc"]),
    SortMapping::new("updatedAtUtc", &["updatedAtUtc"]),
    SortMapping::new("lastCompletedAtUtc", &["lastCompletedAtUtc"]),
];

/// Builds the process-wide registry.
pub fn sort_registry() -> Result<SortMappingRegistry, QueryError> {
    SortMappingRegistry::new().with_mappings::<HabitDto, Habit>(HABIT_SORT_MAPPINGS)
}
