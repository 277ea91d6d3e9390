//! Persisted domain entities: habits, tags and the habit-tag join rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a habit (e.g. "h_0192...").
pub type HabitID = String;

/// Unique identifier for a tag (e.g. "t_0192...").
pub type TagID = String;

/// Generates a new, time-ordered habit id.
pub fn new_habit_id() -> HabitID {
    format!("h_{}", Uuid::now_v7())
}

/// Generates a new, time-ordered tag id.
pub fn new_tag_id() -> TagID {
    format!("t_{}", Uuid::now_v7())
}

/// Whether a habit is simply done/not-done or tracks a measured amount.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum HabitType {
    #[serde(rename = "none")]
    #[default]
    None = 0,
    #[serde(rename = "binary")]
    Binary = 1,
    #[serde(rename = "measurable")]
    Measurable = 2,
}

/// Lifecycle state of a habit.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum HabitStatus {
    #[serde(rename = "none")]
    #[default]
    None = 0,
    #[serde(rename = "ongoing")]
    Ongoing = 1,
    #[serde(rename = "completed")]
    Completed = 2,
}

/// Period over which a habit's repetitions are counted.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyType {
    #[serde(rename = "none")]
    #[default]
    None = 0,
    #[serde(rename = "daily")]
    Daily = 1,
    #[serde(rename = "weekly")]
    Weekly = 2,
    #[serde(rename = "monthly")]
    Monthly = 3,
}

/// Ordinal-encoded enums as stored in SQLite.
pub trait Ordinal: Sized + Copy {
    fn ordinal(self) -> i64;
    fn from_ordinal(value: i64) -> Option<Self>;
}

macro_rules! ordinal_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl Ordinal for $name {
            fn ordinal(self) -> i64 {
                self as i64
            }

            fn from_ordinal(value: i64) -> Option<Self> {
                [$($name::$variant),+]
                    .into_iter()
                    .find(|v| *v as i64 == value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let value = serde_json::to_value(self).map_err(|_| std::fmt::Error)?;
                write!(f, "{}", value.as_str().unwrap_or_default())
            }
        }
    };
}

ordinal_enum!(HabitType { None, Binary, Measurable });
ordinal_enum!(HabitStatus { None, Ongoing, Completed });
ordinal_enum!(FrequencyType { None, Daily, Weekly, Monthly });

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    pub frequency_type: FrequencyType,
    pub times_per_period: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub value: i64,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub target: i64,
    pub current: i64,
}

/// A habit row.
#[derive(Debug, Clone, PartialEq)]
pub struct Habit {
    pub id: HabitID,
    pub name: String,
    pub description: Option<String>,
    pub habit_type: HabitType,
    pub frequency: Frequency,
    pub target: Target,
    pub status: HabitStatus,
    pub is_archived: bool,
    pub end_date: Option<NaiveDate>,
    pub milestone: Option<Milestone>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
    pub last_completed_at_utc: Option<DateTime<Utc>>,
}

/// A tag row. Names are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: TagID,
    pub name: String,
    pub description: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_prefix() {
        assert!(new_habit_id().starts_with("h_"));
        assert!(new_tag_id().starts_with("t_"));
        assert_ne!(new_habit_id(), new_habit_id());
    }

    #[test]
    fn ordinals_round_trip() {
        assert_eq!(HabitType::Measurable.ordinal(), 2);
        assert_eq!(HabitType::from_ordinal(1), Some(HabitType::Binary));
        assert_eq!(FrequencyType::from_ordinal(3), Some(FrequencyType::Monthly));
        assert_eq!(HabitStatus::from_ordinal(9), None);
    }

    #[test]
    fn display_uses_wire_names() {
        assert_eq!(HabitStatus::Ongoing.to_string(), "ongoing");
        assert_eq!(FrequencyType::Weekly.to_string(), "weekly");
    }
}
