//! Habit DTOs and their mappings to and from [`Habit`].

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use devhabit_query::{Field, FieldSchema, Link, LinkAugmentable, Shaped};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entities::{
    new_habit_id, Frequency, FrequencyType, Habit, HabitStatus, HabitType, Milestone, Target,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyDto {
    #[serde(rename = "type")]
    pub frequency_type: FrequencyType,
    pub times_per_period: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDto {
    pub value: i64,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneDto {
    pub target: i64,
    pub current: i64,
}

/// Habit representation returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub habit_type: HabitType,
    pub frequency: FrequencyDto,
    pub target: TargetDto,
    pub status: HabitStatus,
    pub is_archived: bool,
    pub end_date: Option<NaiveDate>,
    pub milestone: Option<MilestoneDto>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
    pub last_completed_at_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl LinkAugmentable for HabitDto {
    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }
}

impl Shaped for HabitDto {
    fn schema() -> &'static FieldSchema<Self> {
        static SCHEMA: LazyLock<FieldSchema<HabitDto>> = LazyLock::new(|| {
            FieldSchema::new(vec![
                Field::new("id", |h: &HabitDto| json!(h.id)),
                Field::new("name", |h: &HabitDto| json!(h.name)),
                Field::new("description", |h: &HabitDto| json!(h.description)),
                Field::new("type", |h: &HabitDto| json!(h.habit_type)),
                Field::new("frequency", |h: &HabitDto| json!(h.frequency)),
                Field::new("target", |h: &HabitDto| json!(h.target)),
                Field::new("status", |h: &HabitDto| json!(h.status)),
                Field::new("isArchived", |h: &HabitDto| json!(h.is_archived)),
                Field::new("endDate", |h: &HabitDto| json!(h.end_date)),
                Field::new("milestone", |h: &HabitDto| json!(h.milestone)),
                Field::new("createdAtUtc", |h: &HabitDto| json!(h.created_at_utc)),
                Field::new("updatedAtUtc", |h: &HabitDto| json!(h.updated_at_utc)),
                Field::new("lastCompletedAtUtc", |h: &HabitDto| {
                    json!(h.last_completed_at_utc)
                }),
            ])
        });
        &SCHEMA
    }
}

/// Habit plus the names of its tags, which always serialize last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitWithTagsDto {
    #[serde(flatten)]
    pub habit: HabitDto,
    pub tags: Vec<String>,
}

fn habit_of(dto: &HabitWithTagsDto) -> &HabitDto {
    &dto.habit
}

impl Shaped for HabitWithTagsDto {
    fn schema() -> &'static FieldSchema<Self> {
        static SCHEMA: LazyLock<FieldSchema<HabitWithTagsDto>> = LazyLock::new(|| {
            let mut fields: Vec<Field<HabitWithTagsDto>> = HabitDto::schema()
                .fields()
                .iter()
                .map(|field| Field::nested(field, habit_of))
                .collect();
            fields.push(Field::new("tags", |h: &HabitWithTagsDto| json!(h.tags)));
            FieldSchema::new(fields)
        });
        &SCHEMA
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitDto {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub habit_type: HabitType,
    pub frequency: FrequencyDto,
    pub target: TargetDto,
    pub end_date: Option<NaiveDate>,
    pub milestone: Option<CreateMilestoneDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMilestoneDto {
    pub target: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabitDto {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub habit_type: HabitType,
    pub frequency: FrequencyDto,
    pub target: TargetDto,
    pub end_date: Option<NaiveDate>,
    pub milestone: Option<UpdateMilestoneDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMilestoneDto {
    pub target: i64,
}

impl From<&Habit> for HabitDto {
    fn from(habit: &Habit) -> Self {
        HabitDto {
            id: habit.id.clone(),
            name: habit.name.clone(),
            description: habit.description.clone(),
            habit_type: habit.habit_type,
            frequency: FrequencyDto {
                frequency_type: habit.frequency.frequency_type,
                times_per_period: habit.frequency.times_per_period,
            },
            target: TargetDto {
                value: habit.target.value,
                unit: habit.target.unit.clone(),
            },
            status: habit.status,
            is_archived: habit.is_archived,
            end_date: habit.end_date,
            milestone: habit.milestone.map(|m| MilestoneDto {
                target: m.target,
                current: m.current,
            }),
            created_at_utc: habit.created_at_utc,
            updated_at_utc: habit.updated_at_utc,
            last_completed_at_utc: habit.last_completed_at_utc,
            links: Vec::new(),
        }
    }
}

impl CreateHabitDto {
    /// Builds a new ongoing, unarchived habit stamped with `now`.
    pub fn to_entity(&self, now: DateTime<Utc>) -> Habit {
        Habit {
            id: new_habit_id(),
            name: self.name.clone(),
            description: self.description.clone(),
            habit_type: self.habit_type,
            frequency: Frequency {
                frequency_type: self.frequency.frequency_type,
                times_per_period: self.frequency.times_per_period,
            },
            target: Target {
                value: self.target.value,
                unit: self.target.unit.clone(),
            },
            status: HabitStatus::Ongoing,
            is_archived: false,
            end_date: self.end_date,
            milestone: self.milestone.map(|m| Milestone {
                target: m.target,
                current: 0,
            }),
            created_at_utc: now,
            updated_at_utc: None,
            last_completed_at_utc: None,
        }
    }
}

impl Habit {
    /// Applies a full update. Milestone progress survives a target change.
    pub fn update_from_dto(&mut self, dto: &UpdateHabitDto, now: DateTime<Utc>) {
        self.name = dto.name.clone();
        self.description = dto.description.clone();
        self.habit_type = dto.habit_type;
        self.frequency = Frequency {
            frequency_type: dto.frequency.frequency_type,
            times_per_period: dto.frequency.times_per_period,
        };
        self.target = Target {
            value: dto.target.value,
            unit: dto.target.unit.clone(),
        };
        self.end_date = dto.end_date;
        self.milestone = dto.milestone.map(|m| Milestone {
            target: m.target,
            current: self.milestone.map(|old| old.current).unwrap_or(0),
        });
        self.updated_at_utc = Some(now);
    }

    /// Copies the patchable fields of a patched DTO back onto the entity.
    pub fn apply_patched(&mut self, dto: &HabitDto, now: DateTime<Utc>) {
        self.name = dto.name.clone();
        self.description = dto.description.clone();
        self.updated_at_utc = Some(now);
    }
}
