use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::dto::{CreateHabitDto, CreateTagDto, HabitDto, TagDto, UpdateHabitDto, UpdateTagDto};
use crate::entities::{FrequencyType, HabitType};
use crate::error::DevHabitError;

pub const MAX_SEARCH_LENGTH: usize = 100;

pub const HABIT_NAME_MIN: usize = 3;
pub const HABIT_NAME_MAX: usize = 100;
pub const HABIT_DESCRIPTION_MAX: usize = 500;

pub const TAG_NAME_MIN: usize = 3;
pub const TAG_NAME_MAX: usize = 50;
pub const TAG_DESCRIPTION_MAX: usize = 50;

/// Units a measurable habit may target.
pub const ALLOWED_UNITS: &[&str] = &[
    "minutes", "hours", "steps", "km", "cal", "pages", "books", "tasks", "sessions",
];

/// Units a binary (done/not-done) habit may target.
pub const ALLOWED_UNITS_FOR_BINARY_HABITS: &[&str] = &["sessions", "tasks"];

/// Per-field validation failures, keyed by camelCase property path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Failures for one field.
    pub fn field(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Remove control characters (Unicode C0 and C1, newlines included) and
/// surrounding whitespace. Inputs over `max_len` bytes are refused up front.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, DevHabitError> {
    if input.len() > max_len {
        return Err(DevHabitError::InvalidInput(format!(
            "search text is longer than {} bytes",
            max_len
        )));
    }
    let printable: String = input.chars().filter(|c| !c.is_control()).collect();
    match printable.trim() {
        "" => Err(DevHabitError::InvalidInput(
            "search text has no printable characters".to_string(),
        )),
        cleaned => Ok(cleaned.to_string()),
    }
}

/// Validate a search string and normalize it for case-insensitive matching.
/// Blank input means "no search".
pub fn validate_search(input: Option<&str>) -> Result<Option<String>, DevHabitError> {
    match input {
        Some(q) if !q.trim().is_empty() => {
            Ok(Some(sanitize_text(q, MAX_SEARCH_LENGTH)?.to_lowercase()))
        }
        _ => Ok(None),
    }
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.trim().chars().count();
    if len == 0 {
        errors.add(field, format!("'{}' must not be empty.", field));
    } else if len < min || len > max {
        errors.add(
            field,
            format!("'{}' must be between {} and {} characters.", field, min, max),
        );
    }
}

fn check_max_length(errors: &mut ValidationErrors, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        if value.chars().count() > max {
            errors.add(
                field,
                format!("'{}' must be {} characters or fewer.", field, max),
            );
        }
    }
}

/// Whether `unit` is allowed for a habit of `habit_type`.
pub fn is_unit_compatible(habit_type: HabitType, unit: &str) -> bool {
    let unit = unit.trim().to_lowercase();
    match habit_type {
        HabitType::Binary => ALLOWED_UNITS_FOR_BINARY_HABITS.contains(&unit.as_str()),
        HabitType::Measurable => ALLOWED_UNITS.contains(&unit.as_str()),
        HabitType::None => false,
    }
}

struct HabitFields<'a> {
    name: &'a str,
    description: Option<&'a str>,
    habit_type: HabitType,
    frequency_type: FrequencyType,
    times_per_period: i64,
    target_value: i64,
    target_unit: &'a str,
    end_date: Option<NaiveDate>,
    milestone_target: Option<i64>,
}

fn validate_habit_fields(fields: HabitFields<'_>, today: NaiveDate) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    check_length(&mut errors, "name", fields.name, HABIT_NAME_MIN, HABIT_NAME_MAX);
    check_max_length(
        &mut errors,
        "description",
        fields.description,
        HABIT_DESCRIPTION_MAX,
    );

    if fields.habit_type == HabitType::None {
        errors.add("type", "Invalid habit type.");
    }
    if fields.frequency_type == FrequencyType::None {
        errors.add("frequency.type", "Invalid frequency period.");
    }
    if fields.times_per_period <= 0 {
        errors.add(
            "frequency.timesPerPeriod",
            "Frequency must be greater than 0.",
        );
    }
    if fields.target_value <= 0 {
        errors.add("target.value", "Target value must be greater than 0.");
    }

    let unit = fields.target_unit.trim().to_lowercase();
    if unit.is_empty() {
        errors.add("target.unit", "'target.unit' must not be empty.");
    } else if !ALLOWED_UNITS.contains(&unit.as_str()) {
        errors.add(
            "target.unit",
            format!("Unit must be one of: {}", ALLOWED_UNITS.join(", ")),
        );
    } else if fields.habit_type != HabitType::None
        && !is_unit_compatible(fields.habit_type, &unit)
    {
        errors.add("target.unit", "Target unit is not compatible with the habit type.");
    }

    if let Some(end_date) = fields.end_date {
        if end_date <= today {
            errors.add("endDate", "End date must be in the future.");
        }
    }
    if let Some(target) = fields.milestone_target {
        if target <= 0 {
            errors.add("milestone.target", "Milestone target must be greater than 0.");
        }
    }

    errors
}

/// Validate a new habit against today's date.
pub fn validate_create_habit(dto: &CreateHabitDto) -> Result<(), ValidationErrors> {
    validate_create_habit_on(dto, Utc::now().date_naive())
}

pub fn validate_create_habit_on(
    dto: &CreateHabitDto,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    validate_habit_fields(
        HabitFields {
            name: &dto.name,
            description: dto.description.as_deref(),
            habit_type: dto.habit_type,
            frequency_type: dto.frequency.frequency_type,
            times_per_period: dto.frequency.times_per_period,
            target_value: dto.target.value,
            target_unit: &dto.target.unit,
            end_date: dto.end_date,
            milestone_target: dto.milestone.map(|m| m.target),
        },
        today,
    )
    .into_result()
}

/// Validate a full habit update against today's date.
pub fn validate_update_habit(dto: &UpdateHabitDto) -> Result<(), ValidationErrors> {
    validate_update_habit_on(dto, Utc::now().date_naive())
}

pub fn validate_update_habit_on(
    dto: &UpdateHabitDto,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    validate_habit_fields(
        HabitFields {
            name: &dto.name,
            description: dto.description.as_deref(),
            habit_type: dto.habit_type,
            frequency_type: dto.frequency.frequency_type,
            times_per_period: dto.frequency.times_per_period,
            target_value: dto.target.value,
            target_unit: &dto.target.unit,
            end_date: dto.end_date,
            milestone_target: dto.milestone.map(|m| m.target),
        },
        today,
    )
    .into_result()
}

/// Validate a habit after a JSON Patch. Only name and description are
/// persisted from a patch, so only those are checked.
pub fn validate_patched_habit(dto: &HabitDto) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_length(&mut errors, "name", &dto.name, HABIT_NAME_MIN, HABIT_NAME_MAX);
    check_max_length(
        &mut errors,
        "description",
        dto.description.as_deref(),
        HABIT_DESCRIPTION_MAX,
    );
    errors.into_result()
}

fn validate_tag_fields(name: &str, description: Option<&str>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_length(&mut errors, "name", name, TAG_NAME_MIN, TAG_NAME_MAX);
    check_max_length(&mut errors, "description", description, TAG_DESCRIPTION_MAX);
    errors.into_result()
}

pub fn validate_create_tag(dto: &CreateTagDto) -> Result<(), ValidationErrors> {
    validate_tag_fields(&dto.name, dto.description.as_deref())
}

pub fn validate_update_tag(dto: &UpdateTagDto) -> Result<(), ValidationErrors> {
    validate_tag_fields(&dto.name, dto.description.as_deref())
}

pub fn validate_patched_tag(dto: &TagDto) -> Result<(), ValidationErrors> {
    validate_tag_fields(&dto.name, dto.description.as_deref())
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
