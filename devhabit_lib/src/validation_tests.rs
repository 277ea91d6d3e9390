use super::*;
use crate::dto::{CreateMilestoneDto, FrequencyDto, TargetDto};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn valid_habit() -> CreateHabitDto {
    CreateHabitDto {
        name: "Morning run".to_string(),
        description: Some("Run before work".to_string()),
        habit_type: HabitType::Measurable,
        frequency: FrequencyDto {
            frequency_type: FrequencyType::Daily,
            times_per_period: 1,
        },
        target: TargetDto {
            value: 5,
            unit: "km".to_string(),
        },
        end_date: None,
        milestone: None,
    }
}

// -- Text sanitization --

#[test]
fn sanitize_trims_whitespace() {
    assert_eq!(sanitize_text("  run  ", 100).unwrap(), "run");
}

#[test]
fn sanitize_strips_control_characters() {
    assert_eq!(sanitize_text("ru\u{0007}n\n", 100).unwrap(), "run");
}

#[test]
fn sanitize_strips_unicode_controls() {
    assert_eq!(sanitize_text("\u{0085}Éclair\u{009F}", 100).unwrap(), "Éclair");
}

#[test]
fn sanitize_rejects_too_long() {
    assert!(sanitize_text(&"a".repeat(101), 100).is_err());
}

#[test]
fn sanitize_rejects_control_only() {
    assert!(sanitize_text("\u{0001}\u{0002}", 100).is_err());
}

// -- Search --

#[test]
fn search_blank_is_none() {
    assert_eq!(validate_search(None).unwrap(), None);
    assert_eq!(validate_search(Some("   ")).unwrap(), None);
}

#[test]
fn search_is_lowercased() {
    assert_eq!(
        validate_search(Some(" Run ")).unwrap().as_deref(),
        Some("run")
    );
}

#[test]
fn search_folds_non_ascii_case() {
    assert_eq!(
        validate_search(Some("ÉCLAIR")).unwrap().as_deref(),
        Some("éclair")
    );
}

#[test]
fn search_too_long() {
    assert!(validate_search(Some(&"q".repeat(MAX_SEARCH_LENGTH + 1))).is_err());
}

// -- Habits --

#[test]
fn habit_valid() {
    assert!(validate_create_habit_on(&valid_habit(), today()).is_ok());
}

#[test]
fn habit_name_too_short() {
    let mut dto = valid_habit();
    dto.name = "ab".to_string();
    let errors = validate_create_habit_on(&dto, today()).unwrap_err();
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn habit_name_empty() {
    let mut dto = valid_habit();
    dto.name = "   ".to_string();
    let errors = validate_create_habit_on(&dto, today()).unwrap_err();
    assert_eq!(errors.field("name"), ["'name' must not be empty.".to_string()]);
}

#[test]
fn habit_description_too_long() {
    let mut dto = valid_habit();
    dto.description = Some("d".repeat(HABIT_DESCRIPTION_MAX + 1));
    assert!(validate_create_habit_on(&dto, today()).is_err());
}

#[test]
fn habit_type_none_rejected() {
    let mut dto = valid_habit();
    dto.habit_type = HabitType::None;
    let errors = validate_create_habit_on(&dto, today()).unwrap_err();
    assert!(!errors.field("type").is_empty());
    assert!(errors.field("target.unit").is_empty());
}

#[test]
fn habit_frequency_checks() {
    let mut dto = valid_habit();
    dto.frequency.frequency_type = FrequencyType::None;
    dto.frequency.times_per_period = 0;
    let errors = validate_create_habit_on(&dto, today()).unwrap_err();
    assert!(!errors.field("frequency.type").is_empty());
    assert!(!errors.field("frequency.timesPerPeriod").is_empty());
}

#[test]
fn habit_target_value_positive() {
    let mut dto = valid_habit();
    dto.target.value = 0;
    assert!(!validate_create_habit_on(&dto, today())
        .unwrap_err()
        .field("target.value")
        .is_empty());
}

#[test]
fn habit_unknown_unit() {
    let mut dto = valid_habit();
    dto.target.unit = "furlongs".to_string();
    assert!(!validate_create_habit_on(&dto, today())
        .unwrap_err()
        .field("target.unit")
        .is_empty());
}

#[test]
fn habit_unit_case_insensitive() {
    let mut dto = valid_habit();
    dto.target.unit = "KM".to_string();
    assert!(validate_create_habit_on(&dto, today()).is_ok());
}

#[test]
fn binary_habit_restricted_units() {
    let mut dto = valid_habit();
    dto.habit_type = HabitType::Binary;
    assert!(validate_create_habit_on(&dto, today()).is_err());
    dto.target.unit = "sessions".to_string();
    assert!(validate_create_habit_on(&dto, today()).is_ok());
}

#[test]
fn unit_compatibility() {
    assert!(is_unit_compatible(HabitType::Binary, "Tasks"));
    assert!(!is_unit_compatible(HabitType::Binary, "pages"));
    assert!(is_unit_compatible(HabitType::Measurable, "pages"));
    assert!(!is_unit_compatible(HabitType::None, "pages"));
}

#[test]
fn habit_end_date_must_be_future() {
    let mut dto = valid_habit();
    dto.end_date = Some(today());
    assert!(validate_create_habit_on(&dto, today()).is_err());
    dto.end_date = today().succ_opt();
    assert!(validate_create_habit_on(&dto, today()).is_ok());
}

#[test]
fn habit_milestone_target_positive() {
    let mut dto = valid_habit();
    dto.milestone = Some(CreateMilestoneDto { target: 0 });
    assert!(!validate_create_habit_on(&dto, today())
        .unwrap_err()
        .field("milestone.target")
        .is_empty());
}

#[test]
fn errors_collect_every_field() {
    let mut dto = valid_habit();
    dto.name = String::new();
    dto.target.value = -1;
    dto.frequency.times_per_period = -1;
    let errors = validate_create_habit_on(&dto, today()).unwrap_err();
    assert_eq!(
        errors.fields().collect::<Vec<_>>(),
        vec!["frequency.timesPerPeriod", "name", "target.value"]
    );
}

#[test]
fn errors_serialize_as_map() {
    let mut dto = valid_habit();
    dto.name = "ab".to_string();
    let errors = validate_create_habit_on(&dto, today()).unwrap_err();
    let value = serde_json::to_value(&errors).unwrap();
    assert!(value["name"].is_array());
}

// -- Tags --

#[test]
fn tag_valid() {
    let dto = CreateTagDto {
        name: "health".to_string(),
        description: None,
    };
    assert!(validate_create_tag(&dto).is_ok());
}

#[test]
fn tag_name_bounds() {
    let short = UpdateTagDto {
        name: "ab".to_string(),
        description: None,
    };
    assert!(validate_update_tag(&short).is_err());
    let long = UpdateTagDto {
        name: "t".repeat(TAG_NAME_MAX + 1),
        description: None,
    };
    assert!(validate_update_tag(&long).is_err());
}

#[test]
fn tag_description_too_long() {
    let dto = CreateTagDto {
        name: "health".to_string(),
        description: Some("d".repeat(TAG_DESCRIPTION_MAX + 1)),
    };
    assert!(!validate_create_tag(&dto)
        .unwrap_err()
        .field("description")
        .is_empty());
}
