//! Request and response shapes exchanged with API clients.

mod habits;
pub use self::habits::{
    CreateHabitDto, CreateMilestoneDto, FrequencyDto, HabitDto, HabitWithTagsDto, MilestoneDto,
    TargetDto, UpdateHabitDto, UpdateMilestoneDto,
};

mod tags;
pub use self::tags::{CreateTagDto, TagDto, TagsCollectionDto, UpdateTagDto};

mod habit_tags;
pub use self::habit_tags::UpsertHabitTagDto;
