//! Library layer for DevHabit: domain entities, DTOs, validation, JSON Patch
//! and SQLite storage.
//!
//! Builds on the `devhabit_query` crate for sort mappings, data shaping,
//! pagination and hypermedia links.

pub mod db;
pub mod dto;
pub mod entities;
pub mod error;
pub mod patch;
pub mod query;
pub mod sorting;
pub mod validation;

pub use devhabit_query;

pub use db::{Db, DbError, UpsertOutcome};
pub use error::DevHabitError;
pub use patch::{apply_patch, JsonPatch, PatchError, PatchOperation};
pub use query::HabitQuery;
pub use sorting::{sort_registry, HABIT_SORT_MAPPINGS};
pub use validation::ValidationErrors;
