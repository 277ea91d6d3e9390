//! Error types for the library layer.

use std::fmt;

use crate::db::DbError;
use crate::patch::PatchError;
use crate::validation::ValidationErrors;

/// Errors produced by the library layer, wrapping storage and query-shaping
/// failures and adding input validation and patch failures.
#[derive(Debug)]
pub enum DevHabitError {
    /// A storage operation failed.
    Db(DbError),
    /// A sort or shaping configuration failed.
    Query(devhabit_query::QueryError),
    /// A request body failed field-level validation.
    Validation(ValidationErrors),
    /// A JSON Patch document could not be applied.
    Patch(PatchError),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for DevHabitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Db(e) => write!(f, "Database error: {}", e),
            Self::Query(e) => write!(f, "Query error: {}", e),
            Self::Validation(e) => write!(f, "Validation failed: {}", e),
            Self::Patch(e) => write!(f, "Patch error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for DevHabitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Db(e) => Some(e),
            Self::Query(e) => Some(e),
            Self::Patch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DbError> for DevHabitError {
    fn from(e: DbError) -> Self {
        Self::Db(e)
    }
}

impl From<devhabit_query::QueryError> for DevHabitError {
    fn from(e: devhabit_query::QueryError) -> Self {
        Self::Query(e)
    }
}

impl From<ValidationErrors> for DevHabitError {
    fn from(e: ValidationErrors) -> Self {
        Self::Validation(e)
    }
}

impl From<PatchError> for DevHabitError {
    fn from(e: PatchError) -> Self {
        Self::Patch(e)
    }
}
