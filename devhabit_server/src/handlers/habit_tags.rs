use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use devhabit_lib::dto::UpsertHabitTagDto;
use devhabit_lib::UpsertOutcome;

use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;

/// Replaces a habit's tag set. 204 when nothing changed, 200 after a write.
pub async fn upsert_habit_tags(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
    body: Result<Json<UpsertHabitTagDto>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(upsert) = body?;
    let tag_ids = upsert.distinct_tag_ids();

    let outcome = state
        .db
        .lock()
        .await
        .upsert_habit_tags(&habit_id, &tag_ids, Utc::now())?;

    match outcome {
        UpsertOutcome::HabitNotFound => Err(ApiError::not_found()),
        UpsertOutcome::Unchanged => Ok(StatusCode::NO_CONTENT),
        UpsertOutcome::UnknownTags(missing) => {
            tracing::warn!(%habit_id, ?missing, "unknown tag ids");
            Err(ApiError::bad_request("One or more tag IDs is invalid"))
        }
        UpsertOutcome::Updated => {
            tracing::info!(%habit_id, count = tag_ids.len(), "replaced habit tags");
            Ok(StatusCode::OK)
        }
    }
}

pub async fn delete_habit_tag(
    State(state): State<AppState>,
    Path((habit_id, tag_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    if !state
        .db
        .lock()
        .await
        .delete_habit_tag(&habit_id, &tag_id)?
    {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
