use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use devhabit_lib::devhabit_query::{HttpMethod, LinkParams};
use devhabit_lib::dto::{CreateTagDto, TagDto, TagsCollectionDto, UpdateTagDto};
use devhabit_lib::validation::{validate_create_tag, validate_patched_tag, validate_update_tag};
use devhabit_lib::{apply_patch, JsonPatch};

use crate::errors::{ApiError, ApiResult};
use crate::routes::actions;
use crate::state::AppState;

fn duplicate_name(name: &str) -> ApiError {
    ApiError::conflict(format!("The tag '{}' already exists.", name))
}

pub async fn get_tags(State(state): State<AppState>) -> ApiResult<Json<TagsCollectionDto>> {
    let tags = state.db.lock().await.list_tags()?;
    Ok(Json(TagsCollectionDto {
        data: tags.iter().map(TagDto::from).collect(),
    }))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TagDto>> {
    match state.db.lock().await.get_tag(&id)? {
        Some(tag) => Ok(Json(TagDto::from(&tag))),
        None => Err(ApiError::not_found()),
    }
}

pub async fn create_tag(
    State(state): State<AppState>,
    body: Result<Json<CreateTagDto>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(create) = body?;
    validate_create_tag(&create)?;

    let tag = create.to_entity(Utc::now());
    {
        let db = state.db.lock().await;
        if db.tag_name_exists(&tag.name, None)? {
            return Err(duplicate_name(&tag.name));
        }
        db.insert_tag(&tag)?;
    }
    tracing::info!(id = %tag.id, name = %tag.name, "created tag");

    let location = state
        .links
        .create(
            actions::GET_TAG,
            "self",
            HttpMethod::Get,
            Some(&LinkParams::new().with("id", &tag.id)),
        )?
        .href;
    let location = HeaderValue::from_str(&location).map_err(|e| {
        tracing::error!(error = %e, "generated location is not a valid header");
        ApiError::internal()
    })?;

    let mut response = (StatusCode::CREATED, Json(TagDto::from(&tag))).into_response();
    response.headers_mut().insert(header::LOCATION, location);
    Ok(response)
}

pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateTagDto>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(update) = body?;
    validate_update_tag(&update)?;

    let db = state.db.lock().await;
    let Some(mut tag) = db.get_tag(&id)? else {
        return Err(ApiError::not_found());
    };
    if db.tag_name_exists(&update.name, Some(&id))? {
        return Err(duplicate_name(&update.name));
    }
    tag.update_from_dto(&update, Utc::now());
    db.update_tag(&tag)?;
    tracing::info!(%id, "updated tag");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn patch_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<JsonPatch>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(patch) = body?;

    let db = state.db.lock().await;
    let Some(mut tag) = db.get_tag(&id)? else {
        return Err(ApiError::not_found());
    };
    let patched = apply_patch(&TagDto::from(&tag), &patch)?;
    validate_patched_tag(&patched)?;
    if db.tag_name_exists(&patched.name, Some(&id))? {
        return Err(duplicate_name(&patched.name));
    }

    tag.apply_patched(&patched, Utc::now());
    db.update_tag(&tag)?;
    tracing::info!(%id, "patched tag");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.db.lock().await.delete_tag(&id)? {
        return Err(ApiError::gone());
    }
    tracing::info!(%id, "deleted tag");
    Ok(StatusCode::NO_CONTENT)
}
