//! `/habits` endpoints: shaped, sorted and paginated reads plus CRUD.

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use devhabit_lib::devhabit_query::{
    apply_sort, shape_collection_data, shape_data, validate_fields, HttpMethod, Link,
    LinkAugmentable, LinkHook, LinkParams, LinkService, PageRequest, PaginationResult, QueryError,
};
use devhabit_lib::dto::{CreateHabitDto, HabitDto, HabitWithTagsDto, UpdateHabitDto};
use devhabit_lib::entities::{Habit, HabitStatus, HabitType};
use devhabit_lib::validation::{
    validate_create_habit, validate_patched_habit, validate_search, validate_update_habit,
};
use devhabit_lib::{apply_patch, HabitQuery, JsonPatch};
use serde::Deserialize;

use super::{negotiated_json, wants_links};
use crate::errors::{ApiError, ApiResult};
use crate::routes::actions;
use crate::state::AppState;

/// Query string accepted by `GET /habits`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitsQueryParameters {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub habit_type: Option<HabitType>,
    pub status: Option<HabitStatus>,
    pub sort: Option<String>,
    pub fields: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Query string accepted by `GET /habits/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct HabitQueryParameters {
    pub fields: Option<String>,
}

fn habit_links(
    links: &LinkService,
    id: &str,
    fields: Option<&str>,
) -> Result<Vec<Link>, QueryError> {
    let by_id = LinkParams::new().with("id", id);
    Ok(vec![
        links.create(
            actions::GET_HABIT,
            "self",
            HttpMethod::Get,
            Some(&by_id.clone().with_opt("fields", fields)),
        )?,
        links.create(actions::UPDATE_HABIT, "update", HttpMethod::Put, Some(&by_id))?,
        links.create(
            actions::PATCH_HABIT,
            "partial-update",
            HttpMethod::Patch,
            Some(&by_id),
        )?,
        links.create(actions::DELETE_HABIT, "delete", HttpMethod::Delete, Some(&by_id))?,
        links.create(
            actions::UPSERT_HABIT_TAGS,
            "upsert-tags",
            HttpMethod::Put,
            Some(&LinkParams::new().with("habitId", id)),
        )?,
    ])
}

/// Every list parameter, re-supplied so paging links keep the same view.
fn collection_params(params: &HabitsQueryParameters, page: i64, page_size: i64) -> LinkParams {
    LinkParams::new()
        .with("page", page)
        .with("pageSize", page_size)
        .with_opt("fields", params.fields.as_deref())
        .with_opt("q", params.q.as_deref())
        .with_opt("sort", params.sort.as_deref())
        .with_opt("type", params.habit_type)
        .with_opt("status", params.status)
}

fn habits_collection_links(
    links: &LinkService,
    params: &HabitsQueryParameters,
    request: PageRequest,
    has_previous_page: bool,
    has_next_page: bool,
) -> Result<Vec<Link>, QueryError> {
    let (page, page_size) = (request.page(), request.page_size());
    let mut result = vec![
        links.create(
            actions::GET_HABITS,
            "self",
            HttpMethod::Get,
            Some(&collection_params(params, page, page_size)),
        )?,
        links.create(actions::CREATE_HABIT, "create", HttpMethod::Post, None)?,
    ];
    if has_next_page {
        result.push(links.create(
            actions::GET_HABITS,
            "next-page",
            HttpMethod::Get,
            Some(&collection_params(params, page + 1, page_size)),
        )?);
    }
    if has_previous_page {
        result.push(links.create(
            actions::GET_HABITS,
            "previous-page",
            HttpMethod::Get,
            Some(&collection_params(params, page - 1, page_size)),
        )?);
    }
    Ok(result)
}

fn invalid_sort(sort: Option<&str>) -> ApiError {
    ApiError::bad_request(format!(
        "The provided sort parameter isn't valid: '{}'",
        sort.unwrap_or_default()
    ))
}

fn invalid_fields(fields: Option<&str>) -> ApiError {
    ApiError::bad_request(format!(
        "The provided data shaping fields aren't valid: '{}'",
        fields.unwrap_or_default()
    ))
}

pub async fn get_habits(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<HabitsQueryParameters>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params?;
    let sort = params.sort.as_deref();
    let fields = params.fields.as_deref();

    if !state
        .sort_registry
        .validate_mappings::<HabitDto, Habit>(sort)?
    {
        tracing::warn!(sort, "rejected sort expression");
        return Err(invalid_sort(sort));
    }
    if !validate_fields::<HabitDto>(fields) {
        tracing::warn!(fields, "rejected field list");
        return Err(invalid_fields(fields));
    }
    let request = PageRequest::new(
        params.page.unwrap_or(PageRequest::DEFAULT_PAGE),
        params.page_size.unwrap_or(PageRequest::DEFAULT_PAGE_SIZE),
    )?;

    let mut query = HabitQuery::new();
    if let Some(search) = validate_search(params.q.as_deref())? {
        query = query.with_search(&search);
    }
    if let Some(habit_type) = params.habit_type {
        query = query.with_type(habit_type);
    }
    if let Some(status) = params.status {
        query = query.with_status(status);
    }
    let mappings = state.sort_registry.get_mappings::<HabitDto, Habit>()?;
    let query = apply_sort(query, sort, mappings);

    let (habits, total_count) = {
        let db = state.db.lock().await;
        (db.query_habits(&query, request)?, db.count_habits(&query)?)
    };
    let dtos: Vec<HabitDto> = habits.iter().map(HabitDto::from).collect();

    let include_links = wants_links(&headers);
    let items = if include_links {
        let links_by_id = dtos
            .iter()
            .map(|dto| Ok((dto.id.as_str(), habit_links(&state.links, &dto.id, fields)?)))
            .collect::<Result<HashMap<&str, Vec<Link>>, QueryError>>()?;
        let hook: LinkHook<'_, HabitDto> = &|dto: &HabitDto| {
            links_by_id
                .get(dto.id.as_str())
                .cloned()
                .unwrap_or_default()
        };
        shape_collection_data(&dtos, fields, Some(hook))
    } else {
        shape_collection_data(&dtos, fields, None)
    };

    let mut result = PaginationResult::new(items, request, total_count);
    if include_links {
        let links = habits_collection_links(
            &state.links,
            &params,
            request,
            result.has_previous_page(),
            result.has_next_page(),
        )?;
        result = result.with_links(links);
    }

    Ok(negotiated_json(StatusCode::OK, &result, include_links))
}

pub async fn get_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    params: Result<Query<HabitQueryParameters>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params?;
    let fields = params.fields.as_deref();
    if !validate_fields::<HabitWithTagsDto>(fields) {
        return Err(invalid_fields(fields));
    }

    let found = state.db.lock().await.get_habit_with_tags(&id)?;
    let Some((habit, tags)) = found else {
        return Err(ApiError::not_found());
    };
    let dto = HabitWithTagsDto {
        habit: HabitDto::from(&habit),
        tags,
    };

    let include_links = wants_links(&headers);
    let record = if include_links {
        let links = habit_links(&state.links, &id, fields)?;
        let hook: LinkHook<'_, HabitWithTagsDto> = &|_: &HabitWithTagsDto| links.clone();
        shape_data(&dto, fields, Some(hook))
    } else {
        shape_data(&dto, fields, None)
    };

    Ok(negotiated_json(StatusCode::OK, &record, include_links))
}

pub async fn create_habit(
    State(state): State<AppState>,
    body: Result<Json<CreateHabitDto>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(create) = body?;
    validate_create_habit(&create)?;

    let habit = create.to_entity(Utc::now());
    state.db.lock().await.insert_habit(&habit)?;
    tracing::info!(id = %habit.id, name = %habit.name, "created habit");

    let mut dto = HabitDto::from(&habit);
    dto.attach_links(habit_links(&state.links, &habit.id, None)?);
    let location = state
        .links
        .create(
            actions::GET_HABIT,
            "self",
            HttpMethod::Get,
            Some(&LinkParams::new().with("id", &habit.id)),
        )?
        .href;

    let mut response = (StatusCode::CREATED, Json(&dto)).into_response();
    let location = HeaderValue::from_str(&location).map_err(|e| {
        tracing::error!(error = %e, "generated location is not a valid header");
        ApiError::internal()
    })?;
    response.headers_mut().insert(header::LOCATION, location);
    Ok(response)
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateHabitDto>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(update) = body?;
    validate_update_habit(&update)?;

    let db = state.db.lock().await;
    let Some(mut habit) = db.get_habit(&id)? else {
        return Err(ApiError::not_found());
    };
    habit.update_from_dto(&update, Utc::now());
    db.update_habit(&habit)?;
    tracing::info!(%id, "updated habit");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn patch_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<JsonPatch>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(patch) = body?;

    let db = state.db.lock().await;
    let Some(mut habit) = db.get_habit(&id)? else {
        return Err(ApiError::not_found());
    };
    let patched = apply_patch(&HabitDto::from(&habit), &patch)?;
    validate_patched_habit(&patched)?;

    habit.apply_patched(&patched, Utc::now());
    db.update_habit(&habit)?;
    tracing::info!(%id, "patched habit");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.db.lock().await.delete_habit(&id)? {
        return Err(ApiError::gone());
    }
    tracing::info!(%id, "deleted habit");
    Ok(StatusCode::NO_CONTENT)
}
