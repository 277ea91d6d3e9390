//! Route table: action ids, their path templates and the axum router.

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use devhabit_lib::devhabit_query::{QueryError, UrlGenerator};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use url::Url;

use crate::handlers::{habit_tags, habits, tags};
use crate::request_id::attach_request_id;
use crate::state::AppState;

/// Action ids used when generating links.
pub mod actions {
    pub const GET_HABITS: &str = "get-habits";
    pub const GET_HABIT: &str = "get-habit";
    pub const CREATE_HABIT: &str = "create-habit";
    pub const UPDATE_HABIT: &str = "update-habit";
    pub const PATCH_HABIT: &str = "patch-habit";
    pub const DELETE_HABIT: &str = "delete-habit";
    pub const UPSERT_HABIT_TAGS: &str = "upsert-habit-tags";
    pub const GET_TAG: &str = "get-tag";
}

const HABITS: &str = "/habits";
const HABIT: &str = "/habits/{id}";
const HABIT_TAGS: &str = "/habits/{habitId}/tags";
const HABIT_TAG: &str = "/habits/{habitId}/tags/{tagId}";
const TAGS: &str = "/tags";
const TAG: &str = "/tags/{id}";

/// Link URL generator resolving every action against `base`.
pub fn url_generator(base: Url) -> Result<UrlGenerator, QueryError> {
    Ok(UrlGenerator::new(base)?
        .with_route(actions::GET_HABITS, HABITS)
        .with_route(actions::CREATE_HABIT, HABITS)
        .with_route(actions::GET_HABIT, HABIT)
        .with_route(actions::UPDATE_HABIT, HABIT)
        .with_route(actions::PATCH_HABIT, HABIT)
        .with_route(actions::DELETE_HABIT, HABIT)
        .with_route(actions::UPSERT_HABIT_TAGS, HABIT_TAGS)
        .with_route(actions::GET_TAG, TAG))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HABITS, get(habits::get_habits).post(habits::create_habit))
        .route(
            HABIT,
            get(habits::get_habit)
                .put(habits::update_habit)
                .patch(habits::patch_habit)
                .delete(habits::delete_habit),
        )
        .route(HABIT_TAGS, put(habit_tags::upsert_habit_tags))
        .route(HABIT_TAG, axum::routing::delete(habit_tags::delete_habit_tag))
        .route(TAGS, get(tags::get_tags).post(tags::create_tag))
        .route(
            TAG,
            get(tags::get_tag)
                .put(tags::update_tag)
                .patch(tags::patch_tag)
                .delete(tags::delete_tag),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::from_fn(attach_request_id)),
        )
        .with_state(state)
}
