pub mod habit_tags;
pub mod habits;
pub mod tags;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Media type a client sends in `Accept` to receive hypermedia links.
pub const HATEOAS_JSON: &str = "application/vnd.dev-habit.hateoas+json";

/// Whether the `Accept` header asks for the hypermedia representation.
pub fn wants_links(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|media| media.split(';').next())
        .any(|media| media.trim().eq_ignore_ascii_case(HATEOAS_JSON))
}

/// JSON response labelled with the negotiated media type.
pub fn negotiated_json<T: Serialize>(status: StatusCode, body: &T, hateoas: bool) -> Response {
    let mut response = (status, Json(body)).into_response();
    if hateoas && status.is_success() {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(HATEOAS_JSON));
    }
    response
}
