use axum::{extract::Request, middleware::Next, response::Response};

use crate::errors::ProblemDetails;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Stamps problem responses with the id assigned to the request.
pub async fn attach_request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;

    match (response.extensions().get::<ProblemDetails>(), request_id) {
        (Some(problem), Some(id)) => {
            let mut problem = problem.clone();
            problem.request_id = Some(id);
            problem.into_response_with(response.status())
        }
        _ => response,
    }
}
