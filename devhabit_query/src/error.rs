//! Error types for the query shaping layer.

/// Errors raised while configuring or composing shaped queries.
///
/// Invalid client-supplied sort or field tokens are not errors here: the
/// `validate_*` functions answer with a `bool` and the caller decides how to
/// report the rejection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No sort mapping set was registered for the requested type pair.
    #[error("no sort mapping registered for {result} -> {entity}")]
    UnregisteredSortMapping {
        result: &'static str,
        entity: &'static str,
    },
    /// A sort mapping set broke an invariant when it was registered.
    #[error("invalid sort mapping for {result} -> {entity}: {reason}")]
    InvalidSortMapping {
        result: &'static str,
        entity: &'static str,
        reason: String,
    },
    /// Page or page size outside the accepted range.
    #[error("invalid paging: {0}")]
    InvalidPage(String),
    /// The link composer has no route for this action.
    #[error("unknown link action '{0}'")]
    UnknownAction(String),
    /// A route placeholder had no matching parameter.
    #[error("missing route parameter '{param}' for action '{action}'")]
    MissingRouteParameter { action: String, param: String },
    /// The configured base URL cannot carry path segments.
    #[error("base url cannot be used for links: {0}")]
    InvalidBaseUrl(String),
}
