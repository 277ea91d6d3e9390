//! Hypermedia links: [`Link`] descriptors, the [`UrlGenerator`] that turns
//! action ids into URLs, and the [`LinkService`] that combines the two.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::QueryError;

/// HTTP method advertised by a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `{href, rel, method}` descriptor advertising a related action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub method: String,
}

impl Link {
    pub fn new(href: impl Into<String>, rel: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            method: method.to_string(),
        }
    }
}

/// DTOs that carry their own link list.
pub trait LinkAugmentable {
    fn links_mut(&mut self) -> &mut Vec<Link>;

    /// Replaces the carried links.
    fn attach_links(&mut self, links: Vec<Link>) {
        *self.links_mut() = links;
    }
}

/// Ordered parameter bag for URL generation.
///
/// Parameters consumed by route placeholders become path segments; the rest
/// become query pairs in insertion order. `None` values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkParams {
    params: Vec<(&'static str, Option<String>)>,
}

impl LinkParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.params.push((key, Some(value.to_string())));
        self
    }

    pub fn with_opt<V: ToString>(mut self, key: &'static str, value: Option<V>) -> Self {
        self.params.push((key, value.map(|v| v.to_string())));
        self
    }

    /// Returns the first non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.params
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (*k, v)))
    }
}

/// Route table from action ids to path templates like `/habits/{id}`.
#[derive(Debug, Clone)]
pub struct UrlGenerator {
    base: Url,
    routes: HashMap<&'static str, &'static str>,
}

impl UrlGenerator {
    /// Creates a generator resolving every route against `base`.
    pub fn new(base: Url) -> Result<Self, QueryError> {
        if base.cannot_be_a_base() {
            return Err(QueryError::InvalidBaseUrl(base.to_string()));
        }
        Ok(Self {
            base,
            routes: HashMap::new(),
        })
    }

    /// Registers the path template for `action`.
    pub fn with_route(mut self, action: &'static str, template: &'static str) -> Self {
        self.routes.insert(action, template);
        self
    }

    /// Builds the absolute URL for `action` from `params`.
    pub fn url_for(&self, action: &str, params: &LinkParams) -> Result<Url, QueryError> {
        let template = self
            .routes
            .get(action)
            .ok_or_else(|| QueryError::UnknownAction(action.to_string()))?;

        let mut consumed = Vec::new();
        let mut segments = Vec::new();
        for segment in template.split('/').filter(|s| !s.is_empty()) {
            match segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            {
                Some(name) => {
                    let value = params.get(name).filter(|v| !v.is_empty()).ok_or_else(|| {
                        QueryError::MissingRouteParameter {
                            action: action.to_string(),
                            param: name.to_string(),
                        }
                    })?;
                    consumed.push(name);
                    segments.push(value);
                }
                None => segments.push(segment),
            }
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| QueryError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);

        let query: Vec<(&str, &str)> = params
            .pairs()
            .filter(|(k, _)| !consumed.contains(k))
            .collect();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }
}

/// Creates [`Link`]s from action ids.
#[derive(Debug, Clone)]
pub struct LinkService {
    urls: UrlGenerator,
}

impl LinkService {
    pub fn new(urls: UrlGenerator) -> Self {
        Self { urls }
    }

    /// Builds a link for `action` with relation `rel`.
    pub fn create(
        &self,
        action: &str,
        rel: &str,
        method: HttpMethod,
        params: Option<&LinkParams>,
    ) -> Result<Link, QueryError> {
        let empty = LinkParams::new();
        let url = self.urls.url_for(action, params.unwrap_or(&empty))?;
        Ok(Link::new(url.to_string(), rel, method))
    }
}
