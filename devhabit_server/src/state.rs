use std::sync::Arc;

use devhabit_lib::devhabit_query::{LinkService, QueryError, SortMappingRegistry};
use devhabit_lib::{sort_registry, Db};
use tokio::sync::Mutex;
use url::Url;

use crate::routes;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Db>>,
    pub sort_registry: Arc<SortMappingRegistry>,
    pub links: Arc<LinkService>,
}

impl AppState {
    /// Wraps an initialized database and builds the immutable registries.
    pub fn new(db: Db, public_url: Url) -> Result<Self, QueryError> {
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            sort_registry: Arc::new(sort_registry()?),
            links: Arc::new(LinkService::new(routes::url_generator(public_url)?)),
        })
    }
}
