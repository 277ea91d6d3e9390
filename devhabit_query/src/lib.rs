//! Dynamic query shaping: declarative sort mappings, field selection,
//! pagination envelopes and hypermedia links over any sortable query source.
mod error;
mod links;
mod pagination;
mod registry;
mod shaping;
mod sort;

pub use self::error::QueryError;
pub use self::links::{HttpMethod, Link, LinkAugmentable, LinkParams, LinkService, UrlGenerator};
pub use self::pagination::{PageRequest, PaginationResult};
pub use self::registry::{SortMappingRegistry, SortMappingSet};
pub use self::shaping::{
    shape_collection_data, shape_data, shape_data_with, validate_fields, Field, FieldSchema,
    LinkHook, Shaped, ShapedRecord, LINKS_KEY,
};
pub use self::sort::{apply_sort, OrderBy, OrderClause, SortDirection, SortMapping, SortableQuery};
