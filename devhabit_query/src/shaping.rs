//! Data shaping: projecting DTOs down to a client-selected list of fields.
//!
//! Each shapeable type publishes a [`FieldSchema`], a table of named accessor
//! functions built once per type. Selecting fields is a lookup into that
//! table, so no runtime reflection is involved and the declared field order
//! is fixed at compile time.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::links::Link;
use crate::sort::tokens;

/// Loosely-typed output record. Keys keep insertion order.
pub type ShapedRecord = Map<String, Value>;

/// Reserved key under which hypermedia links are attached to shaped records.
pub const LINKS_KEY: &str = "links";

/// Builds the links for one element while shaping.
pub type LinkHook<'a, T> = &'a dyn Fn(&T) -> Vec<Link>;

type Accessor<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;

/// A named field with a typed accessor.
pub struct Field<T> {
    name: &'static str,
    accessor: Accessor<T>,
}

impl<T> Field<T> {
    pub fn new<F>(name: &'static str, accessor: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self {
            name,
            accessor: Box::new(accessor),
        }
    }

    /// Re-exposes a field of an embedded type under the same name, reached
    /// through `via`.
    pub fn nested<U: 'static>(inner: &'static Field<U>, via: fn(&T) -> &U) -> Self
    where
        T: 'static,
    {
        Self {
            name: inner.name,
            accessor: Box::new(move |entity: &T| inner.value_of(via(entity))),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_of(&self, entity: &T) -> Value {
        (self.accessor)(entity)
    }
}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field").field("name", &self.name).finish()
    }
}

/// The declared, ordered fields of a shapeable type, indexed by lowercase name.
#[derive(Debug)]
pub struct FieldSchema<T> {
    fields: Vec<Field<T>>,
    index: HashMap<String, usize>,
}

impl<T> FieldSchema<T> {
    /// Builds a schema from fields in declaration order. A later field with
    /// the same case-insensitive name shadows the earlier one in lookups.
    pub fn new(fields: Vec<Field<T>>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name.to_lowercase(), i))
            .collect();
        Self { fields, index }
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Case-insensitive lookup of a declared field.
    pub fn field(&self, name: &str) -> Option<&Field<T>> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| &self.fields[i])
    }

    /// True when every token of `fields` names a declared field. Absent or
    /// blank input means "all fields" and is valid.
    pub fn validate(&self, fields: Option<&str>) -> bool {
        match fields {
            None => true,
            Some(fields) => tokens(fields).all(|name| self.field(name).is_some()),
        }
    }

    /// Copies the selected fields of `entity` into a record.
    ///
    /// With no selection every declared field is copied in declaration
    /// order; otherwise the requested fields are copied in the order the
    /// caller listed them. Unknown names are skipped.
    pub fn shape(&self, entity: &T, fields: Option<&str>) -> ShapedRecord {
        let mut record = ShapedRecord::new();
        let mut names = fields.into_iter().flat_map(tokens).peekable();

        if names.peek().is_none() {
            for field in &self.fields {
                record.insert(field.name.to_string(), field.value_of(entity));
            }
            return record;
        }

        for name in names {
            if let Some(field) = self.field(name) {
                record.insert(field.name.to_string(), field.value_of(entity));
            }
        }
        record
    }
}

/// A type whose instances can be shaped.
pub trait Shaped: Sized + 'static {
    /// The cached schema for this type.
    fn schema() -> &'static FieldSchema<Self>;
}

/// Checks a client field list against the declared fields of `T`.
pub fn validate_fields<T: Shaped>(fields: Option<&str>) -> bool {
    T::schema().validate(fields)
}

/// Shapes `entity` and lets `post` add computed entries to the record.
pub fn shape_data_with<T, F>(entity: &T, fields: Option<&str>, post: F) -> ShapedRecord
where
    T: Shaped,
    F: FnOnce(&T, &mut ShapedRecord),
{
    let mut record = T::schema().shape(entity, fields);
    post(entity, &mut record);
    record
}

/// Shapes `entity`, attaching the output of `links` under [`LINKS_KEY`].
pub fn shape_data<T: Shaped>(
    entity: &T,
    fields: Option<&str>,
    links: Option<LinkHook<'_, T>>,
) -> ShapedRecord {
    shape_data_with(entity, fields, |entity, record| {
        if let Some(links) = links {
            record.insert(LINKS_KEY.to_string(), links_value(links(entity)));
        }
    })
}

/// Shapes every element of `entities`, preserving order and count.
pub fn shape_collection_data<T: Shaped>(
    entities: &[T],
    fields: Option<&str>,
    links: Option<LinkHook<'_, T>>,
) -> Vec<ShapedRecord> {
    entities
        .iter()
        .map(|entity| shape_data(entity, fields, links))
        .collect()
}

fn links_value(links: Vec<Link>) -> Value {
    Value::Array(
        links
            .into_iter()
            .map(|link| serde_json::to_value(link).unwrap_or(Value::Null))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use serde_json::json;

    use super::*;
    use crate::HttpMethod;

    struct Book {
        id: u32,
        title: String,
        author: Option<String>,
    }

    impl Shaped for Book {
        fn schema() -> &'static FieldSchema<Self> {
            static SCHEMA: LazyLock<FieldSchema<Book>> = LazyLock::new(|| {
                FieldSchema::new(vec![
                    Field::new("id", |b: &Book| json!(b.id)),
                    Field::new("title", |b: &Book| json!(b.title)),
                    Field::new("author", |b: &Book| json!(b.author)),
                ])
            });
            &SCHEMA
        }
    }

    fn book() -> Book {
        Book {
            id: 7,
            title: "Dune".to_string(),
            author: None,
        }
    }

    fn keys(record: &ShapedRecord) -> Vec<&str> {
        record.keys().map(String::as_str).collect()
    }

    #[test]
    fn validate_matches_case_insensitively() {
        assert!(validate_fields::<Book>(Some("ID, Title")));
        assert!(validate_fields::<Book>(None));
        assert!(validate_fields::<Book>(Some("")));
        assert!(!validate_fields::<Book>(Some("id,isbn")));
    }

    #[test]
    fn shape_without_fields_uses_declaration_order() {
        let record = shape_data(&book(), None, None);
        assert_eq!(keys(&record), vec!["id", "title", "author"]);
        assert_eq!(record["author"], Value::Null);
    }

    #[test]
    fn shape_with_fields_uses_requested_order() {
        let record = shape_data(&book(), Some("title,ID"), None);
        assert_eq!(keys(&record), vec!["title", "id"]);
        assert_eq!(record["id"], json!(7));
    }

    #[test]
    fn blank_field_list_means_all_fields() {
        let record = shape_data(&book(), Some(" , "), None);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn link_hook_output_lands_under_reserved_key() {
        let hook = |b: &Book| vec![Link::new(format!("/books/{}", b.id), "self", HttpMethod::Get)];
        let record = shape_data(&book(), Some("id"), Some(&hook));
        assert_eq!(keys(&record), vec!["id", LINKS_KEY]);
        assert_eq!(record[LINKS_KEY][0]["href"], json!("/books/7"));
    }

    struct Shelved {
        book: Book,
        shelf: &'static str,
    }

    fn book_of(shelved: &Shelved) -> &Book {
        &shelved.book
    }

    #[test]
    fn nested_fields_read_through_the_embedded_value() {
        let mut fields: Vec<Field<Shelved>> = Book::schema()
            .fields()
            .iter()
            .map(|f| Field::nested(f, book_of))
            .collect();
        fields.push(Field::new("shelf", |s: &Shelved| json!(s.shelf)));
        let schema = FieldSchema::new(fields);

        let shelved = Shelved {
            book: book(),
            shelf: "sci-fi",
        };
        let record = schema.shape(&shelved, Some("shelf,title"));
        assert_eq!(keys(&record), vec!["shelf", "title"]);
        assert_eq!(record["title"], json!("Dune"));
    }

    #[test]
    fn post_processing_can_add_entries() {
        let record = shape_data_with(&book(), Some("id"), |b, record| {
            record.insert("titleLength".to_string(), json!(b.title.len()));
        });
        assert_eq!(record["titleLength"], json!(4));
    }
}
