//! Sort expressions: the [`SortMapping`] rule, the [`SortableQuery`] seam and
//! [`apply_sort`], which expands a client sort expression into ordering clauses.

use std::str::FromStr;

/// Sort order for a single ordering clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (smallest/oldest first). This is the default.
    #[default]
    Asc,
    /// Descending order (largest/newest first).
    Desc,
}

impl SortDirection {
    /// Returns the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(())
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            }
        )
    }
}

/// Maps a client-facing sortable field to one or more storage fields.
///
/// The destination fields form a composite key applied in declared order.
/// A reversed mapping emits the opposite of the requested direction, for
/// storage representations whose natural order runs against the one users
/// expect (ordinal-encoded enums, for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortMapping {
    pub source_field: &'static str,
    pub destination_fields: &'static [&'static str],
    pub reverse: bool,
}

impl SortMapping {
    /// Maps `source_field` onto `destination_fields` in the requested direction.
    pub const fn new(
        source_field: &'static str,
        destination_fields: &'static [&'static str],
    ) -> Self {
        Self {
            source_field,
            destination_fields,
            reverse: false,
        }
    }

    /// Marks the mapping as reversed: a request for ascending order sorts
    /// the destination fields descending, and vice versa.
    pub const fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Case-insensitive match against a client-supplied field name.
    pub fn matches(&self, field: &str) -> bool {
        self.source_field.eq_ignore_ascii_case(field)
    }

    fn effective_direction(&self, requested: SortDirection) -> SortDirection {
        if self.reverse {
            requested.reversed()
        } else {
            requested
        }
    }
}

/// A query that accepts ordering clauses, appended as successive sort keys.
pub trait SortableQuery: Sized {
    /// Appends an ordering on `field`. The first call sets the primary key,
    /// later calls add tie-breakers.
    fn then_order_by(self, field: &'static str, direction: SortDirection) -> Self;
}

/// One ordering clause on a storage field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderClause {
    pub field: &'static str,
    pub direction: SortDirection,
}

/// Ordered list of clauses. Storage backends render it into their own syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy {
    clauses: Vec<OrderClause>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[OrderClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl SortableQuery for OrderBy {
    fn then_order_by(mut self, field: &'static str, direction: SortDirection) -> Self {
        self.clauses.push(OrderClause { field, direction });
        self
    }
}

/// A parsed `field [asc|desc]` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SortToken<'a> {
    pub field: &'a str,
    pub direction: SortDirection,
}

impl<'a> SortToken<'a> {
    /// Parses one comma-separated token. Returns `None` for anything other
    /// than a field name optionally followed by `asc` or `desc`.
    pub(crate) fn parse(raw: &'a str) -> Option<Self> {
        let mut parts = raw.split_whitespace();
        let field = parts.next()?;
        let direction = match parts.next() {
            Some(direction) => direction.parse().ok()?,
            None => SortDirection::Asc,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self { field, direction })
    }
}

/// Splits a comma-separated expression into trimmed, non-empty tokens.
pub(crate) fn tokens(expression: &str) -> impl Iterator<Item = &str> {
    expression
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Applies a client sort expression to `query` using `mappings`.
///
/// An absent or blank expression leaves the query untouched so the caller can
/// apply its own default. Expressions are expected to have passed
/// [`SortMappingRegistry::validate_mappings`](crate::SortMappingRegistry::validate_mappings);
/// tokens that do not resolve to a mapping are skipped.
pub fn apply_sort<Q: SortableQuery>(
    mut query: Q,
    sort: Option<&str>,
    mappings: &[SortMapping],
) -> Q {
    let Some(sort) = sort else {
        return query;
    };

    for raw in tokens(sort) {
        let Some(token) = SortToken::parse(raw) else {
            tracing::debug!("Skipping malformed sort token '{}'", raw);
            continue;
        };
        let Some(mapping) = mappings.iter().find(|m| m.matches(token.field)) else {
            tracing::debug!("Skipping unmapped sort field '{}'", token.field);
            continue;
        };
        let direction = mapping.effective_direction(token.direction);
        for &field in mapping.destination_fields {
            query = query.then_order_by(field, direction);
        }
    }

    query
}
