//! Process-wide registry of sort mapping sets, keyed by (result, entity) type pair.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use crate::sort::{tokens, SortMapping, SortToken};
use crate::QueryError;

/// The mappings for one (result, entity) pair, checked at construction:
/// every mapping has at least one destination field and source fields are
/// unique ignoring case.
#[derive(Debug, Clone)]
pub struct SortMappingSet {
    result: &'static str,
    entity: &'static str,
    mappings: Vec<SortMapping>,
}

impl SortMappingSet {
    /// Builds the set for result type `R` projected from entity type `E`.
    pub fn new<R: 'static, E: 'static>(mappings: &[SortMapping]) -> Result<Self, QueryError> {
        let result = type_name::<R>();
        let entity = type_name::<E>();
        let invalid = |reason: String| QueryError::InvalidSortMapping {
            result,
            entity,
            reason,
        };

        for (i, mapping) in mappings.iter().enumerate() {
            if mapping.source_field.trim().is_empty() {
                return Err(invalid(format!("mapping #{} has an empty source field", i)));
            }
            if mapping.destination_fields.is_empty() {
                return Err(invalid(format!(
                    "'{}' has no destination fields",
                    mapping.source_field
                )));
            }
            if mappings[..i]
                .iter()
                .any(|earlier| earlier.matches(mapping.source_field))
            {
                return Err(invalid(format!(
                    "'{}' is mapped more than once",
                    mapping.source_field
                )));
            }
        }

        Ok(Self {
            result,
            entity,
            mappings: mappings.to_vec(),
        })
    }

    pub fn mappings(&self) -> &[SortMapping] {
        &self.mappings
    }

    /// True when every token of `sort` names a mapped source field.
    pub fn validate(&self, sort: Option<&str>) -> bool {
        let Some(sort) = sort else {
            return true;
        };
        tokens(sort).all(|raw| {
            SortToken::parse(raw)
                .is_some_and(|token| self.mappings.iter().any(|m| m.matches(token.field)))
        })
    }
}

/// Immutable-after-startup registry of [`SortMappingSet`]s.
///
/// Built once while the process starts and then shared read-only, typically
/// behind an `Arc`.
#[derive(Debug, Default)]
pub struct SortMappingRegistry {
    sets: HashMap<(TypeId, TypeId), SortMappingSet>,
}

impl SortMappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the mappings for result type `R` projected from entity `E`.
    pub fn with_mappings<R: 'static, E: 'static>(
        mut self,
        mappings: &[SortMapping],
    ) -> Result<Self, QueryError> {
        let set = SortMappingSet::new::<R, E>(mappings)?;
        if self
            .sets
            .insert((TypeId::of::<R>(), TypeId::of::<E>()), set)
            .is_some()
        {
            return Err(QueryError::InvalidSortMapping {
                result: type_name::<R>(),
                entity: type_name::<E>(),
                reason: "registered more than once".to_string(),
            });
        }
        tracing::debug!(
            "Registered sort mappings for {} -> {}",
            type_name::<R>(),
            type_name::<E>()
        );
        Ok(self)
    }

    /// Returns the set for (`R`, `E`), or a configuration error when none
    /// was registered.
    pub fn get_set<R: 'static, E: 'static>(&self) -> Result<&SortMappingSet, QueryError> {
        self.sets
            .get(&(TypeId::of::<R>(), TypeId::of::<E>()))
            .ok_or(QueryError::UnregisteredSortMapping {
                result: type_name::<R>(),
                entity: type_name::<E>(),
            })
    }

    /// Returns the ordered mappings for (`R`, `E`).
    pub fn get_mappings<R: 'static, E: 'static>(&self) -> Result<&[SortMapping], QueryError> {
        Ok(self.get_set::<R, E>()?.mappings())
    }

    /// Checks a client sort expression against the mappings for (`R`, `E`).
    ///
    /// Absent or blank expressions are valid. The outer error only reports a
    /// missing registration; an unknown field yields `Ok(false)`.
    pub fn validate_mappings<R: 'static, E: 'static>(
        &self,
        sort: Option<&str>,
    ) -> Result<bool, QueryError> {
        Ok(self.get_set::<R, E>()?.validate(sort))
    }
}
