//! Filter and ordering criteria for habit collection reads.

use devhabit_query::{OrderBy, SortDirection, SortableQuery};

use crate::entities::{HabitStatus, HabitType};

/// Builder for the habit list query. Ordering clauses are appended through
/// [`SortableQuery`], normally by [`devhabit_query::apply_sort`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitQuery {
    /// Lowercased text matched against name and description.
    pub search: Option<String>,
    pub habit_type: Option<HabitType>,
    pub status: Option<HabitStatus>,
    pub order_by: OrderBy,
}

impl HabitQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_lowercase());
        self
    }

    pub fn with_type(mut self, habit_type: HabitType) -> Self {
        self.habit_type = Some(habit_type);
        self
    }

    pub fn with_status(mut self, status: HabitStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl SortableQuery for HabitQuery {
    fn then_order_by(mut self, field: &'static str, direction: SortDirection) -> Self {
        self.order_by = self.order_by.then_order_by(field, direction);
        self
    }
}
