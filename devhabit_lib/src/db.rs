//! SQLite storage for habits, tags and their associations.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use devhabit_query::{PageRequest, SortDirection};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::entities::{
    Frequency, FrequencyType, Habit, HabitStatus, HabitType, Milestone, Ordinal, Tag, TagID,
    Target,
};
use crate::query::HabitQuery;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),
    #[error("invalid {column} value {value}")]
    InvalidEnum { column: &'static str, value: i64 },
    #[error("no column for sort field '{0}'")]
    UnknownSortField(String),
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Result of replacing a habit's tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    HabitNotFound,
    /// The requested set equals the current set; nothing was written.
    Unchanged,
    /// These requested tag ids do not exist; nothing was written.
    UnknownTags(Vec<TagID>),
    Updated,
}

const HABIT_COLUMNS: &str = "h.id, h.name, h.description, h.type, h.frequency_type,
     h.frequency_times_per_period, h.target_value, h.target_unit, h.status,
     h.is_archived, h.end_date, h.milestone_target, h.milestone_current,
     h.created_at_utc, h.updated_at_utc, h.last_completed_at_utc";

const TAG_COLUMNS: &str = "id, name, description, created_at_utc, updated_at_utc";

/// Current layout of `schema/sqlite.sql`, recorded in `user_version`.
const SCHEMA_VERSION: i32 = 1;

/// Storage column for a habit sort path as emitted by the sort mappings.
fn habit_sort_column(field: &str) -> Result<&'static str, DbError> {
    Ok(match field {
        "id" => "h.id",
        "name" => "h.name",
        "description" => "h.description",
        "type" => "h.type",
        "frequency.type" => "h.frequency_type",
        "frequency.timesPerPeriod" => "h.frequency_times_per_period",
        "target.value" => "h.target_value",
        "target.unit" => "h.target_unit",
        "status" => "h.status",
        "isArchived" => "h.is_archived",
        "endDate" => "h.end_date",
        "milestone.target" => "h.milestone_target",
        "milestone.current" => "h.milestone_current",
        "createdAtUtc" => "h.created_at_utc",
        "updatedAtUtc" => "h.updated_at_utc",
        "lastCompletedAtUtc" => "h.last_completed_at_utc",
        other => return Err(DbError::UnknownSortField(other.to_string())),
    })
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn parse_opt_timestamp(s: Option<String>) -> Result<Option<DateTime<Utc>>, DbError> {
    s.as_deref().map(parse_timestamp).transpose()
}

fn ordinal<T: Ordinal>(column: &'static str, value: i64) -> Result<T, DbError> {
    T::from_ordinal(value).ok_or(DbError::InvalidEnum { column, value })
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// A habits row as read from SQLite, before date and enum decoding.
struct HabitRow {
    id: String,
    name: String,
    description: Option<String>,
    habit_type: i64,
    frequency_type: i64,
    times_per_period: i64,
    target_value: i64,
    target_unit: String,
    status: i64,
    is_archived: bool,
    end_date: Option<String>,
    milestone_target: Option<i64>,
    milestone_current: Option<i64>,
    created_at_utc: String,
    updated_at_utc: Option<String>,
    last_completed_at_utc: Option<String>,
}

impl HabitRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            habit_type: row.get(3)?,
            frequency_type: row.get(4)?,
            times_per_period: row.get(5)?,
            target_value: row.get(6)?,
            target_unit: row.get(7)?,
            status: row.get(8)?,
            is_archived: row.get(9)?,
            end_date: row.get(10)?,
            milestone_target: row.get(11)?,
            milestone_current: row.get(12)?,
            created_at_utc: row.get(13)?,
            updated_at_utc: row.get(14)?,
            last_completed_at_utc: row.get(15)?,
        })
    }

    fn into_habit(self) -> Result<Habit, DbError> {
        Ok(Habit {
            id: self.id,
            name: self.name,
            description: self.description,
            habit_type: ordinal::<HabitType>("type", self.habit_type)?,
            frequency: Frequency {
                frequency_type: ordinal::<FrequencyType>("frequency_type", self.frequency_type)?,
                times_per_period: self.times_per_period,
            },
            target: Target {
                value: self.target_value,
                unit: self.target_unit,
            },
            status: ordinal::<HabitStatus>("status", self.status)?,
            is_archived: self.is_archived,
            end_date: self
                .end_date
                .as_deref()
                .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
                .transpose()?,
            milestone: self.milestone_target.map(|target| Milestone {
                target,
                current: self.milestone_current.unwrap_or(0),
            }),
            created_at_utc: parse_timestamp(&self.created_at_utc)?,
            updated_at_utc: parse_opt_timestamp(self.updated_at_utc)?,
            last_completed_at_utc: parse_opt_timestamp(self.last_completed_at_utc)?,
        })
    }
}

struct TagRow {
    id: String,
    name: String,
    description: Option<String>,
    created_at_utc: String,
    updated_at_utc: Option<String>,
}

impl TagRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at_utc: row.get(3)?,
            updated_at_utc: row.get(4)?,
        })
    }

    fn into_tag(self) -> Result<Tag, DbError> {
        Ok(Tag {
            id: self.id,
            name: self.name,
            description: self.description,
            created_at_utc: parse_timestamp(&self.created_at_utc)?,
            updated_at_utc: parse_opt_timestamp(self.updated_at_utc)?,
        })
    }
}

pub struct Db {
    conn: Connection,
}

/// Register `fold_case(text)`, the Unicode lowercase used by habit search.
/// SQLite's built-in `LOWER` only folds ASCII.
fn register_functions(conn: &Connection) -> Result<(), DbError> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )?;
    Ok(())
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        register_functions(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_functions(&conn)?;
        Ok(Self { conn })
    }

    /// Create any missing tables and indexes and stamp the schema version.
    pub fn init(&self) -> Result<(), DbError> {
        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;
        self.conn
            .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    // -- Habits --

    /// WHERE clause and parameters shared by the count and page queries.
    fn habit_filter(query: &HabitQuery) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref search) = query.search {
            params_vec.push(Box::new(format!("%{}%", escape_like(search))));
            let n = params_vec.len();
            sql.push_str(&format!(
                " AND (fold_case(h.name) LIKE ?{n} ESCAPE '\\'
                   OR fold_case(COALESCE(h.description, '')) LIKE ?{n} ESCAPE '\\')"
            ));
        }
        if let Some(habit_type) = query.habit_type {
            params_vec.push(Box::new(habit_type.ordinal()));
            sql.push_str(&format!(" AND h.type = ?{}", params_vec.len()));
        }
        if let Some(status) = query.status {
            params_vec.push(Box::new(status.ordinal()));
            sql.push_str(&format!(" AND h.status = ?{}", params_vec.len()));
        }

        (sql, params_vec)
    }

    fn habit_order_by(query: &HabitQuery) -> Result<String, DbError> {
        let mut parts = Vec::new();
        for clause in query.order_by.clauses() {
            let column = habit_sort_column(clause.field)?;
            let direction = match clause.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            parts.push(format!("{} {}", column, direction));
        }
        // Stable paging across equal sort keys.
        parts.push("h.id ASC".to_string());
        Ok(format!(" ORDER BY {}", parts.join(", ")))
    }

    pub fn count_habits(&self, query: &HabitQuery) -> Result<i64, DbError> {
        let (filter, params_vec) = Self::habit_filter(query);
        let sql = format!("SELECT COUNT(*) FROM habits h{}", filter);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let count = self
            .conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    /// One page of habits matching `query`, in the query's order.
    pub fn query_habits(
        &self,
        query: &HabitQuery,
        page: PageRequest,
    ) -> Result<Vec<Habit>, DbError> {
        let (filter, mut params_vec) = Self::habit_filter(query);
        let order_by = Self::habit_order_by(query)?;
        params_vec.push(Box::new(page.limit()));
        let limit_idx = params_vec.len();
        params_vec.push(Box::new(page.offset()));
        let offset_idx = params_vec.len();

        let sql = format!(
            "SELECT {} FROM habits h{}{} LIMIT ?{} OFFSET ?{}",
            HABIT_COLUMNS, filter, order_by, limit_idx, offset_idx
        );
        tracing::debug!("query_habits: {}", sql);

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), HabitRow::from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?.into_habit()?);
        }
        Ok(result)
    }

    pub fn get_habit(&self, id: &str) -> Result<Option<Habit>, DbError> {
        let sql = format!("SELECT {} FROM habits h WHERE h.id = ?1", HABIT_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], HabitRow::from_row)
            .optional()?;
        row.map(HabitRow::into_habit).transpose()
    }

    /// A habit and the names of its tags, sorted by name.
    pub fn get_habit_with_tags(&self, id: &str) -> Result<Option<(Habit, Vec<String>)>, DbError> {
        let Some(habit) = self.get_habit(id)? else {
            return Ok(None);
        };
        let mut stmt = self.conn.prepare(
            "SELECT t.name FROM habit_tags ht
             JOIN tags t ON t.id = ht.tag_id
             WHERE ht.habit_id = ?1
             ORDER BY t.name",
        )?;
        let tags = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some((habit, tags)))
    }

    pub fn insert_habit(&self, habit: &Habit) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO habits (id, name, description, type, frequency_type,
                 frequency_times_per_period, target_value, target_unit, status,
                 is_archived, end_date, milestone_target, milestone_current,
                 created_at_utc, updated_at_utc, last_completed_at_utc)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                habit.id,
                habit.name,
                habit.description,
                habit.habit_type.ordinal(),
                habit.frequency.frequency_type.ordinal(),
                habit.frequency.times_per_period,
                habit.target.value,
                habit.target.unit,
                habit.status.ordinal(),
                habit.is_archived,
                habit.end_date.map(|d| d.format("%Y-%m-%d").to_string()),
                habit.milestone.map(|m| m.target),
                habit.milestone.map(|m| m.current),
                format_timestamp(&habit.created_at_utc),
                habit.updated_at_utc.as_ref().map(format_timestamp),
                habit.last_completed_at_utc.as_ref().map(format_timestamp),
            ],
        )?;
        Ok(())
    }

    /// Overwrite every mutable column of an existing habit. Returns false when
    /// no row has the habit's id.
    pub fn update_habit(&self, habit: &Habit) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE habits SET name = ?2, description = ?3, type = ?4, frequency_type = ?5,
                 frequency_times_per_period = ?6, target_value = ?7, target_unit = ?8,
                 status = ?9, is_archived = ?10, end_date = ?11, milestone_target = ?12,
                 milestone_current = ?13, updated_at_utc = ?14, last_completed_at_utc = ?15
             WHERE id = ?1",
            params![
                habit.id,
                habit.name,
                habit.description,
                habit.habit_type.ordinal(),
                habit.frequency.frequency_type.ordinal(),
                habit.frequency.times_per_period,
                habit.target.value,
                habit.target.unit,
                habit.status.ordinal(),
                habit.is_archived,
                habit.end_date.map(|d| d.format("%Y-%m-%d").to_string()),
                habit.milestone.map(|m| m.target),
                habit.milestone.map(|m| m.current),
                habit.updated_at_utc.as_ref().map(format_timestamp),
                habit.last_completed_at_utc.as_ref().map(format_timestamp),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete a habit and, by cascade, its tag associations.
    pub fn delete_habit(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    // -- Tags --

    pub fn list_tags(&self) -> Result<Vec<Tag>, DbError> {
        let sql = format!(
            "SELECT {} FROM tags ORDER BY created_at_utc, id",
            TAG_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], TagRow::from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?.into_tag()?);
        }
        Ok(result)
    }

    pub fn get_tag(&self, id: &str) -> Result<Option<Tag>, DbError> {
        let sql = format!("SELECT {} FROM tags WHERE id = ?1", TAG_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], TagRow::from_row)
            .optional()?;
        row.map(TagRow::into_tag).transpose()
    }

    /// Whether another tag already uses `name`. `exclude_id` skips the tag
    /// being renamed.
    pub fn tag_name_exists(&self, name: &str, exclude_id: Option<&str>) -> Result<bool, DbError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tags WHERE name = ?1 AND (?2 IS NULL OR id <> ?2))",
            params![name, exclude_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn insert_tag(&self, tag: &Tag) -> Result<(), DbError> {
        self.conn
            .execute(
                "INSERT INTO tags (id, name, description, created_at_utc, updated_at_utc)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    tag.id,
                    tag.name,
                    tag.description,
                    format_timestamp(&tag.created_at_utc),
                    tag.updated_at_utc.as_ref().map(format_timestamp),
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    DbError::Conflict(format!("tag name '{}' already exists", tag.name))
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    pub fn update_tag(&self, tag: &Tag) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute(
                "UPDATE tags SET name = ?2, description = ?3, updated_at_utc = ?4 WHERE id = ?1",
                params![
                    tag.id,
                    tag.name,
                    tag.description,
                    tag.updated_at_utc.as_ref().map(format_timestamp),
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    DbError::Conflict(format!("tag name '{}' already exists", tag.name))
                } else {
                    e.into()
                }
            })?;
        Ok(changed > 0)
    }

    pub fn delete_tag(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    // -- Habit tags --

    /// Replace a habit's tag set with `tag_ids` in one transaction.
    pub fn upsert_habit_tags(
        &mut self,
        habit_id: &str,
        tag_ids: &[TagID],
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, DbError> {
        let tx = self.conn.transaction()?;

        let habit_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM habits WHERE id = ?1)",
            params![habit_id],
            |row| row.get(0),
        )?;
        if !habit_exists {
            return Ok(UpsertOutcome::HabitNotFound);
        }

        let current: BTreeSet<String> = {
            let mut stmt = tx.prepare("SELECT tag_id FROM habit_tags WHERE habit_id = ?1")?;
            let ids = stmt
                .query_map(params![habit_id], |row| row.get::<_, String>(0))?
                .collect::<Result<BTreeSet<_>, _>>()?;
            ids
        };
        let requested: BTreeSet<String> = tag_ids.iter().cloned().collect();
        if current == requested {
            return Ok(UpsertOutcome::Unchanged);
        }

        let mut missing = Vec::new();
        {
            let mut stmt = tx.prepare("SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?1)")?;
            for id in tag_ids {
                let exists: bool = stmt.query_row(params![id], |row| row.get(0))?;
                if !exists {
                    missing.push(id.clone());
                }
            }
        }
        if !missing.is_empty() {
            return Ok(UpsertOutcome::UnknownTags(missing));
        }

        {
            let mut remove =
                tx.prepare("DELETE FROM habit_tags WHERE habit_id = ?1 AND tag_id = ?2")?;
            for id in current.difference(&requested) {
                remove.execute(params![habit_id, id])?;
            }
            let mut insert = tx.prepare(
                "INSERT INTO habit_tags (habit_id, tag_id, created_at_utc) VALUES (?1, ?2, ?3)",
            )?;
            let created = format_timestamp(&now);
            for id in requested.difference(&current) {
                insert.execute(params![habit_id, id, created])?;
            }
        }

        tx.commit()?;
        Ok(UpsertOutcome::Updated)
    }

    /// Remove one association. Returns false when it did not exist.
    pub fn delete_habit_tag(&self, habit_id: &str, tag_id: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "DELETE FROM habit_tags WHERE habit_id = ?1 AND tag_id = ?2",
            params![habit_id, tag_id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use devhabit_query::apply_sort;

    use crate::sorting::HABIT_SORT_MAPPINGS;

    fn open_test_db() -> Db {
        let db = Db::open_in_memory().expect("open in-memory db");
        db.init().expect("init schema");
        db
    }

    fn columns_of(db: &Db, table: &str) -> Vec<String> {
        let mut stmt = db
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .unwrap();
        let names = stmt
            .query_map([table], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap();
        names
    }

    fn schema_version(db: &Db) -> i32 {
        db.conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap()
    }

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap()
    }

    fn habit(id: &str, name: &str, status: HabitStatus, minute: u32) -> Habit {
        Habit {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            habit_type: HabitType::Measurable,
            frequency: Frequency {
                frequency_type: FrequencyType::Daily,
                times_per_period: 1,
            },
            target: Target {
                value: 10,
                unit: "pages".to_string(),
            },
            status,
            is_archived: false,
            end_date: None,
            milestone: None,
            created_at_utc: ts(minute),
            updated_at_utc: None,
            last_completed_at_utc: None,
        }
    }

    fn tag(id: &str, name: &str, minute: u32) -> Tag {
        Tag {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            created_at_utc: ts(minute),
            updated_at_utc: None,
        }
    }

    #[test]
    fn init_creates_schema() {
        let db = open_test_db();
        assert_eq!(schema_version(&db), SCHEMA_VERSION);
        let habit_columns = columns_of(&db, "habits");
        assert_eq!(habit_columns.len(), 16);
        assert!(habit_columns.iter().any(|c| c == "milestone_current"));
        assert_eq!(
            columns_of(&db, "habit_tags"),
            ["habit_id", "tag_id", "created_at_utc"]
        );
    }

    #[test]
    fn init_is_idempotent() {
        let db = open_test_db();
        db.insert_habit(&habit("h_1", "Read", HabitStatus::Ongoing, 0))
            .unwrap();
        db.init().expect("second init");
        assert_eq!(schema_version(&db), SCHEMA_VERSION);
        assert!(db.get_habit("h_1").unwrap().is_some());
    }

    #[test]
    fn habit_round_trip() {
        let db = open_test_db();
        let mut h = habit("h_1", "Read", HabitStatus::Ongoing, 0);
        h.description = Some("Books".to_string());
        h.end_date = NaiveDate::from_ymd_opt(2030, 5, 1);
        h.milestone = Some(Milestone {
            target: 100,
            current: 7,
        });
        db.insert_habit(&h).unwrap();
        assert_eq!(db.get_habit("h_1").unwrap(), Some(h));
        assert_eq!(db.get_habit("missing").unwrap(), None);
    }

    #[test]
    fn update_and_delete_habit() {
        let db = open_test_db();
        let mut h = habit("h_1", "Read", HabitStatus::Ongoing, 0);
        db.insert_habit(&h).unwrap();
        h.name = "Read more".to_string();
        h.updated_at_utc = Some(ts(5));
        assert!(db.update_habit(&h).unwrap());
        assert_eq!(db.get_habit("h_1").unwrap().unwrap().name, "Read more");

        assert!(db.delete_habit("h_1").unwrap());
        assert!(!db.delete_habit("h_1").unwrap());
        assert!(!db.update_habit(&h).unwrap());
    }

    #[test]
    fn query_filters_and_counts() {
        let db = open_test_db();
        db.insert_habit(&habit("h_1", "Morning Run", HabitStatus::Ongoing, 0))
            .unwrap();
        db.insert_habit(&habit("h_2", "Read", HabitStatus::Completed, 1))
            .unwrap();
        let mut h3 = habit("h_3", "Stretch", HabitStatus::Ongoing, 2);
        h3.description = Some("after the run".to_string());
        h3.habit_type = HabitType::Binary;
        db.insert_habit(&h3).unwrap();

        let query = HabitQuery::new().with_search("RUN");
        assert_eq!(db.count_habits(&query).unwrap(), 2);

        let query = HabitQuery::new().with_status(HabitStatus::Ongoing);
        assert_eq!(db.count_habits(&query).unwrap(), 2);

        let query = HabitQuery::new()
            .with_search("run")
            .with_type(HabitType::Binary);
        let habits = db.query_habits(&query, PageRequest::default()).unwrap();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].id, "h_3");
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let db = open_test_db();
        db.insert_habit(&habit("h_1", "Éclair baking", HabitStatus::Ongoing, 0))
            .unwrap();
        let mut h2 = habit("h_2", "Walk", HabitStatus::Ongoing, 1);
        h2.description = Some("ÜBER die Brücke".to_string());
        db.insert_habit(&h2).unwrap();

        for term in ["éclair", "ÉCLAIR", "Éclair"] {
            let query = HabitQuery::new().with_search(term);
            assert_eq!(db.count_habits(&query).unwrap(), 1, "{}", term);
        }
        let query = HabitQuery::new().with_search("über");
        let habits = db.query_habits(&query, PageRequest::default()).unwrap();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].id, "h_2");
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = open_test_db();
        db.insert_habit(&habit("h_1", "100% effort", HabitStatus::Ongoing, 0))
            .unwrap();
        db.insert_habit(&habit("h_2", "Plain", HabitStatus::Ongoing, 1))
            .unwrap();
        assert_eq!(db.count_habits(&HabitQuery::new().with_search("%")).unwrap(), 1);
        assert_eq!(db.count_habits(&HabitQuery::new().with_search("_")).unwrap(), 0);
    }

    #[test]
    fn query_applies_sort_and_pages() {
        let db = open_test_db();
        for (i, name) in ["Charlie", "alpha", "Bravo", "Delta"].iter().enumerate() {
            db.insert_habit(&habit(
                &format!("h_{}", i),
                name,
                HabitStatus::Ongoing,
                i as u32,
            ))
            .unwrap();
        }
        let query = apply_sort(HabitQuery::new(), Some("createdAtUtc desc"), HABIT_SORT_MAPPINGS);
        let first = db.query_habits(&query, PageRequest::new(1, 3).unwrap()).unwrap();
        let names: Vec<&str> = first.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Delta", "Bravo", "alpha"]);

        let second = db.query_habits(&query, PageRequest::new(2, 3).unwrap()).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "Charlie");

        let beyond = db.query_habits(&query, PageRequest::new(5, 3).unwrap()).unwrap();
        assert!(beyond.is_empty());
    }

    #[test]
    fn unsorted_query_falls_back_to_id_order() {
        let db = open_test_db();
        db.insert_habit(&habit("h_b", "One", HabitStatus::Ongoing, 0))
            .unwrap();
        db.insert_habit(&habit("h_a", "Two", HabitStatus::Ongoing, 1))
            .unwrap();
        let habits = db
            .query_habits(&HabitQuery::new(), PageRequest::default())
            .unwrap();
        assert_eq!(habits[0].id, "h_a");
    }

    #[test]
    fn unknown_sort_field_is_an_error() {
        use devhabit_query::SortableQuery;
        let db = open_test_db();
        let query = HabitQuery::new().then_order_by("tags", SortDirection::Asc);
        assert!(matches!(
            db.query_habits(&query, PageRequest::default()),
            Err(DbError::UnknownSortField(_))
        ));
    }

    #[test]
    fn tag_crud_and_name_uniqueness() {
        let db = open_test_db();
        db.insert_tag(&tag("t_1", "health", 0)).unwrap();
        db.insert_tag(&tag("t_2", "work", 1)).unwrap();

        assert!(db.tag_name_exists("health", None).unwrap());
        assert!(!db.tag_name_exists("health", Some("t_1")).unwrap());
        assert!(matches!(
            db.insert_tag(&tag("t_3", "health", 2)),
            Err(DbError::Conflict(_))
        ));

        let mut renamed = tag("t_2", "health", 1);
        renamed.updated_at_utc = Some(ts(9));
        assert!(matches!(db.update_tag(&renamed), Err(DbError::Conflict(_))));

        let names: Vec<String> = db.list_tags().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["health", "work"]);

        assert!(db.delete_tag("t_2").unwrap());
        assert_eq!(db.get_tag("t_2").unwrap(), None);
    }

    #[test]
    fn upsert_habit_tags_outcomes() {
        let mut db = open_test_db();
        db.insert_habit(&habit("h_1", "Read", HabitStatus::Ongoing, 0))
            .unwrap();
        db.insert_tag(&tag("t_1", "health", 0)).unwrap();
        db.insert_tag(&tag("t_2", "mind", 1)).unwrap();

        assert_eq!(
            db.upsert_habit_tags("missing", &["t_1".to_string()], ts(3))
                .unwrap(),
            UpsertOutcome::HabitNotFound
        );
        assert_eq!(
            db.upsert_habit_tags("h_1", &["t_1".to_string(), "t_9".to_string()], ts(3))
                .unwrap(),
            UpsertOutcome::UnknownTags(vec!["t_9".to_string()])
        );
        assert_eq!(
            db.upsert_habit_tags("h_1", &["t_2".to_string(), "t_1".to_string()], ts(3))
                .unwrap(),
            UpsertOutcome::Updated
        );
        assert_eq!(
            db.upsert_habit_tags("h_1", &["t_1".to_string(), "t_2".to_string()], ts(4))
                .unwrap(),
            UpsertOutcome::Unchanged
        );

        let (_, tags) = db.get_habit_with_tags("h_1").unwrap().unwrap();
        assert_eq!(tags, vec!["health", "mind"]);

        assert_eq!(
            db.upsert_habit_tags("h_1", &["t_2".to_string()], ts(5))
                .unwrap(),
            UpsertOutcome::Updated
        );
        let (_, tags) = db.get_habit_with_tags("h_1").unwrap().unwrap();
        assert_eq!(tags, vec!["mind"]);
    }

    #[test]
    fn deleting_rows_cascades_to_associations() {
        let mut db = open_test_db();
        db.insert_habit(&habit("h_1", "Read", HabitStatus::Ongoing, 0))
            .unwrap();
        db.insert_tag(&tag("t_1", "health", 0)).unwrap();
        db.insert_tag(&tag("t_2", "mind", 1)).unwrap();
        db.upsert_habit_tags("h_1", &["t_1".to_string(), "t_2".to_string()], ts(2))
            .unwrap();

        assert!(db.delete_tag("t_1").unwrap());
        let (_, tags) = db.get_habit_with_tags("h_1").unwrap().unwrap();
        assert_eq!(tags, vec!["mind"]);

        assert!(db.delete_habit_tag("h_1", "t_2").unwrap());
        assert!(!db.delete_habit_tag("h_1", "t_2").unwrap());
    }
}
