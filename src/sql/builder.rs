//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE for a resource.
//!
//! Identifiers are quoted; every value binds as a parameter. Columns declared
//! with a pg_type get a `$n::type` cast so loosely typed JSON values bind
//! correctly.

use serde_json::{Map, Value};

use crate::filter::{FilterOp, Predicate};
use crate::resource::{Resource, PK_COLUMN};

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Clone, Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// 1-based page request; page 1 has offset 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.per_page) * u64::from(self.page.saturating_sub(1))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sort {
    /// Bare column name; quoted, not validated against declared columns.
    pub field: String,
    pub dir: SortDir,
}

/// Placeholder for a bound value, cast to the column's declared type when
/// one is known. String-pattern and array ops bind plain text.
fn placeholder(resource: &Resource, column: &str, n: usize, cast: bool) -> String {
    if cast {
        if let Some(t) = resource.pg_type(column) {
            return format!("${}::{}", n, t);
        }
    }
    format!("${}", n)
}

fn render_predicate(q: &mut QueryBuf, resource: &Resource, p: &Predicate) -> String {
    let col = quoted(&p.column);
    // `= NULL` / `<> NULL` match nothing in SQL; a null filter value means
    // the null rows themselves.
    match (p.op, &p.value) {
        (FilterOp::Eq, Value::Null) => return format!("{} IS NULL", col),
        (FilterOp::Ne, Value::Null) => return format!("{} IS NOT NULL", col),
        _ => {}
    }
    let n = q.push_param(p.value.clone());
    match p.op {
        FilterOp::Eq => format!("{} = {}", col, placeholder(resource, &p.column, n, true)),
        FilterOp::Ne => format!("{} <> {}", col, placeholder(resource, &p.column, n, true)),
        FilterOp::StartsWith => format!("{} LIKE ${} || '%'", col, n),
        FilterOp::Contains => format!("{} LIKE '%' || ${} || '%'", col, n),
        FilterOp::IContains => format!("{} ILIKE '%' || ${} || '%'", col, n),
        FilterOp::Any => format!("${} = ANY({})", n, col),
    }
}

fn select_column_list(resource: &Resource) -> String {
    resource
        .columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Filtered base query: all declared columns, predicates AND-combined,
/// no ordering, no pagination. Both the data and count queries start here.
fn filtered_base(resource: &Resource, predicates: &[Predicate]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_parts: Vec<String> = predicates
        .iter()
        .map(|p| render_predicate(&mut q, resource, p))
        .collect();
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "SELECT {} FROM {}{}",
        select_column_list(resource),
        quoted(&resource.table),
        where_clause
    );
    q
}

/// Data query: filters, then ordering, then LIMIT/OFFSET from the page.
pub fn select_list(
    resource: &Resource,
    predicates: &[Predicate],
    page: Option<&Page>,
    sort: Option<&Sort>,
) -> QueryBuf {
    let mut q = filtered_base(resource, predicates);
    if let Some(sort) = sort {
        q.sql.push_str(&format!(
            " ORDER BY {} {}",
            quoted(&sort.field),
            sort.dir.as_sql()
        ));
    }
    if let Some(page) = page {
        q.sql
            .push_str(&format!(" LIMIT {} OFFSET {}", page.limit(), page.offset()));
    }
    q
}

/// Count query: wraps the unpaginated, unsorted filtered base as a subquery
/// aliased `items`. Shares the data query's filters and nothing else, so the
/// total is stable across pages of one filtered result set.
pub fn select_count(resource: &Resource, predicates: &[Predicate]) -> QueryBuf {
    let mut q = filtered_base(resource, predicates);
    q.sql = format!("SELECT COUNT(*) FROM ({}) AS items", q.sql);
    q
}

/// SELECT one row by primary key.
pub fn select_by_id(resource: &Resource, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(resource),
        quoted(&resource.table),
        quoted(PK_COLUMN),
        placeholder(resource, PK_COLUMN, n, true)
    );
    q
}

/// INSERT from a request body. Only keys matching declared columns are used;
/// unknown keys are silently dropped. Returns the generated primary key.
pub fn insert(resource: &Resource, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &resource.columns {
        let Some(value) = body.get(&c.name) else {
            continue;
        };
        let n = q.push_param(value.clone());
        cols.push(quoted(&c.name));
        placeholders.push(placeholder(resource, &c.name, n, true));
    }
    if cols.is_empty() {
        q.sql = format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(&resource.table),
            quoted(PK_COLUMN)
        );
        return q;
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(&resource.table),
        cols.join(", "),
        placeholders.join(", "),
        quoted(PK_COLUMN)
    );
    q
}

/// UPDATE by primary key: SET exactly the body's keys.
///
/// Unlike insert, keys are NOT filtered by declared-column membership; an
/// undeclared key surfaces as a database error. An empty body degrades to a
/// plain read so callers always get the row back.
pub fn update(resource: &Resource, id: i64, body: &Map<String, Value>) -> QueryBuf {
    if body.is_empty() {
        return select_by_id(resource, id);
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (key, value) in body {
        let n = q.push_param(value.clone());
        sets.push(format!(
            "{} = {}",
            quoted(key),
            placeholder(resource, key, n, true)
        ));
    }
    let id_param = q.push_param(Value::from(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        quoted(&resource.table),
        sets.join(", "),
        quoted(PK_COLUMN),
        id_param
    );
    q
}

/// DELETE by primary key.
pub fn delete_by_id(resource: &Resource, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${}",
        quoted(&resource.table),
        quoted(PK_COLUMN),
        n
    );
    q
}
