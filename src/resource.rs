//! Static resource declarations: one named table per endpoint.
//!
//! A resource is declared once at startup and never changes. Column
//! membership is an explicit name-set check, so suffixed filters can be
//! validated without any runtime attribute probing.

use std::collections::{HashMap, HashSet};

/// Primary key column every resource carries. Integer-typed by contract.
pub const PK_COLUMN: &str = "id";

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    /// PostgreSQL type name for `$n::type` casts (e.g. "timestamptz") when
    /// binding loosely typed values.
    pub pg_type: Option<String>,
}

/// A table-backed entity exposed via CRUD endpoints.
#[derive(Clone, Debug)]
pub struct Resource {
    /// URL path segment this resource answers under.
    pub path_segment: String,
    /// SQL table name.
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    column_names: HashSet<String>,
}

impl Resource {
    /// Declare a resource. The `id` primary key column is always present.
    pub fn new(path_segment: impl Into<String>, table: impl Into<String>) -> Self {
        let mut resource = Resource {
            path_segment: path_segment.into(),
            table: table.into(),
            columns: Vec::new(),
            column_names: HashSet::new(),
        };
        resource.push_column(PK_COLUMN, Some("bigint"));
        resource
    }

    /// Add a declared column with its PostgreSQL type.
    pub fn column(mut self, name: &str, pg_type: &str) -> Self {
        self.push_column(name, Some(pg_type));
        self
    }

    /// Add a declared column without a type cast hint.
    pub fn column_untyped(mut self, name: &str) -> Self {
        self.push_column(name, None);
        self
    }

    fn push_column(&mut self, name: &str, pg_type: Option<&str>) {
        if self.column_names.insert(name.to_string()) {
            self.columns.push(ColumnInfo {
                name: name.to_string(),
                pg_type: pg_type.map(String::from),
            });
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.contains(name)
    }

    /// Cast type for a column, if declared with one.
    pub fn pg_type(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.pg_type.as_deref())
    }
}

/// All declared resources, looked up by path segment per request.
#[derive(Clone, Debug, Default)]
pub struct ResourceModel {
    by_path: HashMap<String, Resource>,
}

impl ResourceModel {
    pub fn new(resources: Vec<Resource>) -> Self {
        let by_path = resources
            .into_iter()
            .map(|r| (r.path_segment.clone(), r))
            .collect();
        ResourceModel { by_path }
    }

    pub fn resource_by_path(&self, path: &str) -> Option<&Resource> {
        self.by_path.get(path)
    }
}
