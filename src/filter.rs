//! Filter grammar: query keys of the form `field__suffix` become column
//! predicates, AND-combined by the query builder.

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::resource::Resource;

const SUFFIX_SEPARATOR: &str = "__";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    /// Exact equality. The default when no suffix is given.
    Eq,
    StartsWith,
    /// Case-sensitive substring match.
    Contains,
    /// Case-insensitive substring match.
    IContains,
    /// Membership in an array-typed column.
    Any,
    Ne,
}

#[derive(Clone, Debug)]
pub struct Predicate {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Translate a `_filters` object into predicates.
///
/// Keys split on the first `__`. A bare key (or one whose `__` is followed
/// by nothing) is exact equality on a raw column reference and is
/// deliberately not checked against the declared columns; a suffixed key
/// must name a declared column. Unrecognized suffixes contribute no
/// predicate.
pub fn parse_filters(
    resource: &Resource,
    filters: &Map<String, Value>,
) -> Result<Vec<Predicate>, AppError> {
    let mut predicates = Vec::with_capacity(filters.len());
    for (key, value) in filters {
        match key.split_once(SUFFIX_SEPARATOR) {
            None => predicates.push(Predicate {
                column: key.clone(),
                op: FilterOp::Eq,
                value: value.clone(),
            }),
            // A trailing separator with nothing after it reads the same as
            // no separator: raw equality on the part before it.
            Some((field, "")) => predicates.push(Predicate {
                column: field.to_string(),
                op: FilterOp::Eq,
                value: value.clone(),
            }),
            Some((field, suffix)) => {
                if !resource.has_column(field) {
                    return Err(AppError::UnknownColumn {
                        column: field.to_string(),
                    });
                }
                let Some(op) = suffix_op(suffix) else {
                    tracing::debug!(key = %key, "ignoring filter with unrecognized suffix");
                    continue;
                };
                predicates.push(Predicate {
                    column: field.to_string(),
                    op,
                    value: value.clone(),
                });
            }
        }
    }
    Ok(predicates)
}

fn suffix_op(suffix: &str) -> Option<FilterOp> {
    match suffix {
        "startswith" => Some(FilterOp::StartsWith),
        "contains" => Some(FilterOp::Contains),
        "icontains" => Some(FilterOp::IContains),
        "any" => Some(FilterOp::Any),
        "ne" => Some(FilterOp::Ne),
        _ => None,
    }
}
