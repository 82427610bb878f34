//! Convert serde_json::Value to types that sqlx can bind.

use chrono::{NaiveDateTime, TimeDelta};
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

use crate::codec::{decode_tagged, Tagged};
use crate::error::AppError;

const US_PER_DAY: i64 = 86_400_000_000;

/// A value that can be bound to a PostgreSQL query. Converts from
/// serde_json::Value; tagged temporal objects become native bind types.
#[derive(Clone, Debug)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Timestamp(NaiveDateTime),
    Interval(PgInterval),
    Json(Value),
}

impl PgBindValue {
    pub fn from_json(v: &Value) -> Result<Self, AppError> {
        Ok(match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PgBindValue::I64(i)
                } else if let Some(f) = n.as_f64() {
                    PgBindValue::F64(f)
                } else {
                    PgBindValue::I64(n.as_i64().unwrap_or(0))
                }
            }
            Value::String(s) => PgBindValue::String(s.clone()),
            Value::Object(map) => match decode_tagged(map)? {
                Some(Tagged::DateTime(dt)) => PgBindValue::Timestamp(dt),
                Some(Tagged::TimeDelta(td)) => PgBindValue::Interval(interval_from_timedelta(&td)),
                // Untagged and unknown-tag objects pass through as JSON,
                // tag key intact.
                None => PgBindValue::Json(v.clone()),
            },
            Value::Array(_) => PgBindValue::Json(v.clone()),
        })
    }
}

pub fn interval_from_timedelta(td: &TimeDelta) -> PgInterval {
    let total_us = td
        .num_microseconds()
        .unwrap_or_else(|| td.num_seconds().saturating_mul(1_000_000));
    PgInterval {
        months: 0,
        days: total_us.div_euclid(US_PER_DAY) as i32,
        microseconds: total_us.rem_euclid(US_PER_DAY),
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => <Option<i32> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            PgBindValue::Timestamp(dt) => {
                <NaiveDateTime as Encode<Postgres>>::encode_by_ref(dt, buf)?
            }
            PgBindValue::Interval(iv) => <PgInterval as Encode<Postgres>>::encode_by_ref(iv, buf)?,
            PgBindValue::Json(v) => <serde_json::Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    /// Per-variant wire type, so binds are typed correctly even where the
    /// SQL carries no `$n::type` cast (raw filter columns).
    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Null | PgBindValue::String(_) => PgTypeInfo::with_name("text"),
            PgBindValue::Bool(_) => PgTypeInfo::with_name("bool"),
            PgBindValue::I64(_) => PgTypeInfo::with_name("int8"),
            PgBindValue::F64(_) => PgTypeInfo::with_name("float8"),
            PgBindValue::Timestamp(_) => PgTypeInfo::with_name("timestamp"),
            PgBindValue::Interval(_) => PgTypeInfo::with_name("interval"),
            PgBindValue::Json(_) => PgTypeInfo::with_name("jsonb"),
        })
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("text")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_map_directly() {
        assert!(matches!(PgBindValue::from_json(&json!(null)).unwrap(), PgBindValue::Null));
        assert!(matches!(PgBindValue::from_json(&json!(true)).unwrap(), PgBindValue::Bool(true)));
        assert!(matches!(PgBindValue::from_json(&json!(3)).unwrap(), PgBindValue::I64(3)));
        assert!(matches!(PgBindValue::from_json(&json!("x")).unwrap(), PgBindValue::String(_)));
    }

    #[test]
    fn tagged_datetime_binds_as_timestamp() {
        let v = json!({
            "__type__": "datetime",
            "year": 2020, "month": 1, "day": 2,
            "hour": 3, "minute": 4, "second": 5, "microsecond": 6
        });
        let bound = PgBindValue::from_json(&v).unwrap();
        let PgBindValue::Timestamp(dt) = bound else {
            panic!("expected timestamp, got {:?}", bound)
        };
        assert_eq!(dt.to_string(), "2020-01-02 03:04:05.000006");
    }

    #[test]
    fn tagged_timedelta_binds_as_interval() {
        let v = json!({
            "__type__": "timedelta",
            "days": 1, "hours": 2, "minutes": 0, "seconds": 7200, "microseconds": 3
        });
        let bound = PgBindValue::from_json(&v).unwrap();
        let PgBindValue::Interval(iv) = bound else {
            panic!("expected interval, got {:?}", bound)
        };
        assert_eq!(iv.months, 0);
        assert_eq!(iv.days, 1);
        assert_eq!(iv.microseconds, 7_200_000_003);
    }

    #[test]
    fn unknown_tag_binds_as_json() {
        let v = json!({"__type__": "point", "x": 1});
        let bound = PgBindValue::from_json(&v).unwrap();
        let PgBindValue::Json(j) = bound else {
            panic!("expected json, got {:?}", bound)
        };
        assert_eq!(j["__type__"], "point");
    }

    #[test]
    fn negative_interval_keeps_positive_remainder() {
        let iv = interval_from_timedelta(&TimeDelta::seconds(-1));
        assert_eq!(iv.days, -1);
        assert_eq!(iv.microseconds, 86_399_000_000);
    }
}
