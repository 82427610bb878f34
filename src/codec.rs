//! Tagged JSON encoding for values JSON cannot carry natively.
//!
//! Datetimes and durations travel as self-describing objects keyed by
//! `__type__`, so clients can reconstruct them exactly. Stateless pure
//! functions; callers pass values explicitly.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Key marking a JSON object as a tagged value.
pub const TYPE_TAG: &str = "__type__";

const US_PER_DAY: i64 = 86_400_000_000;
const US_PER_SECOND: i64 = 1_000_000;

/// A value reconstructed from a tagged JSON object.
#[derive(Clone, Debug, PartialEq)]
pub enum Tagged {
    DateTime(NaiveDateTime),
    TimeDelta(TimeDelta),
}

/// Calendar/civil components, no timezone normalization: the value keeps
/// whatever zone it was read in.
pub fn encode_datetime(dt: &NaiveDateTime) -> Value {
    serde_json::json!({
        "__type__": "datetime",
        "year": dt.year(),
        "month": dt.month(),
        "day": dt.day(),
        "hour": dt.hour(),
        "minute": dt.minute(),
        "second": dt.second(),
        "microsecond": dt.nanosecond() / 1_000,
    })
}

/// Normalized like a Python timedelta first (days may be negative, the
/// sub-day remainder never is). `hours` and `minutes` duplicate information
/// already present in `seconds`; they stay on the wire for compatibility.
pub fn encode_timedelta(td: &TimeDelta) -> Value {
    let total_us = td
        .num_microseconds()
        .unwrap_or_else(|| td.num_seconds().saturating_mul(US_PER_SECOND));
    let days = total_us.div_euclid(US_PER_DAY);
    let rem_us = total_us.rem_euclid(US_PER_DAY);
    let seconds = rem_us / US_PER_SECOND;
    serde_json::json!({
        "__type__": "timedelta",
        "days": days,
        "hours": seconds / 3600,
        "minutes": (seconds / 60) % 60,
        "seconds": seconds,
        "microseconds": rem_us % US_PER_SECOND,
    })
}

/// Reconstruct a tagged value from a JSON object.
///
/// Returns `Ok(None)` when the object carries no `__type__` key or an
/// unrecognized tag; such objects pass through unchanged rather than
/// erroring. Malformed fields under a known tag are a client error.
pub fn decode_tagged(map: &Map<String, Value>) -> Result<Option<Tagged>, AppError> {
    let Some(tag) = map.get(TYPE_TAG).and_then(Value::as_str) else {
        return Ok(None);
    };
    match tag {
        "datetime" => decode_datetime(map).map(Some),
        "timedelta" => Ok(Some(decode_timedelta(map))),
        _ => Ok(None),
    }
}

fn decode_datetime(map: &Map<String, Value>) -> Result<Tagged, AppError> {
    let year = i32::try_from(required_int(map, "year")?)
        .map_err(|_| AppError::BadRequest("datetime fields out of range".into()))?;
    let month = required_int(map, "month")?;
    let day = required_int(map, "day")?;
    let dt = NaiveDate::from_ymd_opt(year, clamp_u32(month), clamp_u32(day))
        .and_then(|d| {
            d.and_hms_micro_opt(
                clamp_u32(optional_int(map, "hour")),
                clamp_u32(optional_int(map, "minute")),
                clamp_u32(optional_int(map, "second")),
                clamp_u32(optional_int(map, "microsecond")),
            )
        })
        .ok_or_else(|| AppError::BadRequest("datetime fields out of range".into()))?;
    Ok(Tagged::DateTime(dt))
}

/// Total duration from the non-redundant fields. `hours`/`minutes` are
/// derivable from `seconds` on this wire format; summing them as well would
/// count the same time twice and break the encode/decode round trip.
fn decode_timedelta(map: &Map<String, Value>) -> Tagged {
    let total_us = optional_int(map, "days") * US_PER_DAY
        + optional_int(map, "seconds") * US_PER_SECOND
        + optional_int(map, "microseconds");
    Tagged::TimeDelta(TimeDelta::microseconds(total_us))
}

fn required_int(map: &Map<String, Value>, key: &str) -> Result<i64, AppError> {
    map.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| AppError::BadRequest(format!("datetime requires integer '{}'", key)))
}

fn optional_int(map: &Map<String, Value>, key: &str) -> i64 {
    map.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn clamp_u32(n: i64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged_map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn datetime_round_trip() {
        let dt = NaiveDate::from_ymd_opt(2021, 7, 9)
            .unwrap()
            .and_hms_micro_opt(13, 45, 6, 123456)
            .unwrap();
        let encoded = encode_datetime(&dt);
        let decoded = decode_tagged(&tagged_map(encoded)).unwrap().unwrap();
        assert_eq!(decoded, Tagged::DateTime(dt));
    }

    #[test]
    fn datetime_wire_fields() {
        let dt = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 7)
            .unwrap();
        let v = encode_datetime(&dt);
        assert_eq!(v["__type__"], "datetime");
        assert_eq!(v["year"], 1999);
        assert_eq!(v["month"], 12);
        assert_eq!(v["day"], 31);
        assert_eq!(v["hour"], 23);
        assert_eq!(v["minute"], 59);
        assert_eq!(v["second"], 58);
        assert_eq!(v["microsecond"], 7);
    }

    #[test]
    fn timedelta_round_trip() {
        for td in [
            TimeDelta::hours(1),
            TimeDelta::days(2) + TimeDelta::hours(3) + TimeDelta::minutes(4)
                + TimeDelta::seconds(5)
                + TimeDelta::microseconds(6),
            TimeDelta::seconds(59),
            -TimeDelta::hours(25),
            TimeDelta::zero(),
        ] {
            let decoded = decode_tagged(&tagged_map(encode_timedelta(&td))).unwrap().unwrap();
            assert_eq!(decoded, Tagged::TimeDelta(td));
        }
    }

    #[test]
    fn timedelta_wire_keeps_redundant_components() {
        // 1h30m30s: seconds carries the whole sub-day remainder while
        // hours/minutes repeat its breakdown.
        let td = TimeDelta::minutes(90) + TimeDelta::seconds(30);
        let v = encode_timedelta(&td);
        assert_eq!(v["days"], 0);
        assert_eq!(v["hours"], 1);
        assert_eq!(v["minutes"], 30);
        assert_eq!(v["seconds"], 5430);
        assert_eq!(v["microseconds"], 0);
    }

    #[test]
    fn negative_timedelta_normalizes_like_python() {
        // -1 second becomes days=-1 with a positive remainder.
        let v = encode_timedelta(&TimeDelta::seconds(-1));
        assert_eq!(v["days"], -1);
        assert_eq!(v["seconds"], 86399);
    }

    #[test]
    fn unknown_tag_passes_through() {
        let m = tagged_map(serde_json::json!({"__type__": "point", "x": 1}));
        assert_eq!(decode_tagged(&m).unwrap(), None);
    }

    #[test]
    fn untagged_object_passes_through() {
        let m = tagged_map(serde_json::json!({"name": "a"}));
        assert_eq!(decode_tagged(&m).unwrap(), None);
    }

    #[test]
    fn malformed_datetime_is_client_error() {
        let m = tagged_map(serde_json::json!({"__type__": "datetime", "year": 2020}));
        assert!(matches!(
            decode_tagged(&m),
            Err(AppError::BadRequest(_))
        ));
        let m = tagged_map(serde_json::json!({
            "__type__": "datetime", "year": 2020, "month": 13, "day": 1
        }));
        assert!(matches!(decode_tagged(&m), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn datetime_year_beyond_i32_is_client_error() {
        let m = tagged_map(serde_json::json!({
            "__type__": "datetime", "year": (1i64 << 32) + 2020, "month": 1, "day": 1
        }));
        assert!(matches!(decode_tagged(&m), Err(AppError::BadRequest(_))));
    }
}
