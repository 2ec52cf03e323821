//! JSON <-> CQL value conversion.
//!
//! Parameters arrive as JSON and are bound as the closest CQL value: integers
//! as `bigint`, other numbers as `double`, arrays as lists and objects as
//! text-keyed maps. Whether that fits the target column is up to the server.
//!
//! Result values without a JSON counterpart are rendered in their CQL text
//! form: dates as `YYYY-MM-DD`, times as `HH:MM:SS.nnnnnnnnn`, durations as
//! `1mo2d3ns`, varints and decimals as exact decimal strings.

use scylla::value::{CqlDate, CqlDuration, CqlTime, CqlValue, Row as CqlRow};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::{Error, Result, Row};

/// Converts a bound parameter. `null` binds as a CQL null.
pub(crate) fn to_cql(value: &Value) -> Result<Option<CqlValue>> {
    if value.is_null() {
        return Ok(None);
    }
    to_cql_element(value).map(Some)
}

fn to_cql_element(value: &Value) -> Result<CqlValue> {
    let cql = match value {
        Value::Null => {
            return Err(Error::binding("null is not allowed inside a collection"));
        }
        Value::Bool(b) => CqlValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CqlValue::BigInt(i),
            None => CqlValue::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => CqlValue::Text(s.clone()),
        Value::Array(items) => {
            CqlValue::List(items.iter().map(to_cql_element).collect::<Result<_>>()?)
        }
        Value::Object(entries) => CqlValue::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((CqlValue::Text(k.clone()), to_cql_element(v)?)))
                .collect::<Result<_>>()?,
        ),
    };

    Ok(cql)
}

pub(crate) fn from_cql(value: CqlValue) -> Value {
    match value {
        CqlValue::Ascii(s) | CqlValue::Text(s) => Value::String(s),
        CqlValue::Boolean(b) => Value::Bool(b),
        CqlValue::TinyInt(i) => Value::from(i),
        CqlValue::SmallInt(i) => Value::from(i),
        CqlValue::Int(i) => Value::from(i),
        CqlValue::BigInt(i) => Value::from(i),
        CqlValue::Counter(c) => Value::from(c.0),
        CqlValue::Timestamp(ts) => Value::from(ts.0),
        CqlValue::Float(f) => float(f64::from(f)),
        CqlValue::Double(f) => float(f),
        CqlValue::Uuid(u) => Value::String(u.to_string()),
        CqlValue::Timeuuid(t) => Value::String(Uuid::from(t).to_string()),
        CqlValue::Date(d) => Value::String(date(d)),
        CqlValue::Time(t) => Value::String(time(t)),
        CqlValue::Duration(d) => Value::String(duration(d)),
        CqlValue::Varint(v) => Value::String(varint(v.as_signed_bytes_be_slice())),
        CqlValue::Decimal(d) => {
            let (unscaled, scale) = d.as_signed_be_bytes_slice_and_exponent();
            Value::String(decimal(unscaled, scale))
        }
        CqlValue::Inet(ip) => Value::String(ip.to_string()),
        CqlValue::Blob(bytes) => Value::Array(bytes.into_iter().map(Value::from).collect()),
        CqlValue::Empty => Value::Null,
        CqlValue::List(items) | CqlValue::Set(items) => {
            Value::Array(items.into_iter().map(from_cql).collect())
        }
        CqlValue::Tuple(items) => Value::Array(items.into_iter().map(from_optional).collect()),
        CqlValue::Map(pairs) => from_pairs(pairs),
        CqlValue::UserDefinedType { fields, .. } => Value::Object(
            fields
                .into_iter()
                .map(|(name, value)| (name, from_optional(value)))
                .collect(),
        ),
        // `CqlValue` is non-exhaustive.
        other => Value::String(format!("{other:?}")),
    }
}

fn from_optional(value: Option<CqlValue>) -> Value {
    value.map_or(Value::Null, from_cql)
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

// region:    --- CQL text forms

/// `CqlDate` counts days with the unix epoch at 2^31.
fn date(d: CqlDate) -> String {
    let days = i64::from(d.0) - (1 << 31);

    // Days to civil date, proleptic Gregorian.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!("{year:04}-{month:02}-{day:02}")
}

/// Nanoseconds since midnight.
fn time(t: CqlTime) -> String {
    const NANOS_PER_SEC: i64 = 1_000_000_000;

    let nanos = t.0.rem_euclid(NANOS_PER_SEC);
    let secs = t.0.div_euclid(NANOS_PER_SEC);

    format!(
        "{:02}:{:02}:{:02}.{nanos:09}",
        secs / 3_600,
        secs / 60 % 60,
        secs % 60
    )
}

fn duration(d: CqlDuration) -> String {
    format!("{}mo{}d{}ns", d.months, d.days, d.nanoseconds)
}

/// Two's-complement big-endian bytes as a decimal string.
fn varint(bytes: &[u8]) -> String {
    let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);

    let mut magnitude = bytes.to_vec();
    if negative {
        for b in magnitude.iter_mut() {
            *b = !*b;
        }
        for b in magnitude.iter_mut().rev() {
            let (sum, overflow) = b.overflowing_add(1);
            *b = sum;
            if !overflow {
                break;
            }
        }
    }

    // Base 10^9 limbs, least significant first.
    const BASE: u64 = 1_000_000_000;
    let mut limbs: Vec<u64> = vec![0];
    for byte in magnitude {
        let mut carry = u64::from(byte);
        for limb in limbs.iter_mut() {
            let v = *limb * 256 + carry;
            *limb = v % BASE;
            carry = v / BASE;
        }
        if carry > 0 {
            limbs.push(carry);
        }
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    let mut limbs = limbs.iter().rev();
    if let Some(top) = limbs.next() {
        out.push_str(&top.to_string());
    }
    for limb in limbs {
        out.push_str(&format!("{limb:09}"));
    }

    out
}

/// `unscaled * 10^-scale` without loss.
fn decimal(unscaled: &[u8], scale: i32) -> String {
    let digits = varint(unscaled);
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits.as_str()),
    };

    if scale <= 0 {
        let zeros = if digits == "0" { 0 } else { scale.unsigned_abs() as usize };
        return format!("{sign}{digits}{}", "0".repeat(zeros));
    }

    let scale = scale as usize;
    let digits = format!("{digits:0>width$}", width = scale + 1);
    let (int, frac) = digits.split_at(digits.len() - scale);

    format!("{sign}{int}.{frac}")
}

// endregion: --- CQL text forms

/// Text-keyed maps become objects, anything else a list of `[key, value]`.
fn from_pairs(pairs: Vec<(CqlValue, CqlValue)>) -> Value {
    if pairs
        .iter()
        .all(|(k, _)| matches!(k, CqlValue::Text(_) | CqlValue::Ascii(_)))
    {
        let map: Map<String, Value> = pairs
            .into_iter()
            .filter_map(|(k, v)| match k {
                CqlValue::Text(k) | CqlValue::Ascii(k) => Some((k, from_cql(v))),
                _ => None,
            })
            .collect();
        Value::Object(map)
    } else {
        Value::Array(
            pairs
                .into_iter()
                .map(|(k, v)| Value::Array(vec![from_cql(k), from_cql(v)]))
                .collect(),
        )
    }
}

pub(crate) fn to_row(names: &[String], row: CqlRow) -> Row {
    names
        .iter()
        .cloned()
        .zip(row.columns.into_iter().map(from_optional))
        .collect()
}
