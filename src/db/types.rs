//! MySQL row to JSON conversion.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Per-category decoders handle the actual value extraction
//!
//! Statements without bind parameters travel over the text protocol, so any
//! value a typed decoder rejects is still recoverable as its text form.

use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Date,
    DateTime,
    Time,
    Text,
    Binary,
    Json,
}

/// Classify a MySQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let upper = type_name.to_ascii_uppercase();

    if upper.contains("DECIMAL") || upper.contains("NUMERIC") {
        return TypeCategory::Decimal;
    }

    // The driver names TINYINT(1) "BOOLEAN", but the column can hold any
    // TINYINT value.
    if upper.contains("INT") || upper == "YEAR" || upper == "BOOLEAN" || upper == "BOOL" {
        return TypeCategory::Integer;
    }

    if upper == "FLOAT" || upper == "DOUBLE" || upper == "REAL" {
        return TypeCategory::Float;
    }

    match upper.as_str() {
        "DATE" => return TypeCategory::Date,
        "DATETIME" | "TIMESTAMP" => return TypeCategory::DateTime,
        "TIME" => return TypeCategory::Time,
        "JSON" => return TypeCategory::Json,
        _ => {}
    }

    if upper.contains("BLOB") || upper.contains("BINARY") || upper == "BIT" {
        return TypeCategory::Binary;
    }

    TypeCategory::Text
}

/// Wrapper type for raw DECIMAL values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_ascii_uppercase();
        name.contains("DECIMAL") || name.contains("NUMERIC")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// Render binary data: UTF-8 text when valid, base64 otherwise.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue>;
}

impl RowToJson for MySqlRow {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                (col.name().to_string(), decode_column(self, idx, category))
            })
            .collect()
    }
}

/// Read a column as text by index, accepting VARBINARY-typed results.
///
/// `SHOW` statements report some columns as binary depending on the server
/// charset configuration.
pub fn get_string_by_index(row: &MySqlRow, index: usize) -> Option<String> {
    row.try_get::<Option<String>, _>(index)
        .ok()
        .flatten()
        .or_else(|| {
            row.try_get::<Option<Vec<u8>>, _>(index)
                .ok()
                .flatten()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        })
}

fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    if is_null(row, idx) {
        return JsonValue::Null;
    }

    let decoded = match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Date => decode_date(row, idx),
        TypeCategory::DateTime => decode_datetime(row, idx),
        TypeCategory::Time => decode_time(row, idx),
        TypeCategory::Binary => decode_binary_col(row, idx),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::Text => None,
    };

    decoded.unwrap_or_else(|| decode_text(row, idx))
}

fn is_null(row: &MySqlRow, idx: usize) -> bool {
    use sqlx::ValueRef;

    row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(false)
}

fn decode_decimal(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<RawDecimal, _>(idx)
        .ok()
        .map(|v| JsonValue::String(v.0))
}

fn decode_integer(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<u32, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<i16, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<u16, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<i8, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    row.try_get::<u8, _>(idx)
        .ok()
        .map(|v| JsonValue::Number(v.into()))
}

fn decode_float(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    let v = row
        .try_get::<f64, _>(idx)
        .or_else(|_| row.try_get::<f32, _>(idx).map(f64::from))
        .ok()?;
    Some(
        serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string())),
    )
}

fn decode_date(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<chrono::NaiveDate, _>(idx)
        .ok()
        .map(|d| JsonValue::String(d.to_string()))
}

fn decode_datetime(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<chrono::NaiveDateTime, _>(idx)
        .ok()
        .map(|dt| JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
}

fn decode_time(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<chrono::NaiveTime, _>(idx)
        .ok()
        .map(|t| JsonValue::String(t.to_string()))
}

fn decode_binary_col(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<Vec<u8>, _>(idx)
        .ok()
        .map(|v| decode_binary_value(&v))
}

fn decode_json(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<JsonValue, _>(idx).ok()
}

fn decode_text(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(v) = row.try_get::<String, _>(idx) {
        return JsonValue::String(v);
    }
    // Text protocol: every value arrives as its textual form
    if let Ok(v) = row.try_get_unchecked::<String, _>(idx) {
        return JsonValue::String(v);
    }
    row.try_get_unchecked::<Vec<u8>, _>(idx)
        .map(|v| decode_binary_value(&v))
        .unwrap_or(JsonValue::Null)
}
