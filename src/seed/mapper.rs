use chrono::NaiveDateTime;
use serde_json::Value;

use super::source::RawCollection;
use crate::db::InsertRow;
use crate::error::{GeoError, Result};
use crate::models::{Area, City, District, Neighborhood};

/// Why a single record could not be mapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Missing(&'static str),
    Invalid {
        field: &'static str,
        expected: &'static str,
    },
}

/// Build an insertable row from one raw source record.
///
/// `stamp` fills both audit timestamps.
pub trait FromRecord: Sized {
    fn from_record(record: &Value, stamp: NaiveDateTime) -> std::result::Result<Self, FieldError>;
}

fn field<'a>(record: &'a Value, name: &'static str) -> Option<&'a Value> {
    match record.get(name) {
        None | Some(Value::Null) => None,
        Some(v) => Some(v),
    }
}

fn required_id(record: &Value, name: &'static str) -> std::result::Result<i64, FieldError> {
    let value = field(record, name).ok_or(FieldError::Missing(name))?;
    value.as_i64().ok_or(FieldError::Invalid {
        field: name,
        expected: "an integer",
    })
}

fn required_name(record: &Value, name: &'static str) -> std::result::Result<String, FieldError> {
    let value = field(record, name).ok_or(FieldError::Missing(name))?;
    value.as_str().map(str::to_string).ok_or(FieldError::Invalid {
        field: name,
        expected: "a string",
    })
}

fn optional_area(record: &Value) -> std::result::Result<Option<Area>, FieldError> {
    let Some(value) = field(record, "area") else {
        return Ok(None);
    };
    match value {
        Value::Number(n) => Ok(Some(match n.as_i64() {
            Some(i) => Area::Integer(i),
            None => Area::Real(n.as_f64().unwrap_or_default()),
        })),
        Value::String(s) => Ok(Some(Area::Text(s.clone()))),
        _ => Err(FieldError::Invalid {
            field: "area",
            expected: "a number or string",
        }),
    }
}

fn optional_postal_code(record: &Value) -> std::result::Result<Option<String>, FieldError> {
    match field(record, "postal_code") {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(FieldError::Invalid {
            field: "postal_code",
            expected: "a string",
        }),
    }
}

impl FromRecord for City {
    fn from_record(record: &Value, stamp: NaiveDateTime) -> std::result::Result<Self, FieldError> {
        Ok(City {
            id: required_id(record, "id")?,
            name: required_name(record, "name")?,
            created_at: stamp,
            updated_at: stamp,
        })
    }
}

impl FromRecord for District {
    fn from_record(record: &Value, stamp: NaiveDateTime) -> std::result::Result<Self, FieldError> {
        Ok(District {
            id: required_id(record, "id")?,
            city_id: required_id(record, "city_id")?,
            name: required_name(record, "name")?,
            created_at: stamp,
            updated_at: stamp,
        })
    }
}

impl FromRecord for Neighborhood {
    fn from_record(record: &Value, stamp: NaiveDateTime) -> std::result::Result<Self, FieldError> {
        Ok(Neighborhood {
            id: required_id(record, "id")?,
            district_id: required_id(record, "district_id")?,
            name: required_name(record, "name")?,
            area: optional_area(record)?,
            postal_code: optional_postal_code(record)?,
            created_at: stamp,
            updated_at: stamp,
        })
    }
}

/// Map every record of a collection, in order.
///
/// The first bad record aborts with its position and source path.
pub fn map_collection<R>(collection: &RawCollection, stamp: NaiveDateTime) -> Result<Vec<R>>
where
    R: FromRecord + InsertRow,
{
    collection
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            R::from_record(record, stamp).map_err(|e| match e {
                FieldError::Missing(field) => GeoError::MissingField {
                    level: R::LEVEL,
                    path: collection.path.clone(),
                    index,
                    field,
                },
                FieldError::Invalid { field, expected } => GeoError::InvalidField {
                    level: R::LEVEL,
                    path: collection.path.clone(),
                    index,
                    field,
                    expected,
                },
            })
        })
        .collect()
}
