//! Generic population and projection of entities into property maps.
//!
//! Every projectable entity publishes a static table of [`Field`]s. Populating
//! walks the table in declaration order and calls the setter of each field
//! present in the input; projecting calls the getter of each field that is not
//! ignored. Keys without a field, and fields without the needed accessor, are
//! skipped silently.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::error::ContainerError;
use crate::domain::tracking::{Trackable, TrackingRecord, UNKNOWN_REASON};
use crate::domain::UserId;
use crate::{
    CREATED_BY_FIELD_NAME, CREATED_DATE_FIELD_NAME, CREATED_REASON_FIELD_NAME,
    MODIFIED_BY_FIELD_NAME, MODIFIED_DATE_FIELD_NAME, MODIFIED_REASON_FIELD_NAME,
    REVISIONS_FIELD_NAME, SITE_FIELD_NAME,
};

/// Default date format of the `*String` properties, e.g. `2024-03-01T09:15:00+0000`
pub const ISO8601_FORMAT: &'static str = "%Y-%m-%dT%H:%M:%S%z";

/// Creation provenance can't be populated from outside by default
pub const DEFAULT_POPULATE_IGNORE: &[&str] = &[
    CREATED_BY_FIELD_NAME,
    CREATED_DATE_FIELD_NAME,
    CREATED_REASON_FIELD_NAME,
];

/// Serialized form never walks into revisions or the owning site
pub const DEFAULT_SERIALIZE_IGNORE: &[&str] = &[REVISIONS_FIELD_NAME, SITE_FIELD_NAME];

pub type Getter<T> = fn(&T) -> Value;
pub type Setter<T> = fn(&mut T, &Value) -> Result<(), ContainerError>;

/// One property of a projectable entity
pub struct Field<T> {
    pub name: &'static str,
    pub get: Option<Getter<T>>,
    pub set: Option<Setter<T>>,
}

impl<T> Field<T> {
    pub const fn read_only(name: &'static str, get: Getter<T>) -> Self {
        Self { name, get: Some(get), set: None }
    }

    pub const fn read_write(name: &'static str, get: Getter<T>, set: Setter<T>) -> Self {
        Self { name, get: Some(get), set: Some(set) }
    }
}

pub trait Projectable: Clone + Sized + 'static {
    /// property table, in population order
    fn fields() -> &'static [Field<Self>];

    fn populate(&mut self, data: &Map<String, Value>) -> Result<(), ContainerError> {
        self.populate_ignoring(data, DEFAULT_POPULATE_IGNORE)
    }

    /// Either every setter succeeds or `self` stays untouched.
    fn populate_ignoring(
        &mut self,
        data: &Map<String, Value>,
        ignore: &[&str],
    ) -> Result<(), ContainerError> {
        let mut populated = self.clone();
        for field in Self::fields() {
            if ignore.contains(&field.name) {
                continue;
            }
            let (Some(set), Some(value)) = (field.set, data.get(field.name)) else {
                continue;
            };
            set(&mut populated, value)?;
        }
        *self = populated;
        Ok(())
    }

    fn to_map(&self, ignore: &[&str]) -> Map<String, Value> {
        Self::fields()
            .iter()
            .filter(|field| !ignore.contains(&field.name))
            .filter_map(|field| field.get.map(|get| (field.name.to_string(), get(self))))
            .collect()
    }

    fn json_serialize(&self) -> Value {
        Value::Object(self.to_map(DEFAULT_SERIALIZE_IGNORE))
    }
}

// value conversions shared by field tables

pub fn format_date(date: Option<DateTime<Utc>>, format: &str) -> Option<String> {
    date.map(|date| date.format(format).to_string())
}

pub fn date_to_value(date: Option<DateTime<Utc>>) -> Value {
    date.map_or(Value::Null, |date| Value::String(date.to_rfc3339()))
}

pub fn optional_to_value<T: ToString>(value: Option<T>) -> Value {
    value.map_or(Value::Null, |value| Value::String(value.to_string()))
}

pub fn string_from_value(
    field: &'static str,
    value: &Value,
) -> Result<Option<String>, ContainerError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(invalid_field(field, format!("expected a string, got {other}"))),
    }
}

pub fn date_from_value(
    field: &'static str,
    value: &Value,
) -> Result<Option<DateTime<Utc>>, ContainerError> {
    string_from_value(field, value)?
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|date| date.with_timezone(&Utc))
                .map_err(|e| invalid_field(field, format!("bad date '{s}': {e}")))
        })
        .transpose()
}

pub fn i64_from_value(field: &'static str, value: &Value) -> Result<Option<i64>, ContainerError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid_field(field, format!("expected an integer, got {n}"))),
        other => Err(invalid_field(field, format!("expected an integer, got {other}"))),
    }
}

pub fn user_from_value(field: &'static str, value: &Value) -> Result<Option<UserId>, ContainerError> {
    string_from_value(field, value)?
        .map(|s| UserId::try_new(s).map_err(|e| invalid_field(field, e.to_string())))
        .transpose()
}

pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> ContainerError {
    ContainerError::InvalidField { field, reason: reason.into() }
}

/// Creation fields of a stored projection; the creator is mandatory.
pub fn restore_tracking(data: &Map<String, Value>) -> Result<TrackingRecord, ContainerError> {
    let created_by_user_id = data
        .get(CREATED_BY_FIELD_NAME)
        .map(|value| user_from_value(CREATED_BY_FIELD_NAME, value))
        .transpose()?
        .flatten()
        .ok_or_else(|| invalid_field(CREATED_BY_FIELD_NAME, "missing creator"))?;
    let created_date = data
        .get(CREATED_DATE_FIELD_NAME)
        .map(|value| date_from_value(CREATED_DATE_FIELD_NAME, value))
        .transpose()?
        .flatten()
        .unwrap_or_else(Utc::now);
    let created_reason = data
        .get(CREATED_REASON_FIELD_NAME)
        .map(|value| string_from_value(CREATED_REASON_FIELD_NAME, value))
        .transpose()?
        .flatten()
        .unwrap_or_else(|| UNKNOWN_REASON.to_string());

    Ok(TrackingRecord::restore(created_by_user_id, created_date, created_reason))
}

// tracking accessors, shared by every Trackable field table

pub fn get_created_by<T: Trackable>(entity: &T) -> Value {
    Value::String(entity.created_by_user_id().to_string())
}

pub fn get_created_date<T: Trackable>(entity: &T) -> Value {
    date_to_value(Some(entity.created_date()))
}

pub fn get_created_reason<T: Trackable>(entity: &T) -> Value {
    Value::String(entity.created_reason().to_string())
}

pub fn get_modified_by<T: Trackable>(entity: &T) -> Value {
    optional_to_value(entity.modified_by_user_id())
}

pub fn set_modified_by<T: Trackable>(entity: &mut T, value: &Value) -> Result<(), ContainerError> {
    let user = user_from_value(MODIFIED_BY_FIELD_NAME, value)?;
    entity.tracking_mut().set_modified_user(user);
    Ok(())
}

pub fn get_modified_date<T: Trackable>(entity: &T) -> Value {
    date_to_value(entity.modified_date())
}

pub fn set_modified_date<T: Trackable>(entity: &mut T, value: &Value) -> Result<(), ContainerError> {
    let date = date_from_value(MODIFIED_DATE_FIELD_NAME, value)?;
    entity.tracking_mut().set_modified_date(date);
    Ok(())
}

pub fn get_modified_reason<T: Trackable>(entity: &T) -> Value {
    Value::String(entity.modified_reason().to_string())
}

pub fn set_modified_reason<T: Trackable>(entity: &mut T, value: &Value) -> Result<(), ContainerError> {
    let reason = string_from_value(MODIFIED_REASON_FIELD_NAME, value)?;
    entity.tracking_mut().set_modified_reason(reason);
    Ok(())
}
