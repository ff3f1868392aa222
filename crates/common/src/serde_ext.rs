//! Serde helpers shared by request types.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A scalar accepted in the forms browsers and scripts send it: `1`, `"1"`
/// and `true` all read as a boolean, `"15"` as an integer.
///
/// A value that cannot be read as `T` deserializes to [`Loose::Invalid`]
/// instead of failing the whole request, so the field can be reported under
/// its own name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loose<T> {
    Value(T),
    Invalid,
}

/// Conversion from a loosely typed JSON scalar.
pub trait FromLoose: Sized {
    fn from_loose(value: &Value) -> Option<Self>;
}

impl FromLoose for bool {
    fn from_loose(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.as_str() {
                "0" => Some(false),
                "1" => Some(true),
                _ => None,
            },
            _ => None,
        }
    }
}

fn loose_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl FromLoose for i32 {
    fn from_loose(value: &Value) -> Option<Self> {
        loose_integer(value).and_then(|n| Self::try_from(n).ok())
    }
}

impl FromLoose for i16 {
    fn from_loose(value: &Value) -> Option<Self> {
        loose_integer(value).and_then(|n| Self::try_from(n).ok())
    }
}

impl<'de, T: FromLoose> Deserialize<'de> for Loose<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(T::from_loose(&value).map_or(Self::Invalid, Self::Value))
    }
}

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent yields `None`, `null` yields `Some(None)`, a value yields
/// `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Deserialize a checkbox-style flag: `true` whenever the key is present,
/// whatever its value.
///
/// Use with `#[serde(default, deserialize_with = "present")]`.
pub fn present<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    IgnoredAny::deserialize(deserializer).map(|_| true)
}
