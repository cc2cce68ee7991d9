//! Lenient integer decoding for request bodies.
//!
//! Browser clients send identifiers either as JSON numbers or as numeric strings (the latter
//! is what they get back when a row id was echoed as text). Both are accepted.

use serde::{Deserialize, Deserializer, Serialize};

/// An integer that deserialises from a JSON number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FlexInt(pub i64);

impl FlexInt {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for FlexInt {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInt {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawInt {
    /// `Ok(None)` for blank text, which callers treat as a missing field.
    fn into_int(self) -> Result<Option<i64>, String> {
        match self {
            RawInt::Int(v) => Ok(Some(v)),
            RawInt::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(Some(f as i64)),
            RawInt::Float(f) => Err(format!("expected an integer, got {f}")),
            RawInt::Text(s) if s.trim().is_empty() => Ok(None),
            RawInt::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| format!("expected an integer, got {s:?}")),
        }
    }
}

impl<'de> Deserialize<'de> for FlexInt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawInt::deserialize(deserializer)?
            .into_int()
            .map_err(serde::de::Error::custom)?
            .map(FlexInt)
            .ok_or_else(|| serde::de::Error::custom("expected an integer, got an empty string"))
    }
}

/// Deserialises an optional [`FlexInt`], mapping `null` and blank strings to `None`.
///
/// Use with `#[serde(default, deserialize_with = "crate::flex::optional")]`.
pub fn optional<'de, D>(deserializer: D) -> Result<Option<FlexInt>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawInt>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => raw
            .into_int()
            .map(|v| v.map(FlexInt))
            .map_err(serde::de::Error::custom),
    }
}
