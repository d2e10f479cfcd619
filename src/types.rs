//! Common GraphQL types

use async_graphql::{Scalar, ScalarType, Value};
use chrono::{DateTime as ChronoDateTime, SecondsFormat, Utc};

/// DateTime scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTime(pub ChronoDateTime<Utc>);

impl DateTime {
    pub fn now() -> Self {
        DateTime(Utc::now())
    }

    /// Parse an RFC 3339 string property
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        value
            .as_str()
            .and_then(|s| ChronoDateTime::parse_from_rfc3339(s).ok())
            .map(|dt| DateTime(dt.with_timezone(&Utc)))
    }

    /// Stored form of the timestamp. Fixed-width so string ordering in the
    /// store matches time ordering.
    pub fn to_property(&self) -> serde_json::Value {
        serde_json::Value::String(self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

#[Scalar]
impl ScalarType for DateTime {
    fn parse(value: Value) -> async_graphql::InputValueResult<Self> {
        if let Value::String(s) = value {
            Ok(DateTime(
                ChronoDateTime::parse_from_rfc3339(&s)
                    .map_err(|e| format!("Invalid DateTime: {}", e))?
                    .with_timezone(&Utc),
            ))
        } else {
            Err("Expected string for DateTime".into())
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.to_rfc3339())
    }
}
