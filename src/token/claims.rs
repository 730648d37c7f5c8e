use serde::{Deserialize, Deserializer};

/// The subset of the token payload the client reads.
///
/// Only `exp` is required. The backend also puts the username in `sub` and
/// may include `iat` and `role`; they are kept for display and logging but
/// never trusted for access decisions, which use the cached identity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiration time (Unix timestamp, seconds).
    #[serde(deserialize_with = "numeric_timestamp")]
    pub exp: i64,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Accepts integer and fractional second counts. Strings and other JSON
/// types are rejected so a quoted `exp` makes the token malformed.
fn numeric_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;

    number
        .as_i64()
        .or_else(|| {
            number
                .as_f64()
                .filter(|secs| secs.is_finite())
                .map(|secs| secs.floor() as i64)
        })
        .ok_or_else(|| serde::de::Error::custom("exp is not a numeric timestamp"))
}
