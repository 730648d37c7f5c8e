use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};

use super::TokenClaims;
use crate::AuthError;

/// base64url that tolerates both padded and unpadded segments.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Outcome of an offline token check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Expired,
    /// Wrong shape, undecodable payload, or no usable `exp`.
    Malformed,
}

impl TokenStatus {
    /// Only `Valid` may keep a session alive; the other two fail closed.
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

/// Decodes tokens and answers expiry questions without network access.
#[derive(Debug, Clone, Copy)]
pub struct TokenValidator {
    lookahead: Duration,
}

impl Default for TokenValidator {
    fn default() -> Self {
        Self::new(Duration::minutes(5))
    }
}

impl TokenValidator {
    /// Creates a validator with the given about-to-expire window.
    pub fn new(lookahead: Duration) -> Self {
        Self { lookahead }
    }

    pub fn lookahead(&self) -> Duration {
        self.lookahead
    }

    /// Decodes the payload segment.
    ///
    /// Every failure collapses into `AuthError::TokenInvalid`.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::TokenInvalid);
        };

        let bytes = PAYLOAD_ENGINE
            .decode(payload)
            .map_err(|_| AuthError::TokenInvalid)?;

        serde_json::from_slice(&bytes).map_err(|_| AuthError::TokenInvalid)
    }

    /// Checks a token against the current wall clock.
    pub fn validate(&self, token: &str) -> TokenStatus {
        self.validate_at(token, Utc::now())
    }

    /// Checks a token against `now`. Expired when `exp <= now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> TokenStatus {
        match self.decode(token) {
            Ok(claims) if claims.exp <= now.timestamp() => TokenStatus::Expired,
            Ok(_) => TokenStatus::Valid,
            Err(_) => TokenStatus::Malformed,
        }
    }

    /// Returns the expiry instant embedded in the token.
    pub fn expires_at(&self, token: &str) -> Option<DateTime<Utc>> {
        let claims = self.decode(token).ok()?;
        DateTime::from_timestamp(claims.exp, 0)
    }

    pub fn is_about_to_expire(&self, token: &str) -> bool {
        self.is_about_to_expire_at(token, Utc::now())
    }

    /// True when the token expires within the lookahead window of `now`.
    ///
    /// A token that cannot be decoded is always about to expire.
    pub fn is_about_to_expire_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        match self.decode(token) {
            Ok(claims) => claims.exp <= (now + self.lookahead).timestamp(),
            Err(_) => true,
        }
    }

    pub fn time_remaining(&self, token: &str) -> Option<Duration> {
        self.time_remaining_at(token, Utc::now())
    }

    /// Time left before the token expires, zero once it has.
    pub fn time_remaining_at(&self, token: &str, now: DateTime<Utc>) -> Option<Duration> {
        let expires_at = self.expires_at(token)?;
        Some((expires_at - now).max(Duration::zero()))
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    use super::*;
    use crate::mocks::unsigned_token;

    fn validator() -> TokenValidator {
        TokenValidator::default()
    }

    #[test]
    fn test_wrong_segment_count_is_malformed() {
        let now = Utc::now();
        let payload = PAYLOAD_ENGINE.encode(format!(r#"{{"exp":{}}}"#, now.timestamp() + 3600));

        for token in [
            String::new(),
            "no-dots".to_owned(),
            format!("header.{payload}"),
            format!("header.{payload}.sig.extra"),
            format!("a.b.{payload}.d"),
        ] {
            assert_eq!(validator().validate_at(&token, now), TokenStatus::Malformed, "{token}");
        }
    }

    #[test]
    fn test_bad_payload_is_malformed() {
        let now = Utc::now();
        let not_json = PAYLOAD_ENGINE.encode("not json");
        let no_exp = PAYLOAD_ENGINE.encode(r#"{"sub":"admin"}"#);
        let string_exp = PAYLOAD_ENGINE.encode(r#"{"exp":"soon"}"#);

        for token in [
            "h.!!!not-base64!!!.s".to_owned(),
            format!("h.{not_json}.s"),
            format!("h.{no_exp}.s"),
            format!("h.{string_exp}.s"),
            "h..s".to_owned(),
        ] {
            assert_eq!(validator().validate_at(&token, now), TokenStatus::Malformed, "{token}");
        }
    }

    #[test]
    fn test_expired_one_second_ago() {
        let now = Utc::now();
        let token = unsigned_token(json!({ "exp": now.timestamp() - 1 }));
        assert_eq!(validator().validate_at(&token, now), TokenStatus::Expired);
    }

    #[test]
    fn test_expiring_exactly_now_is_expired() {
        let now = Utc::now();
        let token = unsigned_token(json!({ "exp": now.timestamp() }));
        assert_eq!(validator().validate_at(&token, now), TokenStatus::Expired);
    }

    #[test]
    fn test_valid_for_an_hour() {
        let now = Utc::now();
        let token = unsigned_token(json!({ "exp": now.timestamp() + 3600, "sub": "admin" }));

        assert_eq!(validator().validate_at(&token, now), TokenStatus::Valid);
        assert!(!validator().is_about_to_expire_at(&token, now));
    }

    #[test]
    fn test_valid_but_about_to_expire() {
        let now = Utc::now();
        let token = unsigned_token(json!({ "exp": now.timestamp() + 60 }));

        assert_eq!(validator().validate_at(&token, now), TokenStatus::Valid);
        assert!(validator().is_about_to_expire_at(&token, now));
    }

    #[test]
    fn test_malformed_is_about_to_expire() {
        assert!(validator().is_about_to_expire_at("garbage", Utc::now()));
    }

    #[test]
    fn test_padded_payload_accepted() {
        let now = Utc::now();
        let padded = base64::engine::general_purpose::URL_SAFE
            .encode(format!(r#"{{"exp":{}}}"#, now.timestamp() + 3600));
        let token = format!("h.{padded}.s");
        assert_eq!(validator().validate_at(&token, now), TokenStatus::Valid);
    }

    #[test]
    fn test_decodes_backend_issued_jwt() {
        let now = Utc::now();
        let claims = json!({
            "sub": "admin",
            "role": "ADMIN",
            "iat": now.timestamp(),
            "exp": now.timestamp() + 7200,
        });
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"backend-secret-the-client-never-sees"),
        )
        .unwrap();

        let decoded = validator().decode(&token).unwrap();
        assert_eq!(decoded.sub.as_deref(), Some("admin"));
        assert_eq!(decoded.role.as_deref(), Some("ADMIN"));
        assert_eq!(validator().validate_at(&token, now), TokenStatus::Valid);
        assert_eq!(
            validator().expires_at(&token).map(|at| at.timestamp()),
            Some(now.timestamp() + 7200)
        );
    }

    #[test]
    fn test_time_remaining() {
        let now = Utc::now();
        let token = unsigned_token(json!({ "exp": now.timestamp() + 90 }));
        let remaining = validator().time_remaining_at(&token, now).unwrap();
        assert!(remaining <= Duration::seconds(90));
        assert!(remaining > Duration::seconds(88));

        let expired = unsigned_token(json!({ "exp": now.timestamp() - 90 }));
        assert_eq!(
            validator().time_remaining_at(&expired, now),
            Some(Duration::zero())
        );
        assert_eq!(validator().time_remaining_at("bad", now), None);
    }
}
