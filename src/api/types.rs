use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::session::UserIdentity;
use crate::{AuthError, SecretString};

/// An outgoing backend request, before it reaches the wire.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Sets a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, AuthError> {
        let value = serde_json::to_value(body)
            .map_err(|e| AuthError::Serialization(format!("Failed to serialize body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Returns a copy carrying `Authorization: Bearer <token>`.
    ///
    /// The header is marked sensitive so it is masked in `Debug` output.
    pub fn with_bearer(&self, token: &SecretString) -> Result<Self, AuthError> {
        let mut value = HeaderValue::from_str(&token.bearer())
            .map_err(|_| AuthError::TokenInvalid)?;
        value.set_sensitive(true);

        let mut request = self.clone();
        request.headers.insert(AUTHORIZATION, value);
        Ok(request)
    }

    /// The token in the `Authorization` header, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()
            .and_then(|auth| auth.strip_prefix("Bearer "))
    }
}

/// A backend response, whatever its status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AuthError> {
        serde_json::from_str(&self.body)
            .map_err(|e| AuthError::Serialization(format!("Failed to parse response: {e}")))
    }

    /// Converts a non-success response into the error forwarded to callers.
    pub fn into_error(self) -> AuthError {
        AuthError::Http {
            status: self.status.as_u16(),
            body: self.body,
        }
    }
}

/// Successful body of `POST /auth/login`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: SecretString,
    #[serde(rename = "type", default = "default_token_type")]
    pub token_type: String,
    #[serde(flatten)]
    pub user: UserIdentity,
}

fn default_token_type() -> String {
    "Bearer".to_owned()
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::session::Role;

    #[test]
    fn test_login_response_shape() {
        let body = json!({
            "token": "a.b.c",
            "type": "Bearer",
            "username": "admin",
            "email": "admin@hotel.example",
            "firstName": "Ada",
            "lastName": "Admin",
            "role": "ADMIN",
            "isActive": true
        });

        let response: LoginResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.token.expose_secret(), "a.b.c");
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.user.username, "admin");
        assert_eq!(response.user.role, Role::Admin);
        assert_eq!(response.user.avatar, None);
        assert!(!format!("{response:?}").contains("a.b.c"));
    }

    #[test]
    fn test_login_response_unknown_role() {
        let body = json!({
            "token": "a.b.c",
            "username": "x",
            "email": "x@hotel.example",
            "firstName": "X",
            "lastName": "Y",
            "role": "OWNER",
            "isActive": true
        });
        assert!(serde_json::from_value::<LoginResponse>(body).is_err());
    }

    #[test]
    fn test_with_bearer_does_not_touch_original() {
        let request = ApiRequest::get("http://backend/rooms");
        let authorized = request.with_bearer(&SecretString::new("a.b.c")).unwrap();

        assert_eq!(request.bearer_token(), None);
        assert_eq!(authorized.bearer_token(), Some("a.b.c"));
        assert!(!format!("{authorized:?}").contains("a.b.c"));
    }

    #[test]
    fn test_json_body() {
        let request = ApiRequest::post("http://backend/rooms")
            .json(&json!({"number": "101"}))
            .unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, Some(json!({"number": "101"})));
    }

    #[test]
    fn test_response_into_error() {
        let err = ApiResponse::new(StatusCode::FORBIDDEN, "nope").into_error();
        assert_eq!(
            err,
            AuthError::Http {
                status: 403,
                body: "nope".to_owned()
            }
        );
    }
}
