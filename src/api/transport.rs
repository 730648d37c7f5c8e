use std::sync::Arc;

use async_trait::async_trait;

use super::{ApiRequest, ApiResponse};
use crate::AuthError;

/// Sends one request and returns whatever the server answered.
///
/// Non-success statuses are `Ok`; `Err` means no response was received
/// (DNS, refused connection, timeout), reported as [`AuthError::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, AuthError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        (**self).execute(request).await
    }
}
