//! Backend communication.
//!
//! Every call to the hotel backend goes through a [`Transport`]. The login
//! exchange uses it directly through [`HttpAuthApi`]; everything else goes
//! through [`RequestAuthorizer`], which attaches the bearer token and turns a
//! 401 into a forced logout.
//!
//! ```rust,ignore
//! let transport = ReqwestTransport::new()?;
//! let api = HttpAuthApi::new(transport.clone(), config.api.clone())?;
//! let session = Arc::new(SessionManager::new(api, storage, &config));
//! session.initialize();
//!
//! let backend = RequestAuthorizer::new(transport, Arc::clone(&session), config.api.clone())?;
//! let rooms: Vec<Room> = backend.get_json("/rooms").await?;
//! ```

mod auth;
mod authorizer;
mod reqwest_transport;
mod transport;
mod types;

pub use auth::{AuthApi, HttpAuthApi, LOGIN_PATH};
pub use authorizer::RequestAuthorizer;
pub use reqwest_transport::ReqwestTransport;
pub use transport::Transport;
pub use types::{ApiRequest, ApiResponse, LoginResponse};
