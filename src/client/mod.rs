pub mod http;
pub mod mock;
pub mod types;

pub use http::HttpSessionClient;
pub use mock::MockSessionClient;
pub use types::*;

use async_trait::async_trait;

/// Network side of the session: the two calls the state machine makes.
///
/// HTTP-level failures (4xx/5xx) come back as ordinary responses. Only transport
/// failures and unparseable bodies are errors.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// `GET /api/v1/user`
    async fn fetch_current_user(&self) -> Result<SessionResponse, ClientError>;

    /// `DELETE /api/v1/sessions`, returning the HTTP status
    async fn delete_session(&self) -> Result<u16, ClientError>;

    fn client_type(&self) -> &'static str;
}
