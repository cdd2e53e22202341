//! Request-body extractor that decodes protobuf before the handler runs.

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use prost::Message;
use thiserror::Error;

use crate::codec::{self, DecodeError};

/// Decoded request body.
///
/// The schema is the type parameter, picked where the handler is declared:
///
/// ```ignore
/// async fn create(ProtoBody(req): ProtoBody<CreateTodoRequest>) -> Reply<ApiResponse> { .. }
/// ```
///
/// The whole body is buffered first (size limits are whatever the router's
/// `DefaultBodyLimit` says), then decoded. Failures become a
/// [`ProtoRejection`]; the handler is never called with a default message.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoBody<M>(pub M);

impl<M> ProtoBody<M> {
    /// Unwraps the decoded message.
    pub fn into_inner(self) -> M {
        self.0
    }
}

/// Why a [`ProtoBody`] could not be produced.
#[derive(Debug, Error)]
pub enum ProtoRejection {
    #[error(transparent)]
    Body(#[from] BytesRejection),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl IntoResponse for ProtoRejection {
    fn into_response(self) -> Response {
        match self {
            // keep axum's own status (e.g. 413 when the body limit is hit)
            ProtoRejection::Body(rejection) => rejection.into_response(),
            ProtoRejection::Decode(err) => {
                tracing::debug!(error = %err, "rejecting malformed protobuf body");
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
        }
    }
}

#[async_trait]
impl<S, M> FromRequest<S> for ProtoBody<M>
where
    S: Send + Sync,
    M: Message + Default,
{
    type Rejection = ProtoRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        let message = codec::decode(&bytes)?;
        Ok(Self(message))
    }
}
