//! Protobuf transport for axum.
//!
//! * [`codec`]: encode/decode and the `application/x-protobuf` media type.
//! * [`extract::ProtoBody`]: decodes the request body into a message before
//!   the handler runs.
//! * [`router::ProtoRouter`]: registers handlers that return [`Reply`] and
//!   writes their messages to the wire.

pub mod codec;
pub mod extract;
pub mod router;

pub use codec::{DecodeError, Payload, PROTOBUF_MEDIA_TYPE};
pub use extract::{ProtoBody, ProtoRejection};
pub use router::{IntoReply, ProtoHandler, ProtoRouter, Reply, RouteOptions, RouteRecord, Verb};
