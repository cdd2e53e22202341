//! Protobuf encode/decode plus the media type used on the wire.

use bytes::Bytes;
use prost::Message;
use thiserror::Error;

/// Content type of every binary response.
pub const PROTOBUF_MEDIA_TYPE: &str = "application/x-protobuf";

/// Body bytes did not parse against the requested schema.
#[derive(Debug, Error)]
#[error("invalid {schema} message: {source}")]
pub struct DecodeError {
    schema: &'static str,
    #[source]
    source: prost::DecodeError,
}

impl DecodeError {
    /// Short type name of the schema the bytes were decoded against.
    pub fn schema(&self) -> &'static str {
        self.schema
    }
}

/// Something that can be written as a binary body: either a message that
/// still needs encoding, or bytes that were serialized elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<M> {
    Message(M),
    Raw(Bytes),
}

impl<M: Message> Payload<M> {
    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Message(m) => encode(&m),
            Payload::Raw(bytes) => bytes,
        }
    }
}

pub fn encode<M: Message>(message: &M) -> Bytes {
    Bytes::from(message.encode_to_vec())
}

pub fn decode<M: Message + Default>(bytes: &[u8]) -> Result<M, DecodeError> {
    M::decode(bytes).map_err(|source| DecodeError {
        schema: schema_name::<M>(),
        source,
    })
}

fn schema_name<M>() -> &'static str {
    let full = std::any::type_name::<M>();
    full.rsplit("::").next().unwrap_or(full)
}
