//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust values and raw bytes. Two places use it:
//! the transport binding (whole [`ClientMessage`](crate::ClientMessage) /
//! [`InboundEvent`](crate::InboundEvent) frames) and the router
//! (application-message bodies, which the frame carries as opaque bytes).

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust values to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the transport driver owns its codec
/// inside a spawned Tokio task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use relaybot_protocol::{Codec, JsonCodec, PeerId, SpectateFriendGame};
///
/// let codec = JsonCodec;
/// let body = SpectateFriendGame { steam_id: PeerId::new("76561198000000000") };
///
/// let bytes = codec.encode(&body).unwrap();
/// let decoded: SpectateFriendGame = codec.decode(&bytes).unwrap();
/// assert_eq!(body, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
