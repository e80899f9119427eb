//! Messages exchanged with the companion app

mod dict;

pub use dict::{DecodeError, Dictionary, EncodeError, Tuple, Value};

use crate::config::{KEY_REQUEST, REQUEST_SENTINEL};

/// Why the transport could not deliver a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutboxError {
    /// Message could not be encoded
    Encode(EncodeError),
    /// A previous message is still pending
    Busy,
    /// No companion app is connected
    NotConnected,
    /// The companion app did not acknowledge the message
    Nack,
}

impl From<EncodeError> for OutboxError {
    fn from(e: EncodeError) -> Self {
        OutboxError::Encode(e)
    }
}

/// Why the transport dropped an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropReason {
    /// Message did not decode
    Malformed(DecodeError),
    /// The inbox was full
    InboxFull,
}

/// Outbound side of the transport
pub trait Outbox {
    /// Hand a message to the transport. Delivery is not confirmed here.
    fn send(&mut self, message: &Dictionary) -> Result<(), OutboxError>;
}

/// Build the weather request: one tuple whose arrival is the whole signal.
pub fn weather_request() -> Result<Dictionary, EncodeError> {
    let mut dict = Dictionary::new();
    dict.insert(KEY_REQUEST, Value::UInt8(REQUEST_SENTINEL))?;
    Ok(dict)
}
