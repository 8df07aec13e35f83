use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LoggerError, Result};
use crate::line::LogLineWrapper;

/// Serialization backend for values crossing the process boundary.
///
/// Implementations are interchangeable as long as both ends of a pipe use the
/// same one.
pub trait Marshalizer: Send + Sync {
    fn marshal(&self, wrapper: &LogLineWrapper) -> Result<Vec<u8>>;

    /// Decode a wire payload. Errors carry the payload for diagnostics.
    fn unmarshal(&self, payload: &[u8]) -> Result<LogLineWrapper>;
}

/// JSON with PascalCase field names.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonMarshalizer;

impl JsonMarshalizer {
    pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| LoggerError::Marshal(e.to_string()))
    }

    pub fn from_bytes<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
        serde_json::from_slice(payload).map_err(|e| LoggerError::unmarshal(payload, e))
    }
}

impl Marshalizer for JsonMarshalizer {
    fn marshal(&self, wrapper: &LogLineWrapper) -> Result<Vec<u8>> {
        Self::to_bytes(wrapper)
    }

    fn unmarshal(&self, payload: &[u8]) -> Result<LogLineWrapper> {
        Self::from_bytes(payload)
    }
}

/// MessagePack maps keyed by field name.
#[derive(Debug, Default, Clone, Copy)]
pub struct MsgPackMarshalizer;

impl Marshalizer for MsgPackMarshalizer {
    fn marshal(&self, wrapper: &LogLineWrapper) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(wrapper).map_err(|e| LoggerError::Marshal(e.to_string()))
    }

    fn unmarshal(&self, payload: &[u8]) -> Result<LogLineWrapper> {
        rmp_serde::from_slice(payload).map_err(|e| LoggerError::unmarshal(payload, e))
    }
}
