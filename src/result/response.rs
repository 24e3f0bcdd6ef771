//! Transport response boundary
//!
//! The result factory only needs a status code and the body bytes.

use crate::error::BoxError;
use crate::types::JsonValue;

/// A completed transport response
pub trait Response {
    /// HTTP status code
    fn status(&self) -> u16;

    /// Read the whole body
    fn into_body(self) -> std::result::Result<Vec<u8>, BoxError>;
}

/// In-memory response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Response with a JSON body
    pub fn json(status: u16, body: &JsonValue) -> Self {
        Self::new(status, body.to_string())
    }

    /// Response without a body
    pub fn empty(status: u16) -> Self {
        Self::new(status, Vec::new())
    }
}

impl Response for RawResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn into_body(self) -> std::result::Result<Vec<u8>, BoxError> {
        Ok(self.body)
    }
}

impl Response for reqwest::blocking::Response {
    fn status(&self) -> u16 {
        reqwest::blocking::Response::status(self).as_u16()
    }

    fn into_body(self) -> std::result::Result<Vec<u8>, BoxError> {
        Ok(self.bytes()?.to_vec())
    }
}
