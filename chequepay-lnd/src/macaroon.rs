use std::fmt;
use std::path::Path;

use http::HeaderValue;

use crate::error::LndClientError;

/// An LND macaroon. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Macaroon(Vec<u8>);

impl Macaroon {
    /// Parses a hex-encoded macaroon.
    ///
    /// # Errors
    ///
    /// Returns [`LndClientError::MacaroonHex`] for invalid hex and
    /// [`LndClientError::MacaroonEmpty`] for an empty string.
    pub fn from_hex(value: &str) -> Result<Self, LndClientError> {
        Self::from_bytes(hex::decode(value.trim())?)
    }

    /// Reads a binary macaroon file, e.g. `admin.macaroon`.
    ///
    /// # Errors
    ///
    /// Returns [`LndClientError::MacaroonRead`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LndClientError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LndClientError::MacaroonRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes)
    }

    fn from_bytes(bytes: Vec<u8>) -> Result<Self, LndClientError> {
        if bytes.is_empty() {
            return Err(LndClientError::MacaroonEmpty);
        }
        Ok(Self(bytes))
    }

    /// Returns the hex encoding sent in the `Grpc-Metadata-Macaroon` header.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub(crate) fn header_value(&self) -> Result<HeaderValue, LndClientError> {
        let mut value = HeaderValue::from_str(&self.to_hex())?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Macaroon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Macaroon(<redacted>)")
    }
}
