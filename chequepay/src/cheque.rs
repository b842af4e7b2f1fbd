//! Cheque framing and body decoding.
//!
//! A cheque arrives hex encoded. Decoded, its bytes are laid out as
//!
//! ```text
//! | open | body (CBOR) | signature header | signature | close |
//! |  1   |  len - 68   |        2         |    64     |   1   |
//! ```
//!
//! which is the CBOR encoding of an indefinite array `[body, h'signature']`.
//! The frame is only ever sliced by position: the opening byte, the header and
//! the closing byte are carried along but never checked.
//!
//! The signed message is the channel tag followed by the body bytes.

use std::convert::Infallible;

use minicbor::data::Type;
use minicbor::{Decoder, Encoder, decode, encode};

use crate::error::AdaptorError;
use crate::types::{Lock, Tag};

/// Length of the opening byte.
pub const OPEN_LEN: usize = 1;
/// Length of the CBOR header in front of the signature.
pub const SIGNATURE_HEADER_LEN: usize = 2;
/// Length of an Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;
/// Length of the closing byte.
pub const CLOSE_LEN: usize = 1;
/// Shortest frame that holds everything but the body.
pub const MIN_FRAME_LEN: usize = OPEN_LEN + SIGNATURE_HEADER_LEN + SIGNATURE_LEN + CLOSE_LEN;

/// Opening byte written by [`ChequeFrame::assemble`] (indefinite CBOR array).
pub const FRAME_OPEN: u8 = 0x9f;
/// Signature header written by [`ChequeFrame::assemble`] (CBOR byte string of 64).
pub const SIGNATURE_HEADER: [u8; SIGNATURE_HEADER_LEN] = [0x58, 0x40];
/// Closing byte written by [`ChequeFrame::assemble`] (CBOR break).
pub const FRAME_CLOSE: u8 = 0xff;

/// A cheque split into its positional parts.
///
/// Holds at least [`MIN_FRAME_LEN`] bytes, so the accessors never go out of
/// bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChequeFrame {
    bytes: Vec<u8>,
}

/// The parts of a frame that signature verification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unpacked<'a> {
    /// `tag ‖ body`, the bytes the signature covers.
    pub message: Vec<u8>,
    /// The 64 signature bytes.
    pub signature: &'a [u8],
    /// The CBOR body bytes.
    pub body: &'a [u8],
}

impl ChequeFrame {
    /// Parses a hex-encoded cheque.
    ///
    /// # Errors
    ///
    /// Returns [`AdaptorError::MalformedCheque`] if the input is not hex or is
    /// shorter than [`MIN_FRAME_LEN`] bytes once decoded.
    pub fn from_hex(cheque: &str) -> Result<Self, AdaptorError> {
        let bytes = hex::decode(cheque)
            .map_err(|e| AdaptorError::MalformedCheque(format!("cheque is not hex: {e}")))?;
        Self::from_bytes(bytes)
    }

    /// Wraps raw cheque bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AdaptorError::MalformedCheque`] if fewer than
    /// [`MIN_FRAME_LEN`] bytes are supplied.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AdaptorError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(AdaptorError::MalformedCheque(format!(
                "cheque is {} bytes, at least {MIN_FRAME_LEN} required",
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    /// Builds a frame around an encoded body and its signature.
    #[must_use]
    pub fn assemble(body: &[u8], signature: &[u8; SIGNATURE_LEN]) -> Self {
        let mut bytes = Vec::with_capacity(MIN_FRAME_LEN + body.len());
        bytes.push(FRAME_OPEN);
        bytes.extend_from_slice(body);
        bytes.extend_from_slice(&SIGNATURE_HEADER);
        bytes.extend_from_slice(signature);
        bytes.push(FRAME_CLOSE);
        Self { bytes }
    }

    const fn body_end(&self) -> usize {
        self.bytes.len() - CLOSE_LEN - SIGNATURE_LEN - SIGNATURE_HEADER_LEN
    }

    /// The opening byte.
    #[must_use]
    pub fn open(&self) -> u8 {
        self.bytes[0]
    }

    /// The CBOR body bytes. May be empty.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.bytes[OPEN_LEN..self.body_end()]
    }

    /// The two bytes between body and signature.
    #[must_use]
    pub fn signature_header(&self) -> &[u8] {
        let start = self.body_end();
        &self.bytes[start..start + SIGNATURE_HEADER_LEN]
    }

    /// The signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        let start = self.body_end() + SIGNATURE_HEADER_LEN;
        &self.bytes[start..start + SIGNATURE_LEN]
    }

    /// The closing byte.
    #[must_use]
    pub fn close(&self) -> u8 {
        self.bytes[self.bytes.len() - CLOSE_LEN]
    }

    /// Returns `tag ‖ body`.
    #[must_use]
    pub fn signed_message(&self, tag: &Tag) -> Vec<u8> {
        let body = self.body();
        let mut message = Vec::with_capacity(tag.as_bytes().len() + body.len());
        message.extend_from_slice(tag.as_bytes());
        message.extend_from_slice(body);
        message
    }

    /// Splits the frame into message, signature and body.
    #[must_use]
    pub fn unpack(&self, tag: &Tag) -> Unpacked<'_> {
        Unpacked {
            message: self.signed_message(tag),
            signature: self.signature(),
            body: self.body(),
        }
    }

    /// Returns the raw frame bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encodes the frame.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// The payload of a cheque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChequeBody {
    /// Position of the cheque in its channel. Redeemed indices only go up.
    pub index: u64,
    /// Amount the cheque is worth.
    pub amount: u64,
    /// POSIX milliseconds after which the cheque may not be redeemed.
    pub timeout_ms: u64,
    /// Hash lock, used as the payment hash of the Lightning payment.
    pub lock: Lock,
}

impl ChequeBody {
    /// Number of fields in the CBOR array.
    pub const FIELDS: u64 = 4;

    /// Decodes the CBOR array `[index, amount, timeout, lock]`.
    ///
    /// Both definite and indefinite arrays are accepted. Trailing bytes after
    /// the array are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`AdaptorError::MalformedChequeBody`] if the bytes are not such
    /// an array or the lock is not 32 bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, AdaptorError> {
        let mut decoder = Decoder::new(bytes);
        let len = decoder.array().map_err(|e| malformed("array", &e))?;
        if let Some(len) = len.filter(|n| *n != Self::FIELDS) {
            return Err(AdaptorError::MalformedChequeBody(format!(
                "expected {} fields, found {len}",
                Self::FIELDS
            )));
        }

        let index = decoder.u64().map_err(|e| malformed("index", &e))?;
        let amount = decoder.u64().map_err(|e| malformed("amount", &e))?;
        let timeout_ms = decoder.u64().map_err(|e| malformed("timeout", &e))?;
        let lock = decoder.bytes().map_err(|e| malformed("lock", &e))?;
        let lock = Lock::from_slice(lock)
            .map_err(|e| AdaptorError::MalformedChequeBody(format!("lock: {e}")))?;

        if len.is_none() {
            let next = decoder.datatype().map_err(|e| malformed("end", &e))?;
            if next != Type::Break {
                return Err(AdaptorError::MalformedChequeBody(format!(
                    "expected {} fields, found more",
                    Self::FIELDS
                )));
            }
            decoder.set_position(decoder.position() + 1);
        }

        if decoder.position() != bytes.len() {
            return Err(AdaptorError::MalformedChequeBody(format!(
                "{} trailing bytes",
                bytes.len() - decoder.position()
            )));
        }

        Ok(Self {
            index,
            amount,
            timeout_ms,
            lock,
        })
    }

    /// Encodes the body as a definite CBOR array.
    #[must_use]
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new());
        // Writing into a Vec cannot fail.
        let _: Result<_, encode::Error<Infallible>> = encoder
            .array(Self::FIELDS)
            .and_then(|e| e.u64(self.index))
            .and_then(|e| e.u64(self.amount))
            .and_then(|e| e.u64(self.timeout_ms))
            .and_then(|e| e.bytes(self.lock.as_bytes()));
        encoder.into_writer()
    }
}

fn malformed(field: &str, error: &decode::Error) -> AdaptorError {
    AdaptorError::MalformedChequeBody(format!("{field}: {error}"))
}
