//! Fixed-width byte values exchanged as hex strings.
//!
//! Public keys, payment hashes and cheque locks all travel as hex on the
//! client-facing API. Each gets its own newtype so that, for instance, an
//! invoice's payment hash can never be handed to the payment executor where
//! a cheque lock is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors from parsing a fixed-width byte value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BytesError {
    /// The input was not valid hex.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// The input had the wrong number of bytes.
    #[error("expected {expected} bytes, got {actual}")]
    Length {
        /// Required length in bytes.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
}

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Length of the value in bytes.
            pub const LEN: usize = $len;

            /// Wraps raw bytes.
            #[must_use]
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Returns the raw bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Copies the value out of a slice of exactly [`Self::LEN`] bytes.
            ///
            /// # Errors
            ///
            /// Returns [`BytesError::Length`] if the slice has any other length.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, BytesError> {
                <[u8; $len]>::try_from(bytes)
                    .map(Self)
                    .map_err(|_| BytesError::Length {
                        expected: $len,
                        actual: bytes.len(),
                    })
            }
        }

        impl FromStr for $name {
            type Err = BytesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_slice(&hex::decode(s)?)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// A 33-byte compressed secp256k1 public key identifying a Lightning node.
    NodeId,
    33
);

fixed_bytes!(
    /// The payment hash stated by a Lightning invoice.
    PaymentHash,
    32
);

fixed_bytes!(
    /// The hash lock carried by a cheque, used as the payment hash of the
    /// Lightning payment the cheque pays for.
    Lock,
    32
);

fixed_bytes!(
    /// The payment address (payment secret) of a Lightning invoice.
    PaymentAddr,
    32
);

fixed_bytes!(
    /// A 32-byte Ed25519 public key that cheques are checked against.
    VerificationKey,
    32
);

/// Channel tag concatenated in front of the cheque body before signing.
///
/// Variable length, hex on the wire.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(Vec<u8>);

impl Tag {
    /// Returns the raw tag bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Tag {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Tag {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl FromStr for Tag {
    type Err = BytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(hex::decode(s)?))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_parses_33_bytes() {
        let hex = format!("02{}", "ab".repeat(32));
        let node: NodeId = hex.parse().unwrap();
        assert_eq!(node.as_bytes()[0], 0x02);
        assert_eq!(node.to_string(), hex);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = "ff".repeat(31).parse::<Lock>().unwrap_err();
        assert_eq!(
            err,
            BytesError::Length {
                expected: 32,
                actual: 31
            }
        );
    }

    #[test]
    fn test_non_hex_is_rejected() {
        assert!(matches!(
            "zz".repeat(32).parse::<PaymentHash>(),
            Err(BytesError::Hex(_))
        ));
        assert_eq!(
            "0".parse::<NodeId>().unwrap_err(),
            BytesError::Hex(hex::FromHexError::OddLength)
        );
    }

    #[test]
    fn test_serializes_as_hex_string() {
        let lock = Lock::new([0xde; 32]);
        let json = serde_json::to_string(&lock).unwrap();
        assert_eq!(json, format!("\"{}\"", "de".repeat(32)));
        let back: Lock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lock);
    }

    #[test]
    fn test_tag_accepts_empty() {
        let tag: Tag = "".parse().unwrap();
        assert!(tag.as_bytes().is_empty());
    }
}
