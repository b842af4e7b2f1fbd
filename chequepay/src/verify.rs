//! Ed25519 signature verification.

use ed25519_dalek::{Signature, VerifyingKey};

use crate::cheque::{ChequeFrame, SIGNATURE_LEN};
use crate::error::AdaptorError;
use crate::types::{Tag, VerificationKey};

/// Checks an Ed25519 signature over `message`.
///
/// Returns `Ok(false)` for any signature that does not verify, including when
/// the key bytes are not a valid curve point.
///
/// # Errors
///
/// Returns [`AdaptorError::InvalidKeyMaterial`] if the signature is not
/// [`SIGNATURE_LEN`] bytes.
pub fn verify(
    message: &[u8],
    signature: &[u8],
    key: &VerificationKey,
) -> Result<bool, AdaptorError> {
    let signature = Signature::from_slice(signature).map_err(|_| {
        AdaptorError::InvalidKeyMaterial(format!(
            "signature must be {SIGNATURE_LEN} bytes, got {}",
            signature.len()
        ))
    })?;
    let Ok(key) = VerifyingKey::from_bytes(key.as_bytes()) else {
        return Ok(false);
    };
    Ok(key.verify_strict(message, &signature).is_ok())
}

/// Verifies a cheque frame signed under `tag` by `key`.
///
/// # Errors
///
/// Returns [`AdaptorError::Unauthorized`] if the signature does not verify.
#[cfg_attr(feature = "telemetry", tracing::instrument(skip_all, err, fields(key = %key)))]
pub fn verify_cheque(
    frame: &ChequeFrame,
    tag: &Tag,
    key: &VerificationKey,
) -> Result<(), AdaptorError> {
    let unpacked = frame.unpack(tag);
    if verify(&unpacked.message, unpacked.signature, key)? {
        Ok(())
    } else {
        Err(AdaptorError::Unauthorized)
    }
}
