//! Verification of externally produced signatures.
//!
//! The core never holds key material. It only recovers the address behind a
//! signature over a digest it computed itself and compares it with the party
//! that is supposed to have signed.

use alloy::primitives::{Address, PrimitiveSignature, B256};

use crate::error::{CoreError, Result};

/// Recover the signer of `digest` and require it to be `expected`.
///
/// # Errors
/// `InvalidArgument` if recovery fails or the recovered address differs.
pub fn verify_signer(
    digest: &B256,
    signature: &PrimitiveSignature,
    expected: Address,
) -> Result<Address> {
    let recovered = signature
        .recover_address_from_prehash(digest)
        .map_err(|e| CoreError::invalid_argument(format!("signature recovery failed: {e}")))?;

    if recovered != expected {
        return Err(CoreError::invalid_argument(format!(
            "signature from {recovered}, expected {expected}"
        )));
    }

    Ok(recovered)
}

/// Parse a 65-byte `r || s || v` signature.
pub fn parse_signature(bytes: &[u8]) -> Result<PrimitiveSignature> {
    PrimitiveSignature::try_from(bytes)
        .map_err(|e| CoreError::invalid_argument(format!("malformed signature: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;

    #[test]
    fn test_verify_signer_accepts_matching_address() {
        let signer = PrivateKeySigner::random();
        let digest = keccak256(b"payload");
        let sig = signer.sign_hash_sync(&digest).unwrap();

        let recovered = verify_signer(&digest, &sig, signer.address()).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_verify_signer_rejects_other_address() {
        let signer = PrivateKeySigner::random();
        let other = PrivateKeySigner::random();
        let digest = keccak256(b"payload");
        let sig = signer.sign_hash_sync(&digest).unwrap();

        assert!(matches!(
            verify_signer(&digest, &sig, other.address()),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_verify_signer_rejects_other_digest() {
        let signer = PrivateKeySigner::random();
        let sig = signer.sign_hash_sync(&keccak256(b"a")).unwrap();

        assert!(verify_signer(&keccak256(b"b"), &sig, signer.address()).is_err());
    }

    #[test]
    fn test_parse_signature_round_trip() {
        let signer = PrivateKeySigner::random();
        let sig = signer.sign_hash_sync(&keccak256(b"x")).unwrap();
        let parsed = parse_signature(&sig.as_bytes()).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn test_parse_signature_rejects_short_input() {
        assert!(parse_signature(&[0u8; 10]).is_err());
    }
}
