use data_encoding::HEXLOWER_PERMISSIVE;
use ring::hmac;

use crate::model::error::SyncError;

/// Header carrying Bling's `sha256=<hex>` HMAC of the raw request body.
pub const BLING_SIGNATURE_HEADER: &str = "x-bling-signature-256";

pub fn hmac_256_verify(key_bytes: &[u8], payload: &[u8], signature: &str) -> Result<(), SyncError> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key_bytes);
    let digest = signature.trim().strip_prefix("sha256=").unwrap_or(signature.trim());
    let digest_decoded = HEXLOWER_PERMISSIVE
        .decode(digest.as_bytes())
        .map_err(|e| SyncError::InvalidSignature(format!("signature is not hex: {e}")))?;
    hmac::verify(&key, payload, digest_decoded.as_slice())
        .map_err(|_| SyncError::InvalidSignature("signature mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(key: &[u8], payload: &[u8]) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, key);
        let tag = hmac::sign(&key, payload);
        format!("sha256={}", HEXLOWER_PERMISSIVE.encode(tag.as_ref()))
    }

    #[test]
    fn accepts_matching_signature() {
        let sig = sign(b"client-secret", b"{\"data\":{}}");
        assert!(hmac_256_verify(b"client-secret", b"{\"data\":{}}", &sig).is_ok());
    }

    #[test]
    fn accepts_uppercase_hex_without_prefix() {
        let sig = sign(b"k", b"body").trim_start_matches("sha256=").to_uppercase();
        assert!(hmac_256_verify(b"k", b"body", &sig).is_ok());
    }

    #[test]
    fn rejects_tampered_payload() {
        let sig = sign(b"client-secret", b"original");
        let err = hmac_256_verify(b"client-secret", b"tampered", &sig).unwrap_err();
        assert!(matches!(err, SyncError::InvalidSignature(_)));
    }

    #[test]
    fn rejects_garbage_signature() {
        assert!(hmac_256_verify(b"k", b"body", "sha256=zz").is_err());
    }
}
