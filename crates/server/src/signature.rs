use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Check a Meta `X-Hub-Signature-256: sha256=<hex>` header against the raw
/// request body. Comparison is constant-time.
pub fn verify_signature(app_secret: &str, payload: &[u8], header: Option<&str>) -> bool {
    let Some(expected_hex) = header.and_then(|h| h.trim().strip_prefix("sha256=")) else {
        return false;
    };
    let Ok(expected_bytes) = hex::decode(expected_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected_bytes).is_ok()
}

#[cfg(test)]
pub(crate) fn sign(app_secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes()).unwrap();
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_signature() {
        let body = br#"{"object":"whatsapp_business_account"}"#;
        let header = sign("s3cret", body);
        assert!(verify_signature("s3cret", body, Some(&header)));
    }

    #[test]
    fn rejects_wrong_secret_or_body() {
        let body = b"payload";
        let header = sign("s3cret", body);
        assert!(!verify_signature("other", body, Some(&header)));
        assert!(!verify_signature("s3cret", b"tampered", Some(&header)));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert!(!verify_signature("s3cret", b"x", None));
        assert!(!verify_signature("s3cret", b"x", Some("md5=abcd")));
        assert!(!verify_signature("s3cret", b"x", Some("sha256=not-hex")));
    }
}
