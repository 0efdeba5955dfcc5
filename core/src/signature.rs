// lustre/src/signature.rs

//! Payment callback signatures: hex HMAC-SHA256 over
//! `"{provider_order_id}|{payment_id}"` keyed with the gateway secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn callback_message(provider_order_id: &str, payment_id: &str) -> String {
  format!("{provider_order_id}|{payment_id}")
}

pub fn hmac_sha256_hex(secret: &[u8], message: &str) -> String {
  // HMAC accepts keys of any length.
  let mut mac = match HmacSha256::new_from_slice(secret) {
    Ok(mac) => mac,
    Err(_) => return String::new(),
  };
  mac.update(message.as_bytes());
  hex::encode(mac.finalize().into_bytes())
}

pub fn sign_callback(secret: &[u8], provider_order_id: &str, payment_id: &str) -> String {
  hmac_sha256_hex(secret, &callback_message(provider_order_id, payment_id))
}

/// Constant-time check of a hex signature.
pub fn verify_callback(secret: &[u8], provider_order_id: &str, payment_id: &str, signature_hex: &str) -> bool {
  let Ok(expected) = hex::decode(signature_hex.trim()) else {
    return false;
  };
  let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
    return false;
  };
  mac.update(callback_message(provider_order_id, payment_id).as_bytes());
  mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn signed_callback_verifies() {
    let sig = sign_callback(b"gateway-secret", "order_9Xk", "pay_41");
    assert_eq!(sig.len(), 64);
    assert!(verify_callback(b"gateway-secret", "order_9Xk", "pay_41", &sig));
  }

  #[test]
  fn tampered_fields_fail() {
    let sig = sign_callback(b"gateway-secret", "order_9Xk", "pay_41");
    assert!(!verify_callback(b"gateway-secret", "order_9Xk", "pay_42", &sig));
    assert!(!verify_callback(b"other-secret", "order_9Xk", "pay_41", &sig));
    assert!(!verify_callback(b"gateway-secret", "order_9Xk", "pay_41", "not-hex"));
  }
}
