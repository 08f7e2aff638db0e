//! Payment gateway callback verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::Payment;

type HmacSha256 = Hmac<Sha256>;

/// Checks gateway callback signatures.
///
/// The gateway signs `order_id|payment_id` with the shared secret; the hex
/// signature travels back through the client after checkout.
#[derive(Debug, Clone, Default)]
pub struct PaymentGateway {
    key_secret: Option<String>,
}

impl PaymentGateway {
    /// Create a new [`PaymentGateway`].
    pub fn new(config: Option<Payment>) -> Self {
        Self {
            key_secret: config.map(|config| config.key_secret),
        }
    }

    /// Check the gateway signature over `order_id|payment_id`.
    ///
    /// Comparison runs in constant time. A missing gateway secret or a
    /// non-hex signature rejects the callback.
    pub fn verify(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        let Some(secret) = &self.key_secret else {
            return false;
        };
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };

        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        mac.verify_slice(&signature).is_ok()
    }
}
