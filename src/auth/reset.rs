use base64ct::{Base64UrlUnpadded, Encoding};
use rand::rngs::OsRng;
use rand::RngCore;

/// Bytes of entropy behind each reset token.
const RESET_TOKEN_BYTES: usize = 32;

/// Generates an opaque password-reset token: random bytes in a URL-safe
/// encoding, no embedded claims. A signed claims token would stay replayable
/// until expiry; an opaque string is revocable by the `used` flag alone.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}
