use rand::{rngs::OsRng, RngCore};

/// Byte length of opaque verification and reset tokens (256 bits of entropy).
pub const OPAQUE_TOKEN_BYTES: usize = 32;

/// Generate a cryptographically random single-use token, hex-encoded.
///
/// Collisions are treated as negligible; the store's UNIQUE constraints still
/// back this up.
pub fn opaque_token() -> String {
    let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
