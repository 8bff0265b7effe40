//! Stable annotation identifiers and presentation nonces.

use rand::distr::Alphanumeric;
use rand::Rng;
use sha1::{Digest, Sha1};

/// Number of hex characters kept from the digest (64 bits).
pub const ID_LEN: usize = 16;

/// Length of a generated nonce.
pub const NONCE_LEN: usize = 32;

/// Content-addressed identifier for an annotation.
///
/// SHA-1 over `file ":" line ":" trim(text)`, hex-encoded and truncated to
/// [`ID_LEN`] characters. The same inputs always give the same id.
///
/// # Example
///
/// ```
/// use todoboard::identity::generate_id;
///
/// let a = generate_id("/src/main.rs", 3, "@TODO tidy up");
/// let b = generate_id("/src/main.rs", 3, "  @TODO tidy up ");
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 16);
/// ```
#[must_use]
pub fn generate_id(file: &str, line: usize, text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(file.as_bytes());
    hasher.update(b":");
    hasher.update(line.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(text.trim().as_bytes());
    let digest = hasher.finalize();

    let mut hex = format!("{:x}", digest);
    hex.truncate(ID_LEN);
    hex
}

/// Random 32-character alphanumeric token for a single render.
#[must_use]
pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Whether `id` has the shape produced by [`generate_id`].
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
