use base64::Engine;
use sha2::{Digest, Sha512};

/// Computes the SHA-512 digest of `input` and encodes it with the standard
/// (padded) base64 alphabet.
///
/// Pure and stateless: the same input always yields the same 88-character
/// string, and the function is safe to call from any number of concurrent
/// tasks. There are no failure modes.
pub fn sha512_base64(input: &[u8]) -> String {
    let digest = Sha512::digest(input);
    base64::engine::general_purpose::STANDARD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            sha512_base64(b"angryMonkey"),
            "ZEHhWB65gUlzdVwtDQArEyx+KVLzp/aTaRaPlBzYRIFj6vjFdqEb0Q5B8zVKCZ0vKbZPZklJz0Fd7su2A+gf7Q=="
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            sha512_base64(b""),
            "z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8XYXysP+DGNKHfuwvY7kxvUdBeoGlODJ6+SfaPg=="
        );
    }

    #[test]
    fn deterministic_and_input_sensitive() {
        let a = sha512_base64(b"correct horse");
        let b = sha512_base64(b"correct horse");
        let c = sha512_base64(b"correct horsf");

        assert_eq!(a, b);
        assert_ne!(a, c);
        // SHA-512 is 64 bytes; padded base64 of 64 bytes is 88 chars.
        assert_eq!(a.len(), 88);
    }
}
