//! BLAKE3 content hashing used for cache keys.

#[inline]
pub fn hash_text(text: &str) -> [u8; 32] {
    *blake3::hash(text.as_bytes()).as_bytes()
}

/// Hash of `text` scoped to an embedding model, so switching models never reuses vectors.
#[inline]
pub fn hash_embedding_key(model: &str, text: &str) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(model.as_bytes());
    hasher.update(&[0u8]);
    hasher.update(text.as_bytes());
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_text_deterministic() {
        assert_eq!(hash_text("no SI or HI"), hash_text("no SI or HI"));
        assert_ne!(hash_text("no SI or HI"), hash_text("No SI or HI"));
    }

    #[test]
    fn test_embedding_key_scoped_by_model() {
        let a = hash_embedding_key("model-a", "text");
        let b = hash_embedding_key("model-b", "text");
        assert_ne!(a, b);
    }

    #[test]
    fn test_embedding_key_separator_prevents_ambiguity() {
        assert_ne!(
            hash_embedding_key("ab", "c"),
            hash_embedding_key("a", "bc")
        );
    }
}
