//! Cache key for signed URLs

use std::fmt;

const DELIMITER: char = ':';

/// Cache key identifying one (owner, container, blob) triple.
///
/// Each component is percent-encoded before joining, so a `:` inside a
/// component can never be confused with the delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(owner_id: &str, container_name: &str, blob_name: &str) -> Self {
        let encoded = [owner_id, container_name, blob_name]
            .iter()
            .map(|part| urlencoding::encode(part).into_owned())
            .collect::<Vec<_>>()
            .join(&DELIMITER.to_string());
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_components_join_with_colon() {
        let key = CacheKey::new("doc1", "healthrecord-files", "doc1_healthrecord_abc.png");
        assert_eq!(key.as_str(), "doc1:healthrecord-files:doc1_healthrecord_abc.png");
    }

    #[test]
    fn test_delimiter_inside_component_does_not_collide() {
        let a = CacheKey::new("a:b", "c", "d");
        let b = CacheKey::new("a", "b:c", "d");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "a%3Ab:c:d");
    }

    #[test]
    fn test_percent_inside_component_does_not_collide() {
        let a = CacheKey::new("a%3Ab", "c", "d");
        let b = CacheKey::new("a:b", "c", "d");
        assert_ne!(a, b);
    }

    #[test]
    fn test_owner_isolation() {
        let a = CacheKey::new("ownerA", "c", "b");
        let b = CacheKey::new("ownerB", "c", "b");
        assert_ne!(a, b);
    }
}
