use compact_str::CompactString;
use ferrous_sip_domain::RecordType;
use std::fmt;
use std::hash::{Hash, Hasher};

/// (domain, type) identity of a cached record set. Domains are stored
/// lower-cased and without the trailing root dot so lookups are
/// case-insensitive.
#[derive(Clone, Debug, Eq)]
pub struct CacheKey {
    pub domain: CompactString,
    pub record_type: RecordType,
}

impl CacheKey {
    #[inline]
    pub fn new(domain: &str, record_type: RecordType) -> Self {
        Self {
            domain: normalize_domain(domain),
            record_type,
        }
    }
}

pub fn normalize_domain(domain: &str) -> CompactString {
    let trimmed = domain.trim_end_matches('.');
    if trimmed.bytes().any(|b| b.is_ascii_uppercase()) {
        CompactString::from(trimmed.to_ascii_lowercase())
    } else {
        CompactString::from(trimmed)
    }
}

impl Hash for CacheKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.domain.as_str().hash(state);
        self.record_type.to_u16().hash(state);
    }
}

impl PartialEq for CacheKey {
    #[inline]
    fn eq(&self, other: &CacheKey) -> bool {
        self.record_type == other.record_type && self.domain == other.domain
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.domain, self.record_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_case_insensitive() {
        assert_eq!(
            CacheKey::new("Example.COM.", RecordType::A),
            CacheKey::new("example.com", RecordType::A)
        );
    }

    #[test]
    fn test_key_distinguishes_type() {
        assert_ne!(
            CacheKey::new("example.com", RecordType::A),
            CacheKey::new("example.com", RecordType::AAAA)
        );
    }
}
