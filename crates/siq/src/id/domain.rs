use core::fmt;

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Deterministic 32-bit hash of a logical namespace.
///
/// Every generator serving one logical service should be built from the same
/// domain name so that their identifiers share a namespace.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainHash(u32);

impl DomainHash {
    /// Reserved "no domain" value.
    pub const NONE: Self = Self(0);

    /// Hashes `domain` with SHA-256 and keeps the last four bytes.
    ///
    /// The empty string and `"0"` map to [`DomainHash::NONE`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonAsciiDomain`] if `domain` is not ASCII.
    ///
    /// ```
    /// use siq::DomainHash;
    ///
    /// assert_eq!(DomainHash::from_domain("example.com").unwrap().get(), 2_261_653_831);
    /// assert_eq!(DomainHash::from_domain("0").unwrap(), DomainHash::NONE);
    /// ```
    pub fn from_domain(domain: &str) -> Result<Self> {
        if domain.is_empty() || domain == "0" {
            return Ok(Self::NONE);
        }
        if !domain.is_ascii() {
            return Err(Error::NonAsciiDomain(domain.to_owned()));
        }
        let digest = Sha256::digest(domain.as_bytes());
        let mut tail = [0_u8; 4];
        tail.copy_from_slice(&digest[digest.len() - 4..]);
        Ok(Self(u32::from_be_bytes(tail)))
    }

    /// Replaces the top byte with `local_id mod 256`.
    ///
    /// Zero leaves the hash untouched; pass 256 to force the top byte to zero.
    #[must_use]
    pub const fn with_local_id(self, local_id: u16) -> Self {
        if local_id == 0 {
            return self;
        }
        Self(((local_id as u32 % 256) << 24) | (self.0 & 0x00ff_ffff))
    }

    /// Wraps a precomputed hash.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw hash value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<DomainHash> for u32 {
    fn from(hash: DomainHash) -> Self {
        hash.0
    }
}

impl fmt::Display for DomainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Computes the domain hash of `domain`, optionally overriding its top byte.
///
/// The reserved names (`""`, `"0"`) always hash to zero, even with a local id.
///
/// # Errors
///
/// Returns [`Error::NonAsciiDomain`] if `domain` is not ASCII.
pub fn domain_hash(domain: &str, local_id: Option<u16>) -> Result<u32> {
    let hash = DomainHash::from_domain(domain)?;
    if hash == DomainHash::NONE {
        return Ok(0);
    }
    Ok(local_id.map_or(hash, |id| hash.with_local_id(id)).get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names_hash_to_zero() {
        assert_eq!(domain_hash("", None), Ok(0));
        assert_eq!(domain_hash("0", None), Ok(0));
    }

    #[test]
    fn hash_is_deterministic() {
        for name in ["example.com", "yusur.moe", "a", "0.0"] {
            assert_eq!(DomainHash::from_domain(name), DomainHash::from_domain(name));
        }
        assert_eq!(domain_hash("example.com", None), Ok(2_261_653_831));
    }

    #[test]
    fn local_id_overrides_top_byte() {
        assert_eq!(domain_hash("example.com", Some(7)), Ok(130_947_399));
        assert_eq!(domain_hash("example.com", Some(256)), Ok(13_506_887));
        assert_eq!(domain_hash("example.com", Some(0)), Ok(2_261_653_831));
        assert_eq!(domain_hash("example.com", Some(263)), domain_hash("example.com", Some(7)));
    }

    #[test]
    fn override_does_not_apply_to_reserved_domain() {
        assert_eq!(domain_hash("0", Some(5)), Ok(0));
    }

    #[test]
    fn rejects_non_ascii_names() {
        assert!(matches!(
            DomainHash::from_domain("bücher.example"),
            Err(Error::NonAsciiDomain(_))
        ));
    }
}
