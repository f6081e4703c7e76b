use crate::{DomainHash, Result, Siq};

/// Settings for building a generator.
///
/// Every generator of one logical service must share `domain`; each running
/// instance should get its own `shard_id`.
///
/// ```
/// use siq::GeneratorConfig;
///
/// let config = GeneratorConfig::new("example.com").with_shard_id(3);
/// let (domain, shard) = config.resolve().unwrap();
/// assert_eq!(domain.get(), 2_261_653_831);
/// assert_eq!(shard, 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct GeneratorConfig {
    /// Namespace hashed into every identifier. `""` and `"0"` mean none.
    pub domain: String,
    /// Optional override of the domain hash's top byte.
    pub local_id: Option<u16>,
    /// Shard id, reduced modulo 256. Defaults to the process id.
    pub shard_id: Option<u16>,
    /// Last identifier emitted by a previous run, to resume after.
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::serde::deserialize_last_id")
    )]
    pub last_id: Option<Siq>,
}

impl GeneratorConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_local_id(mut self, local_id: u16) -> Self {
        self.local_id = Some(local_id);
        self
    }

    #[must_use]
    pub const fn with_shard_id(mut self, shard_id: u16) -> Self {
        self.shard_id = Some(shard_id);
        self
    }

    #[must_use]
    pub const fn with_last_id(mut self, last_id: Siq) -> Self {
        self.last_id = Some(last_id);
        self
    }

    /// Computes the domain hash with the local id override applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonAsciiDomain`](crate::Error::NonAsciiDomain) if the
    /// domain cannot be hashed.
    pub fn domain_hash(&self) -> Result<DomainHash> {
        let domain = DomainHash::from_domain(&self.domain)?;
        Ok(match self.local_id {
            Some(local_id) if domain != DomainHash::NONE => domain.with_local_id(local_id),
            _ => domain,
        })
    }

    /// Computes the domain hash and the effective shard id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonAsciiDomain`](crate::Error::NonAsciiDomain) if the
    /// domain cannot be hashed.
    pub fn resolve(&self) -> Result<(DomainHash, u8)> {
        let domain = self.domain_hash()?;
        let shard_id = match self.shard_id {
            Some(shard_id) => (shard_id % 256) as u8,
            None => fallback_shard_id(),
        };
        Ok((domain, shard_id))
    }
}

fn fallback_shard_id() -> u8 {
    let shard_id = (std::process::id() % 256) as u8;
    #[cfg(feature = "tracing")]
    tracing::info!(shard_id, "no shard id configured, using the process id");
    shard_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_win() {
        let config = GeneratorConfig::new("example.com")
            .with_local_id(7)
            .with_shard_id(300);
        let (domain, shard) = config.resolve().unwrap();
        assert_eq!(domain.get(), 130_947_399);
        assert_eq!(shard, 44);
    }

    #[test]
    fn reserved_domain_ignores_local_id() {
        let config = GeneratorConfig::new("0").with_local_id(9).with_shard_id(1);
        assert_eq!(config.resolve().unwrap(), (DomainHash::NONE, 1));
    }

    #[test]
    fn missing_shard_falls_back_to_process_id() {
        let (_, shard) = GeneratorConfig::new("").resolve().unwrap();
        assert_eq!(u32::from(shard), std::process::id() % 256);
    }

    #[test]
    fn non_ascii_domain_is_rejected() {
        assert!(GeneratorConfig::new("ドメイン").resolve().is_err());
        assert!(GeneratorConfig::new("ドメイン").domain_hash().is_err());
    }

    #[test]
    fn domain_hash_ignores_shard() {
        let config = GeneratorConfig::new("example.com").with_local_id(7);
        assert_eq!(config.domain_hash().unwrap().get(), 130_947_399);
        assert_eq!(config.shard_id, None);
        assert_eq!(
            config.with_shard_id(3).resolve().unwrap(),
            (DomainHash::from_raw(130_947_399), 3)
        );
        assert_eq!(
            GeneratorConfig::new("example.com").domain_hash().unwrap().get(),
            2_261_653_831
        );
    }
}
