#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{DomainHash, Siq, SiqMigrator, SiqType, extract_masked_bits};

/// Converts ULIDs into SIQs, best effort.
///
/// A ULID carries 48 bits of milliseconds and 80 random bits, more than a
/// SIQ can hold, so the mapping is lossy and not collision-free. Of the
/// random bits:
///
/// - bits 74..80 are added to the tick timestamp
/// - bits 66..74 become the shard
/// - bits 50..66 fill the counter region, whose low bits are then replaced by
///   the type pattern
///
/// and the rest is discarded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UlidMigrator {
    domain: DomainHash,
}

impl UlidMigrator {
    const TS_EXTRA_MASK: u128 = 0xfc << 72;
    const SHARD_MASK: u128 = 0x3fc << 64;
    const SEQUENCE_MASK: u128 = 0x3fffc << 48;

    pub const fn new(domain: DomainHash) -> Self {
        Self { domain }
    }

    pub const fn domain_hash(&self) -> DomainHash {
        self.domain
    }
}

impl SiqMigrator for UlidMigrator {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn to_siq(&self, orig: u128, kind: SiqType) -> Siq {
        let extra = extract_masked_bits(orig, Self::TS_EXTRA_MASK);
        let shard = extract_masked_bits(orig, Self::SHARD_MASK);
        let sequence = extract_masked_bits(orig, Self::SEQUENCE_MASK) as u16;

        let ticks = ((orig >> 80) << 16) / 1000 + extra;
        let tag_mask = (1_u16 << kind.n_bits()) - 1;
        let sequence = (sequence & !tag_mask) | kind.pattern();
        Siq::from_components(ticks as u64, shard as u8, self.domain, sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: u128 = 0x0156_3DF3_6AB5_FC6B_2B3E_1B4F_0E47_D8A3;

    fn migrator() -> UlidMigrator {
        UlidMigrator::new(DomainHash::from_domain("example.com").unwrap())
    }

    #[test]
    fn reference_values() {
        let m = migrator();
        let content = m.to_siq(SAMPLE, SiqType::Content);
        assert_eq!(content.to_raw(), 6_941_492_336_225_022_257_568_841_976_527);
        assert_eq!(content.to_hex(), "579d2be1f9551a86ce1947cacf");
        assert_eq!(
            m.to_siq(SAMPLE, SiqType::User).to_raw(),
            6_941_492_336_225_022_257_568_841_976_512
        );
    }

    #[test]
    fn fields_come_from_the_random_part() {
        let id = migrator().to_siq(SAMPLE, SiqType::Thread);
        let millis = (SAMPLE >> 80) as u64;
        assert_eq!(id.timestamp_ticks(), (millis << 16) / 1000 + 0b11_1111);
        assert_eq!(id.shard_id(), 0x1a);
        assert_eq!(id.sequence() & 0b1111, SiqType::Thread.pattern());
        assert_eq!(id.domain_hash(), 2_261_653_831);
    }

    #[test]
    fn discarded_bits_do_not_matter() {
        let m = migrator();
        let noisy = SAMPLE ^ 0x3_ffff_ffff_ffff;
        assert_eq!(m.to_siq(SAMPLE, SiqType::Event), m.to_siq(noisy, SiqType::Event));
    }
}
