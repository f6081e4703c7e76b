use core::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{DomainHash, Siq, SiqMigrator, SiqType, extract_masked_bits};

/// Converts snowflakes (Twitter, Discord and lookalikes) into SIQs.
///
/// The default layout is Discord's:
///
/// ```text
///  tttttttt tttttttt tttttttt tttttttt
///  tttttttt ttddddds sssspppp pppppppp
/// ```
///
/// - `t`: milliseconds since the scheme's epoch (42 bits)
/// - `d`/`s`: local and shard id (10 bits); the low 8 become the SIQ shard,
///   the high 2 add sub-millisecond precision to the timestamp
/// - `p`: serial (12 bits); when the target type has fewer counter bits, the
///   serial's high bits are folded into the timestamp as well
///
/// One snowflake maps to exactly one SIQ. Timestamps past the 56-bit tick
/// field saturate at its maximum.
///
/// ```
/// use siq::{DISCORD_EPOCH, DomainHash, SiqMigrator, SiqType, SnowflakeMigrator};
///
/// let domain = DomainHash::from_domain("example.com").unwrap();
/// let migrator = SnowflakeMigrator::new(domain, DISCORD_EPOCH);
/// let id = migrator.to_siq(175_928_847_299_117_063, SiqType::Content);
/// assert_eq!(id.to_raw(), 6_904_171_133_060_110_654_416_053_796_927);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SnowflakeMigrator {
    domain: DomainHash,
    epoch: Duration,
    ts_stop: u32,
    ts_accuracy: u64,
    shard_mask: u128,
    shard_ts_mask: u128,
    serial_mask: u128,
}

impl SnowflakeMigrator {
    pub const DEFAULT_TS_STOP: u32 = 22;
    pub const DEFAULT_TS_ACCURACY: u64 = 1000;
    pub const DEFAULT_SHARD_MASK: u128 = 0xff << 12;
    pub const DEFAULT_SHARD_TS_MASK: u128 = 0b11 << 20;
    pub const DEFAULT_SERIAL_MASK: u128 = 0xfff;

    /// A migrator for the Discord layout with the given epoch (relative to
    /// the Unix epoch).
    pub const fn new(domain: DomainHash, epoch: Duration) -> Self {
        Self {
            domain,
            epoch,
            ts_stop: Self::DEFAULT_TS_STOP,
            ts_accuracy: Self::DEFAULT_TS_ACCURACY,
            shard_mask: Self::DEFAULT_SHARD_MASK,
            shard_ts_mask: Self::DEFAULT_SHARD_TS_MASK,
            serial_mask: Self::DEFAULT_SERIAL_MASK,
        }
    }

    /// Lowest bit of the timestamp field. Clamped to 127.
    #[must_use]
    pub const fn ts_stop(mut self, ts_stop: u32) -> Self {
        self.ts_stop = if ts_stop > u128::BITS - 1 {
            u128::BITS - 1
        } else {
            ts_stop
        };
        self
    }

    /// Timestamp units per second. Zero is treated as one.
    #[must_use]
    pub const fn ts_accuracy(mut self, ts_accuracy: u64) -> Self {
        self.ts_accuracy = if ts_accuracy == 0 { 1 } else { ts_accuracy };
        self
    }

    /// Bits copied into the SIQ shard (low 8 bits kept).
    #[must_use]
    pub const fn shard_mask(mut self, mask: u128) -> Self {
        self.shard_mask = mask;
        self
    }

    /// Bits added below the tick timestamp. Zero disables.
    #[must_use]
    pub const fn shard_ts_mask(mut self, mask: u128) -> Self {
        self.shard_ts_mask = mask;
        self
    }

    /// Bits carried into the counter.
    #[must_use]
    pub const fn serial_mask(mut self, mask: u128) -> Self {
        self.serial_mask = mask;
        self
    }

    pub const fn domain_hash(&self) -> DomainHash {
        self.domain
    }

    pub const fn epoch(&self) -> Duration {
        self.epoch
    }
}

impl SiqMigrator for SnowflakeMigrator {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn to_siq(&self, orig: u128, kind: SiqType) -> Siq {
        let millis = (orig >> self.ts_stop).saturating_add(self.epoch.as_millis());
        let ticks = millis.saturating_mul(1 << 16) / u128::from(self.ts_accuracy);

        let shard = extract_masked_bits(orig, self.shard_mask);
        let mut extra = extract_masked_bits(orig, self.shard_ts_mask);
        let mut serial = extract_masked_bits(orig, self.serial_mask);

        let counter_bits = kind.counter_bits();
        let serial_bits = self.serial_mask.count_ones();
        if counter_bits < serial_bits {
            let overflow = serial >> counter_bits;
            serial &= (1 << counter_bits) - 1;
            extra = (extra << (serial_bits - counter_bits)).saturating_add(overflow);
        }
        let ticks = ticks.saturating_add(extra).min(Siq::TIMESTAMP_MASK) as u64;

        let sequence = kind.prepend(serial as u32) & 0xffff;
        Siq::from_components(ticks, shard as u8, self.domain, sequence as u16)
    }
}
