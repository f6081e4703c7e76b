use core::fmt;

use crate::{DomainHash, Error, Result, TICKS_PER_SECOND};

/// A 112-bit SIQ, stored in the low bits of a `u128`.
///
/// ## Bit layout
///
/// ```text
///  Bit Index:  111          56 55     48 47          16 15         0
///              +--------------+---------+--------------+------------+
///  Field:      | ticks (56)   | shard 8 | domain (32)  | seq (16)   |
///              +--------------+---------+--------------+------------+
///              |<----- MSB ---------- 112 bits ---------- LSB ----->|
/// ```
///
/// `ticks` are 1/65536 second units since the Unix epoch (40 bits of seconds
/// and 16 bits of fraction). `seq` holds the [`SiqType`] pattern in its low
/// bits and the rolling counter above it.
///
/// [`SiqType`]: crate::SiqType
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Siq {
    id: u128,
}

impl Siq {
    /// Total width of the identifier.
    pub const BITS: u32 = 112;
    /// Nominal serialized width.
    pub const BYTES: usize = 14;

    /// Number of bits allocated to the sequence (bits 0-15).
    pub const SEQUENCE_BITS: u32 = 16;
    /// Number of bits allocated to the domain hash (bits 16-47).
    pub const DOMAIN_BITS: u32 = 32;
    /// Number of bits allocated to the shard id (bits 48-55).
    pub const SHARD_BITS: u32 = 8;
    /// Number of bits allocated to the tick timestamp (bits 56-111).
    pub const TIMESTAMP_BITS: u32 = 56;

    /// Bit offset of the sequence field.
    pub const SEQUENCE_SHIFT: u32 = 0;
    /// Bit offset of the domain hash field.
    pub const DOMAIN_SHIFT: u32 = Self::SEQUENCE_SHIFT + Self::SEQUENCE_BITS;
    /// Bit offset of the shard id field.
    pub const SHARD_SHIFT: u32 = Self::DOMAIN_SHIFT + Self::DOMAIN_BITS;
    /// Bit offset of the timestamp field.
    pub const TIMESTAMP_SHIFT: u32 = Self::SHARD_SHIFT + Self::SHARD_BITS;

    /// Mask for the sequence field (unshifted).
    pub const SEQUENCE_MASK: u128 = (1 << Self::SEQUENCE_BITS) - 1;
    /// Mask for the domain hash field (unshifted).
    pub const DOMAIN_MASK: u128 = (1 << Self::DOMAIN_BITS) - 1;
    /// Mask for the shard id field (unshifted).
    pub const SHARD_MASK: u128 = (1 << Self::SHARD_BITS) - 1;
    /// Mask for the timestamp field (unshifted).
    pub const TIMESTAMP_MASK: u128 = (1 << Self::TIMESTAMP_BITS) - 1;

    /// Mask of every valid bit.
    pub const MAX: u128 = (1 << Self::BITS) - 1;

    /// Packs the four fields. Each value is truncated to its field width.
    pub const fn from_components(
        ticks: u64,
        shard_id: u8,
        domain: DomainHash,
        sequence: u16,
    ) -> Self {
        let t = (ticks as u128 & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let s = (shard_id as u128) << Self::SHARD_SHIFT;
        let d = (domain.get() as u128) << Self::DOMAIN_SHIFT;
        let q = (sequence as u128) << Self::SEQUENCE_SHIFT;
        Self { id: t | s | d | q }
    }

    /// Wraps a raw integer, discarding bits above 112.
    pub const fn from_raw(raw: u128) -> Self {
        Self { id: raw & Self::MAX }
    }

    /// Wraps a raw integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] if any bit above 112 is set.
    pub fn try_from_raw(raw: u128) -> Result<Self> {
        if raw > Self::MAX {
            return Err(Error::Overflow { bits: Self::BITS });
        }
        Ok(Self { id: raw })
    }

    /// The underlying integer.
    pub const fn to_raw(self) -> u128 {
        self.id
    }

    /// Timestamp in 1/65536 second ticks since the Unix epoch.
    pub const fn timestamp_ticks(self) -> u64 {
        ((self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK) as u64
    }

    /// Timestamp in (fractional) seconds since the Unix epoch.
    pub fn timestamp(self) -> f64 {
        self.timestamp_ticks() as f64 / TICKS_PER_SECOND as f64
    }

    /// Whole seconds since the Unix epoch.
    pub const fn seconds(self) -> u64 {
        self.timestamp_ticks() >> 16
    }

    /// Sub-second part, in 1/65536 ticks.
    pub const fn fraction(self) -> u16 {
        self.timestamp_ticks() as u16
    }

    /// Shard that generated the identifier.
    pub const fn shard_id(self) -> u8 {
        ((self.id >> Self::SHARD_SHIFT) & Self::SHARD_MASK) as u8
    }

    /// Domain hash, including any local id override in its top byte.
    pub const fn domain_hash(self) -> u32 {
        ((self.id >> Self::DOMAIN_SHIFT) & Self::DOMAIN_MASK) as u32
    }

    /// The tag pattern and counter region.
    pub const fn sequence(self) -> u16 {
        ((self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK) as u16
    }
}

impl From<Siq> for u128 {
    fn from(id: Siq) -> Self {
        id.to_raw()
    }
}

impl TryFrom<u128> for Siq {
    type Error = Error;

    fn try_from(raw: u128) -> Result<Self> {
        Self::try_from_raw(raw)
    }
}

impl fmt::Debug for Siq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Siq")
            .field("id", &self.id)
            .field("ticks", &self.timestamp_ticks())
            .field("shard_id", &self.shard_id())
            .field("domain_hash", &self.domain_hash())
            .field("sequence", &self.sequence())
            .finish()
    }
}
