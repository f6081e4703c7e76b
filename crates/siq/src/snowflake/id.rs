use core::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{
    Base32Error, Error, Result, Siq, SiqMigrator, SiqType,
    encoding::{CROCKFORD, RFC4648_LOWER},
};

/// A 64-bit snowflake in the Discord layout.
///
/// ## Bit layout
///
/// ```text
///  Bit Index:  63           22 21    17 16    12 11         0
///              +--------------+--------+--------+------------+
///  Field:      | millis (42)  | local 5| shard 5| seq (12)   |
///              +--------------+--------+--------+------------+
/// ```
///
/// The timestamp counts milliseconds since the scheme's own epoch (see
/// [`DISCORD_EPOCH`](crate::DISCORD_EPOCH) and friends).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake {
    id: u64,
}

impl Snowflake {
    /// Number of bits allocated to the sequence (bits 0-11).
    pub const SEQUENCE_BITS: u32 = 12;
    /// Number of bits allocated to the shard (worker) id (bits 12-16).
    pub const SHARD_BITS: u32 = 5;
    /// Number of bits allocated to the local (process) id (bits 17-21).
    pub const LOCAL_BITS: u32 = 5;
    /// Number of bits allocated to the millisecond timestamp (bits 22-63).
    pub const TIMESTAMP_BITS: u32 = 42;

    /// Bit offset of the sequence field.
    pub const SEQUENCE_SHIFT: u32 = 0;
    /// Bit offset of the shard id field.
    pub const SHARD_SHIFT: u32 = Self::SEQUENCE_SHIFT + Self::SEQUENCE_BITS;
    /// Bit offset of the local id field.
    pub const LOCAL_SHIFT: u32 = Self::SHARD_SHIFT + Self::SHARD_BITS;
    /// Bit offset of the timestamp field.
    pub const TIMESTAMP_SHIFT: u32 = Self::LOCAL_SHIFT + Self::LOCAL_BITS;

    /// Mask for the sequence field (unshifted).
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;
    /// Mask for the shard id field (unshifted).
    pub const SHARD_MASK: u64 = (1 << Self::SHARD_BITS) - 1;
    /// Mask for the local id field (unshifted).
    pub const LOCAL_MASK: u64 = (1 << Self::LOCAL_BITS) - 1;
    /// Mask for the timestamp field (unshifted).
    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;

    /// Packs the four fields. Each value is truncated to its field width.
    pub const fn from_components(millis: u64, local_id: u8, shard_id: u8, sequence: u16) -> Self {
        let t = (millis & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let l = (local_id as u64 & Self::LOCAL_MASK) << Self::LOCAL_SHIFT;
        let s = (shard_id as u64 & Self::SHARD_MASK) << Self::SHARD_SHIFT;
        let q = (sequence as u64 & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self { id: t | l | s | q }
    }

    /// Wraps a raw snowflake.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    pub const fn to_raw(self) -> u64 {
        self.id
    }

    /// Milliseconds since the scheme's epoch.
    pub const fn timestamp_millis(self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Local (process) id.
    pub const fn local_id(self) -> u8 {
        ((self.id >> Self::LOCAL_SHIFT) & Self::LOCAL_MASK) as u8
    }

    /// Shard (worker) id.
    pub const fn shard_id(self) -> u8 {
        ((self.id >> Self::SHARD_SHIFT) & Self::SHARD_MASK) as u8
    }

    /// Per-millisecond sequence.
    pub const fn sequence(self) -> u16 {
        ((self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK) as u16
    }

    pub const fn to_bytes(self) -> [u8; 8] {
        self.id.to_be_bytes()
    }

    /// Reads a big-endian value of any length. Snowflakes are 8 bytes (10 in
    /// the base32 form); other lengths are accepted with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] if the value does not fit 64 bits.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 8 && bytes.len() != 10 {
            #[cfg(feature = "tracing")]
            tracing::warn!(len = bytes.len(), "snowflakes are exactly 8 bytes long");
        }
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        let significant = &bytes[start..];
        if significant.len() > 8 {
            return Err(Error::Overflow { bits: u64::BITS });
        }
        let raw = significant
            .iter()
            .fold(0_u64, |acc, &b| (acc << 8) | u64::from(b));
        Ok(Self::from_raw(raw))
    }

    pub fn to_hex(self) -> String {
        format!("{self:x}")
    }

    pub fn to_oct(self) -> String {
        format!("{self:o}")
    }

    /// URL-safe, unpadded base64 of the 9-byte form.
    pub fn to_base64(self) -> String {
        let mut wide = [0; 9];
        wide[1..].copy_from_slice(&self.to_bytes());
        URL_SAFE_NO_PAD.encode(wide)
    }

    /// Crockford base32 of the 8-byte form, always 13 characters.
    ///
    /// ```
    /// use siq::Snowflake;
    ///
    /// assert_eq!(Snowflake::from_raw(175_928_847_299_117_063).to_crockford(), "09RGCPP10800E");
    /// ```
    pub fn to_crockford(self) -> String {
        CROCKFORD.encode(&self.to_bytes())
    }

    /// Lowercase base32 of the 10-byte form with leading `a` stripped.
    pub fn to_b32l(self) -> String {
        let mut wide = [0; 10];
        wide[2..].copy_from_slice(&self.to_bytes());
        RFC4648_LOWER
            .encode(&wide)
            .trim_start_matches('a')
            .to_owned()
    }

    /// Inverse of [`Snowflake::to_b32l`].
    ///
    /// # Errors
    ///
    /// Returns [`Base32Error`] on malformed input and [`Error::Overflow`] if
    /// the value does not fit 64 bits.
    pub fn from_b32l(s: &str) -> Result<Self> {
        const WIDTH: usize = 16;
        if s.len() > WIDTH {
            return Err(Base32Error::DecodeInvalidLen { len: s.len() }.into());
        }
        let padded = format!("{s:a>WIDTH$}");
        Self::from_bytes(&RFC4648_LOWER.decode(&padded)?)
    }

    /// Renders with a short format option: `b`, `c`, `0c`, `d` (or empty),
    /// `l`, `o` or `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormat`] for any other option.
    pub fn format(self, option: &str) -> Result<String> {
        Ok(match option {
            "b" => self.to_base64(),
            "c" => self.to_crockford(),
            "0c" => format!("0{}", self.to_crockford()),
            "d" | "" => self.to_string(),
            "l" => self.to_b32l(),
            "o" => self.to_oct(),
            "x" => self.to_hex(),
            _ => return Err(Error::UnknownFormat(option.to_owned())),
        })
    }

    /// Converts with `migrator`. The result is not checked against existing
    /// identifiers.
    pub fn to_siq(self, migrator: &impl SiqMigrator, kind: SiqType) -> Siq {
        migrator.to_siq(u128::from(self.id), kind)
    }
}

impl From<Snowflake> for u64 {
    fn from(id: Snowflake) -> Self {
        id.to_raw()
    }
}

impl From<u64> for Snowflake {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Debug for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snowflake")
            .field("id", &self.id)
            .field("millis", &self.timestamp_millis())
            .field("local_id", &self.local_id())
            .field("shard_id", &self.shard_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl fmt::LowerHex for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.id, f)
    }
}

impl fmt::Octal for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Octal::fmt(&self.id, f)
    }
}

impl FromStr for Snowflake {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::from_raw(s.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DISCORD_EPOCH, DomainHash, SnowflakeMigrator};

    const SAMPLE: Snowflake = Snowflake::from_raw(175_928_847_299_117_063);

    #[test]
    fn discord_fields() {
        assert_eq!(SAMPLE.timestamp_millis(), 41_944_705_796);
        assert_eq!(SAMPLE.local_id(), 1);
        assert_eq!(SAMPLE.shard_id(), 0);
        assert_eq!(SAMPLE.sequence(), 7);
        assert_eq!(Snowflake::from_components(41_944_705_796, 1, 0, 7), SAMPLE);
    }

    #[test]
    fn components_are_truncated() {
        let id = Snowflake::from_components(u64::MAX, 0xff, 0xff, u16::MAX);
        assert_eq!(id.to_raw(), u64::MAX);
        assert_eq!(id.local_id(), 31);
        assert_eq!(id.sequence(), 4095);
    }

    #[test]
    fn text_forms() {
        assert_eq!(SAMPLE.to_string(), "175928847299117063");
        assert_eq!(SAMPLE.to_hex(), "271065ac1020007");
        assert_eq!(SAMPLE.to_oct(), "11610145530100400007");
        assert_eq!(SAMPLE.to_base64(), "AAJxBlrBAgAH");
        assert_eq!(SAMPLE.to_crockford(), "09RGCPP10800E");
        assert_eq!(SAMPLE.to_b32l(), "e4igllaqeaah");
        assert_eq!("175928847299117063".parse(), Ok(SAMPLE));
    }

    #[test]
    fn b32l_roundtrip_and_limits() {
        assert_eq!(Snowflake::from_b32l("e4igllaqeaah"), Ok(SAMPLE));
        let zero = Snowflake::from_raw(0);
        assert_eq!(zero.to_b32l(), "");
        assert_eq!(Snowflake::from_b32l(""), Ok(zero));
        let max = Snowflake::from_raw(u64::MAX);
        assert_eq!(Snowflake::from_b32l(&max.to_b32l()), Ok(max));
        assert_eq!(
            Snowflake::from_b32l("aaaaaaaaaaaaaaaaa"),
            Err(Error::Base32(Base32Error::DecodeInvalidLen { len: 17 }))
        );
    }

    #[test]
    fn format_options() {
        assert_eq!(SAMPLE.format("0c").unwrap(), "009RGCPP10800E");
        assert_eq!(SAMPLE.format("").unwrap(), "175928847299117063");
        assert_eq!(SAMPLE.format("u"), Err(Error::UnknownFormat("u".into())));
    }

    #[test]
    fn bytes_roundtrip() {
        assert_eq!(Snowflake::from_bytes(&SAMPLE.to_bytes()), Ok(SAMPLE));
        assert_eq!(Snowflake::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 1]).map(u64::from), Ok(1));
        assert_eq!(
            Snowflake::from_bytes(&[1, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(Error::Overflow { bits: 64 })
        );
    }

    #[test]
    fn converts_to_siq() {
        let migrator =
            SnowflakeMigrator::new(DomainHash::from_domain("example.com").unwrap(), DISCORD_EPOCH);
        assert_eq!(
            SAMPLE.to_siq(&migrator, SiqType::User).to_raw(),
            6_904_171_133_060_110_654_416_053_797_088
        );
    }
}
