use core::{fmt, str::FromStr};

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

use crate::{
    Base32Error, Error, Result, Siq,
    encoding::{Alphabet, CROCKFORD, RFC4648_LOWER},
};

/// URL-safe base64 that never pads on output and tolerates padding on input.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Width of the textual base32 forms: 15 bytes, exactly 24 symbols.
const WIDE_BYTES: usize = Siq::BYTES + 1;
const WIDE_BASE32_LEN: usize = 24;

const DID_PREFIX: &str = "did:siq:";
/// The checksum field is 48 bits wide but CRC32 only fills 32 of them, so
/// the first three symbols are always `a`.
const DID_ELIDED: &str = "aaa";
const DID_BODY_LEN: usize = 29;

impl Siq {
    /// Big-endian 14-byte form.
    pub fn to_bytes(self) -> [u8; Self::BYTES] {
        let mut out = [0; Self::BYTES];
        out.copy_from_slice(&self.to_raw().to_be_bytes()[16 - Self::BYTES..]);
        out
    }

    /// Big-endian form left-padded with zeros to `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `len` is below 14.
    pub fn to_bytes_padded(self, len: usize) -> Result<Vec<u8>> {
        if len < Self::BYTES {
            return Err(Error::BufferTooSmall {
                len,
                min: Self::BYTES,
            });
        }
        let mut out = vec![0; len - Self::BYTES];
        out.extend_from_slice(&self.to_bytes());
        Ok(out)
    }

    fn to_wide_bytes(self) -> [u8; WIDE_BYTES] {
        let mut out = [0; WIDE_BYTES];
        out[1..].copy_from_slice(&self.to_bytes());
        out
    }

    /// Reads a big-endian value of any length.
    ///
    /// Inputs shorter than 14 bytes are zero-extended on the left.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] if the value does not fit 112 bits.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::BYTES {
            #[cfg(feature = "tracing")]
            tracing::warn!(len = bytes.len(), "decoding a SIQ shorter than 14 bytes");
        }
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        let significant = &bytes[start..];
        if significant.len() > Self::BYTES {
            return Err(Error::Overflow { bits: Self::BITS });
        }
        let raw = significant
            .iter()
            .fold(0_u128, |acc, &b| (acc << 8) | u128::from(b));
        Self::try_from_raw(raw)
    }

    /// Lowercase hexadecimal, without prefix or padding.
    pub fn to_hex(self) -> String {
        format!("{self:x}")
    }

    /// Parses hexadecimal, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDigits`] on malformed input and
    /// [`Error::Overflow`] if the value does not fit 112 bits.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        Self::try_from_raw(u128::from_str_radix(digits, 16)?)
    }

    /// Octal, without prefix or padding.
    pub fn to_oct(self) -> String {
        format!("{self:o}")
    }

    /// Parses octal, with or without a `0o` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDigits`] on malformed input and
    /// [`Error::Overflow`] if the value does not fit 112 bits.
    pub fn from_oct(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0o").unwrap_or(s);
        Self::try_from_raw(u128::from_str_radix(digits, 8)?)
    }

    /// URL-safe, unpadded base64 of the 15-byte form.
    ///
    /// ```
    /// use siq::Siq;
    ///
    /// let id = Siq::from_raw(7_451_106_619_238_957_490_390_643_507_207);
    /// assert_eq!(id.to_base64(), "AABeC9LwAAAAAAAAAAAH");
    /// ```
    pub fn to_base64(self) -> String {
        URL_SAFE_LENIENT.encode(self.to_wide_bytes())
    }

    /// Parses URL-safe base64, padded or not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Base64`] on malformed input and [`Error::Overflow`]
    /// if the value does not fit 112 bits.
    pub fn from_base64(s: &str) -> Result<Self> {
        Self::from_bytes(&URL_SAFE_LENIENT.decode(s)?)
    }

    /// Lowercase RFC 4648 base32 of the 15-byte form, always 24 characters.
    ///
    /// This is not the DID form; see [`Siq::to_did`].
    pub fn to_b32l(self) -> String {
        RFC4648_LOWER.encode(&self.to_wide_bytes())
    }

    /// Parses lowercase (or uppercase) RFC 4648 base32. Shorter inputs are
    /// left-padded with `a`, the zero symbol.
    ///
    /// # Errors
    ///
    /// Returns [`Base32Error`] on malformed input and [`Error::Overflow`] if
    /// the value does not fit 112 bits.
    pub fn from_b32l(s: &str) -> Result<Self> {
        Self::from_base32_padded(s, b'a', &RFC4648_LOWER)
    }

    /// Crockford base32 of the 15-byte form with leading zeros stripped.
    ///
    /// ```
    /// use siq::Siq;
    ///
    /// let id = Siq::from_raw(7_451_106_619_238_957_490_390_643_507_207);
    /// assert_eq!(id.to_crockford(), "5W2YJY000000000000007");
    /// ```
    pub fn to_crockford(self) -> String {
        CROCKFORD
            .encode(&self.to_wide_bytes())
            .trim_start_matches('0')
            .to_owned()
    }

    /// Parses Crockford base32, case-insensitive and alias-tolerant.
    ///
    /// # Errors
    ///
    /// Returns [`Base32Error`] on malformed input and [`Error::Overflow`] if
    /// the value does not fit 112 bits.
    pub fn from_crockford(s: &str) -> Result<Self> {
        Self::from_base32_padded(s, b'0', &CROCKFORD)
    }

    fn from_base32_padded(s: &str, zero: u8, alphabet: &Alphabet) -> Result<Self> {
        if s.len() > WIDE_BASE32_LEN {
            return Err(Base32Error::DecodeInvalidLen { len: s.len() }.into());
        }
        let mut padded = String::with_capacity(WIDE_BASE32_LEN);
        padded.extend(core::iter::repeat_n(char::from(zero), WIDE_BASE32_LEN - s.len()));
        padded.push_str(s);
        Self::from_bytes(&alphabet.decode(&padded)?)
    }

    /// The checksummed body used by the DID and handle forms.
    pub(crate) fn did_body(self) -> String {
        let bytes = self.to_bytes();
        let checksum = u64::from(crc32fast::hash(&bytes));
        let mut buf = [0; 6 + Self::BYTES];
        buf[..6].copy_from_slice(&checksum.to_be_bytes()[2..]);
        buf[6..].copy_from_slice(&bytes);
        let mut encoded = RFC4648_LOWER.encode(&buf);
        encoded.drain(..DID_ELIDED.len());
        encoded
    }

    /// Decentralized identifier form: `did:siq:` followed by 29 base32
    /// characters carrying a CRC32 checksum and the 14 value bytes.
    ///
    /// ```
    /// use siq::Siq;
    ///
    /// let id = Siq::from_raw(7_451_106_619_238_957_490_390_643_507_207);
    /// assert_eq!(id.to_did(), "did:siq:iuxvojaaf4c6s6aaaaaaaaaaaaaah");
    /// assert_eq!(Siq::from_did(&id.to_did()), Ok(id));
    /// ```
    pub fn to_did(self) -> String {
        format!("{DID_PREFIX}{}", self.did_body())
    }

    /// Parses the DID form, with or without the `did:siq:` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Base32Error::DecodeInvalidLen`] if the body is not 29
    /// characters, [`Base32Error::DecodeInvalidAscii`] on foreign characters
    /// and [`Error::ChecksumMismatch`] if the checksum does not match.
    pub fn from_did(did: &str) -> Result<Self> {
        let body = did.strip_prefix(DID_PREFIX).unwrap_or(did);
        if body.len() != DID_BODY_LEN {
            return Err(Base32Error::DecodeInvalidLen { len: body.len() }.into());
        }
        let decoded = RFC4648_LOWER.decode(&format!("{DID_ELIDED}{body}"))?;
        let (checksum, payload) = decoded.split_at(6);
        let found = checksum
            .iter()
            .fold(0_u64, |acc, &b| (acc << 8) | u64::from(b));
        let expected = crc32fast::hash(payload);
        if found != u64::from(expected) {
            return Err(Error::ChecksumMismatch { expected, found });
        }
        Self::from_bytes(payload)
    }

    /// Fediverse-style handle: `@<body>` or `@<body>@<domain>`.
    pub fn to_mastodon(self, domain: Option<&str>) -> String {
        match domain {
            Some(domain) => format!("@{}@{domain}", self.did_body()),
            None => format!("@{}", self.did_body()),
        }
    }

    /// Matrix-style user id: `@<body>:<domain>`.
    pub fn to_matrix(self, domain: &str) -> String {
        format!("@{}:{domain}", self.did_body())
    }
}

impl fmt::Display for Siq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_raw(), f)
    }
}

impl fmt::LowerHex for Siq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.to_raw(), f)
    }
}

impl fmt::Octal for Siq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Octal::fmt(&self.to_raw(), f)
    }
}

impl FromStr for Siq {
    type Err = Error;

    /// Parses the decimal form.
    fn from_str(s: &str) -> Result<Self> {
        Self::try_from_raw(s.parse::<u128>()?)
    }
}
