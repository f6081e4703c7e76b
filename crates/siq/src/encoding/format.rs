use core::{fmt, str::FromStr};

use crate::{Error, Result, Siq};

/// Textual encodings a [`Siq`] can be rendered in, keyed by the short
/// option strings of [`Siq::format`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SiqFormat {
    /// `b`: URL-safe base64.
    Base64,
    /// `c`: Crockford base32, leading zeros stripped.
    Crockford,
    /// `0c`: Crockford base32 with a single leading `0`.
    ZeroCrockford,
    /// `d` (or the empty string): decimal.
    Decimal,
    /// `l`: lowercase RFC 4648 base32.
    B32Lower,
    /// `o`: octal.
    Octal,
    /// `u`: the checksummed DID body, without the `did:siq:` prefix.
    DidBody,
    /// `x`: lowercase hexadecimal.
    Hex,
}

impl SiqFormat {
    pub const ALL: [Self; 8] = [
        Self::Base64,
        Self::Crockford,
        Self::ZeroCrockford,
        Self::Decimal,
        Self::B32Lower,
        Self::Octal,
        Self::DidBody,
        Self::Hex,
    ];

    /// The option string selecting this format.
    pub const fn option(self) -> &'static str {
        match self {
            Self::Base64 => "b",
            Self::Crockford => "c",
            Self::ZeroCrockford => "0c",
            Self::Decimal => "d",
            Self::B32Lower => "l",
            Self::Octal => "o",
            Self::DidBody => "u",
            Self::Hex => "x",
        }
    }

    pub fn encode(self, id: Siq) -> String {
        match self {
            Self::Base64 => id.to_base64(),
            Self::Crockford => id.to_crockford(),
            Self::ZeroCrockford => format!("0{}", id.to_crockford()),
            Self::Decimal => id.to_string(),
            Self::B32Lower => id.to_b32l(),
            Self::Octal => id.to_oct(),
            Self::DidBody => id.did_body(),
            Self::Hex => id.to_hex(),
        }
    }

    /// Decodes `s` in this format. `0c` input decodes as plain Crockford.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying decoder.
    pub fn parse(self, s: &str) -> Result<Siq> {
        match self {
            Self::Base64 => Siq::from_base64(s),
            Self::Crockford | Self::ZeroCrockford => Siq::from_crockford(s),
            Self::Decimal => s.parse(),
            Self::B32Lower => Siq::from_b32l(s),
            Self::Octal => Siq::from_oct(s),
            Self::DidBody => Siq::from_did(s),
            Self::Hex => Siq::from_hex(s),
        }
    }
}

impl FromStr for SiqFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::Decimal);
        }
        Self::ALL
            .into_iter()
            .find(|format| format.option() == s)
            .ok_or_else(|| Error::UnknownFormat(s.to_owned()))
    }
}

impl fmt::Display for SiqFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option())
    }
}

impl Siq {
    /// Renders the identifier with a short format option: `b`, `c`, `0c`,
    /// `d` (or empty), `l`, `o`, `u` or `x`.
    ///
    /// ```
    /// use siq::Siq;
    ///
    /// let id = Siq::from_raw(7_451_106_619_238_957_490_390_643_507_207);
    /// assert_eq!(id.format("x").unwrap(), "5e0bd2f0000000000000000007");
    /// assert_eq!(id.format("0c").unwrap(), "05W2YJY000000000000007");
    /// assert!(id.format("z").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormat`] for any other option.
    pub fn format(self, option: &str) -> Result<String> {
        Ok(option.parse::<SiqFormat>()?.encode(self))
    }
}
