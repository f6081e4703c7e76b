use crate::Base32Error;

/// A result type defaulting to the crate's [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `siq` can emit.
///
/// Clock regression and counter exhaustion are never errors: generators
/// report them as [`Poll::Pending`](crate::Poll::Pending) or block.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The numeric code or name does not match any [`SiqType`].
    ///
    /// [`SiqType`]: crate::SiqType
    #[error("invalid SIQ type tag: {0}")]
    InvalidTag(String),

    /// The checksum embedded in a DID-style identifier does not match its
    /// payload.
    #[error("checksum mismatch: expected {expected:#010x}, found {found:#014x}")]
    ChecksumMismatch {
        /// CRC32 recomputed over the decoded payload.
        expected: u32,
        /// Checksum field carried by the input.
        found: u64,
    },

    /// A base32 decode failed.
    #[error(transparent)]
    Base32(#[from] Base32Error),

    /// A base64 decode failed.
    #[error("invalid base64: {0}")]
    Base64(String),

    /// A decimal, hex or octal string could not be parsed.
    #[error("invalid integer literal: {0}")]
    InvalidDigits(String),

    /// The value does not fit the 112-bit layout (or, for snowflakes, 64
    /// bits).
    #[error("value exceeds {bits} bits")]
    Overflow {
        /// Width of the target layout.
        bits: u32,
    },

    /// The requested byte length cannot hold the value.
    #[error("buffer of {len} bytes is too small, at least {min} required")]
    BufferTooSmall {
        /// Requested length.
        len: usize,
        /// Minimum length for the layout.
        min: usize,
    },

    /// Unrecognised format option passed to [`Siq::format`].
    ///
    /// [`Siq::format`]: crate::Siq::format
    #[error("unknown format: {0:?}")]
    UnknownFormat(String),

    /// Domain names are hashed as ASCII.
    #[error("domain name is not ASCII: {0:?}")]
    NonAsciiDomain(String),

    /// Chunk widths for [`split_into_chunks`] / [`join_chunks`] must be in
    /// `1..=32`.
    ///
    /// [`split_into_chunks`]: crate::split_into_chunks
    /// [`join_chunks`]: crate::join_chunks
    #[error("invalid chunk width: {0}")]
    InvalidChunkWidth(u32),

    /// A [`SiqCache`](crate::SiqCache) needs a non-zero batch size.
    #[error("batch size must be greater than 0")]
    InvalidBatchSize,

    /// The generator actor has stopped and no longer accepts requests.
    #[cfg(feature = "async-tokio")]
    #[error("generator service is shut down")]
    ServiceShutdown,
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64(err.to_string())
    }
}

impl From<core::num::ParseIntError> for Error {
    fn from(err: core::num::ParseIntError) -> Self {
        Self::InvalidDigits(err.to_string())
    }
}
