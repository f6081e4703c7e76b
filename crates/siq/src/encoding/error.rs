/// Failure modes of the base32 decoders.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Base32Error {
    /// The input does not have a length the target layout accepts.
    #[error("invalid base32 length: {len}")]
    DecodeInvalidLen {
        /// Length of the rejected input.
        len: usize,
    },
    /// The input contains a byte outside the alphabet.
    #[error("invalid base32 byte {byte:#04x} at index {index}")]
    DecodeInvalidAscii {
        /// The offending byte.
        byte: u8,
        /// Its position in the input.
        index: usize,
    },
}
