use crate::Base32Error;

const NO_VALUE: u8 = 255;
const BITS_PER_CHAR: u32 = 5;

/// A 32-symbol alphabet with its case-insensitive decoding table.
pub(crate) struct Alphabet {
    symbols: &'static [u8; 32],
    lookup: [u8; 256],
}

impl Alphabet {
    const fn new(symbols: &'static [u8; 32], aliases: &[(u8, u8)]) -> Self {
        let mut lookup = [NO_VALUE; 256];
        let mut i = 0;
        while i < 32 {
            let c = symbols[i];
            lookup[c as usize] = i as u8;
            if c.is_ascii_alphabetic() {
                lookup[(c ^ 0x20) as usize] = i as u8;
            }
            i += 1;
        }
        let mut j = 0;
        while j < aliases.len() {
            let (alias, canonical) = aliases[j];
            let value = lookup[canonical as usize];
            lookup[alias as usize] = value;
            lookup[(alias ^ 0x20) as usize] = value;
            j += 1;
        }
        Self { symbols, lookup }
    }

    /// Encodes `input` MSB first, zero-filling the last symbol on the right.
    /// No padding characters are emitted.
    pub(crate) fn encode(&self, input: &[u8]) -> String {
        let mut out = String::with_capacity((input.len() * 8).div_ceil(5));
        let mut acc = 0_u16;
        let mut bits = 0;
        for &b in input {
            acc = (acc << 8) | u16::from(b);
            bits += 8;
            while bits >= BITS_PER_CHAR {
                bits -= BITS_PER_CHAR;
                out.push(self.symbols[usize::from((acc >> bits) & 0x1f)] as char);
            }
        }
        if bits > 0 {
            out.push(self.symbols[usize::from((acc << (BITS_PER_CHAR - bits)) & 0x1f)] as char);
        }
        out
    }

    /// Decodes `encoded` into whole bytes. Trailing bits that do not fill a
    /// byte are dropped.
    pub(crate) fn decode(&self, encoded: &str) -> Result<Vec<u8>, Base32Error> {
        let mut out = Vec::with_capacity(encoded.len() * 5 / 8);
        let mut acc = 0_u16;
        let mut bits = 0;
        for (index, byte) in encoded.bytes().enumerate() {
            let value = self.lookup[usize::from(byte)];
            if value == NO_VALUE {
                return Err(Base32Error::DecodeInvalidAscii { byte, index });
            }
            acc = (acc << BITS_PER_CHAR) | u16::from(value);
            bits += BITS_PER_CHAR;
            if bits >= 8 {
                bits -= 8;
                out.push((acc >> bits) as u8);
            }
        }
        Ok(out)
    }
}

/// Crockford base32, upper case on output. Decoding accepts lower case and the
/// `O`, `I` and `L` aliases.
pub(crate) static CROCKFORD: Alphabet = Alphabet::new(
    b"0123456789ABCDEFGHJKMNPQRSTVWXYZ",
    &[(b'O', b'0'), (b'I', b'1'), (b'L', b'1')],
);

/// RFC 4648 base32, lower case on output.
pub(crate) static RFC4648_LOWER: Alphabet =
    Alphabet::new(b"abcdefghijklmnopqrstuvwxyz234567", &[]);
