mod base32;
mod error;
mod format;
mod siq;

pub(crate) use base32::*;
pub use error::*;
pub use format::*;
