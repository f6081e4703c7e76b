//! # SIQ identifiers
//!
//! A SIQ is a 112-bit, time-ordered identifier laid out as:
//!
//! ```text
//!  tttttttt tttttttt tttttttt tttttttt tttttttt uuuuuuuu uuuuuuuu
//!  ssssssss dddddddd dddddddd dddddddd dddddddd nnnnnnnn nnqqqqqq
//! ```
//!
//! - `t`: seconds since the Unix epoch (40 bits)
//! - `u`: fraction of a second in 1/65536 ticks (16 bits)
//! - `s`: shard id (8 bits)
//! - `d`: domain hash (32 bits)
//! - `n`/`q`: rolling counter and type qualifier (16 bits, split per
//!   [`SiqType`])
//!
//! ```
//! use siq::{BasicSiqGenerator, DomainHash, SiqType, WallClock};
//!
//! let domain = DomainHash::from_domain("example.com").unwrap();
//! let generator = BasicSiqGenerator::new(domain, 1, WallClock);
//! let id = generator.generate_one(SiqType::User);
//! assert_eq!(id.shard_id(), 1);
//! assert_eq!(id.domain_hash(), 2_261_653_831);
//! ```

mod bits;
mod config;
mod encoding;
mod error;
mod generator;
mod id;
mod migrate;
#[cfg(feature = "serde")]
mod serde;
#[cfg(feature = "async-tokio")]
mod service;
mod snowflake;
mod time;

pub use crate::bits::*;
pub use crate::config::*;
pub use crate::encoding::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::migrate::*;
#[cfg(feature = "serde")]
pub use crate::serde::*;
#[cfg(feature = "async-tokio")]
pub use crate::service::*;
pub use crate::snowflake::*;
pub use crate::time::*;
