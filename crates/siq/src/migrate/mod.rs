mod snowflake;
mod ulid;

pub use snowflake::*;
pub use ulid::*;

use crate::{Siq, SiqType};

/// Maps identifiers of a legacy scheme onto SIQs.
///
/// Conversions are pure: the same input, type and migrator settings always
/// produce the same SIQ. They do not check whether the result collides with
/// an identifier that already exists.
pub trait SiqMigrator {
    /// Converts `orig` into a SIQ of type `kind`.
    fn to_siq(&self, orig: u128, kind: SiqType) -> Siq;
}

impl<M: SiqMigrator + ?Sized> SiqMigrator for &M {
    fn to_siq(&self, orig: u128, kind: SiqType) -> Siq {
        (**self).to_siq(orig, kind)
    }
}
