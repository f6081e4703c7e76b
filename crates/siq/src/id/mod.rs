mod domain;
mod kind;
mod siq;

pub use domain::*;
pub use kind::*;
pub use siq::*;
