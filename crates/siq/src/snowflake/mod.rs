mod generator;
mod id;

pub use generator::*;
pub use id::*;
