mod basic;
mod cache;
mod status;

pub use basic::*;
pub use cache::*;
pub use status::*;
