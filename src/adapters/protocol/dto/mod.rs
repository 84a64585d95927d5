pub mod kraft;

pub use kraft::*;
