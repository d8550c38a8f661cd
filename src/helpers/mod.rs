//! Helper functions shared by the parser and the HTTP layer

mod date;

pub use date::*;
