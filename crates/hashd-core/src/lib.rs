#![doc = include_str!("../README.md")]

mod digest;
mod error;
mod sequence;
mod store;

pub use crate::digest::*;
pub use crate::error::*;
pub use crate::sequence::*;
pub use crate::store::*;
