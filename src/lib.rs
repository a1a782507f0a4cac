#![doc = include_str!("../README.md")]

mod coarse;
mod raw;
mod refinable;
mod sequential;
mod set;
mod striped;

pub use coarse::CoarseSet;
pub use refinable::RefinableSet;
pub use sequential::SequentialSet;
pub use set::{Builder, FromBuilder, ResizePolicy, Set, DEFAULT_CAPACITY};
pub use striped::StripedSet;
