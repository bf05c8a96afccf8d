pub mod common;
#[cfg(test)]
pub mod fake;
pub mod traits;
pub mod web;

pub use traits::{LoadPolicy, PageConnector, PageDriver, Selector};
