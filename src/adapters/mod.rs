//! Adapter implementations of the port traits.
//!
//! `live` adapters talk to the real host; `fake` adapters are in-memory
//! doubles used by unit tests.

pub mod live;

#[cfg(test)]
pub mod fake;
