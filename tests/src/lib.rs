//! In-memory backends and end-to-end render tests.

pub mod fakes;
mod presence;
