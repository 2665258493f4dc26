//! # Network Models
//!
//! * [`mac::HardwareAddress`]: the join key between association and identity data.
//! * [`device`]: per-device records, from the raw controller listing to the
//!   resolved, presentable device.
//! * [`page`]: grouping and ordering of resolved devices.

pub mod device;
pub mod mac;
pub mod page;
