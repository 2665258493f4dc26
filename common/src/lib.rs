//! # apdash common
//!
//! Shared vocabulary for the presence dashboard.
//!
//! * **[`network`]**: hardware addresses, associated/resolved devices and the
//!   grouped result page.
//! * **[`ports`]**: the traits backends implement (identity store, association
//!   source, vendor lookup) and the errors they report.
//! * **[`config`]**: process configuration, built once at startup and passed down.

pub mod config;
pub mod network;
pub mod ports;
