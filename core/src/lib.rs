//! # apdash core
//!
//! The resolution engine behind the presence page.
//!
//! * **[`resolver`]**: resolves one hardware address across every store prefix.
//! * **[`presence`]**: fans out over all associated devices and builds the page.
//! * **[`vendors`]**: manufacturer lookup from the OUI database.
//!
//! Both services depend only on the traits in [`apdash_common::ports`]; the
//! concrete backends are wired in by the binary.

pub mod presence;
pub mod resolver;
pub mod vendors;
