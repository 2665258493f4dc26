//! # Outbound Ports
//!
//! Contracts for the backends the resolution pipeline is driven against.
//!
//! ## Rules
//! 1. Everything here is a trait or the error a trait reports.
//! 2. Implementations live in `apdash-protocols` (network backends) and
//!    `apdash-core` (local lookups).
//! 3. Implementations are shared across concurrent renders and must be safe
//!    for concurrent use.

use async_trait::async_trait;
use thiserror::Error;

use crate::network::device::RawAssociation;
use crate::network::mac::HardwareAddress;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transport failure or the store could not be reached in time.
    #[error("identity store unreachable: {0}")]
    Unreachable(String),
    /// The store answered but refused the request.
    #[error("identity store rejected request: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("association source unreachable: {0}")]
    Unreachable(String),
    #[error("error listing associated clients: {0}")]
    Rejected(String),
}

/// A key-value store queried by exact key.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Every value stored under `key`. A well-behaved store returns zero or one.
    async fn get(&self, key: &str) -> Result<Vec<Vec<u8>>, StoreError>;
}

/// The live controller that knows which devices are associated where.
#[async_trait]
pub trait AssociationSource: Send + Sync {
    async fn list_associated(&self) -> Result<Vec<RawAssociation>, SourceError>;
}

/// Manufacturer lookup by hardware address.
pub trait VendorRepository: Send + Sync {
    fn get_vendor(&self, address: HardwareAddress) -> Option<String>;
}
