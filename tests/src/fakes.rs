//! In-memory implementations of the outbound ports.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use apdash_common::network::device::{IdentityRecord, RawAssociation};
use apdash_common::ports::{AssociationSource, IdentityStore, SourceError, StoreError};
use async_trait::async_trait;

/// Identity store keyed by exact key. Selected keys can be made to hang.
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, Vec<Vec<u8>>>,
    hanging: HashSet<String>,
    reads: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lease(mut self, prefix: &str, address: &str, ip: &str) -> Self {
        let key = format!("{prefix}nics::leased::{address}");
        self.values.entry(key).or_default().push(ip.as_bytes().to_vec());
        self
    }

    pub fn identity(mut self, prefix: &str, address: &str, record: IdentityRecord) -> Self {
        let key = format!("{prefix}nics::info::{address}");
        self.values.entry(key).or_default().push(record.encode_record());
        self
    }

    /// Every read under `prefix` never completes.
    pub fn hang_prefix(mut self, prefix: &str) -> Self {
        self.hanging.insert(prefix.to_string());
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.lock().map(|reads| *reads).unwrap_or(0)
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        if let Ok(mut reads) = self.reads.lock() {
            *reads += 1;
        }
        if self.hanging.iter().any(|prefix| key.starts_with(prefix.as_str())) {
            std::future::pending::<()>().await;
        }
        Ok(self.values.get(key).cloned().unwrap_or_default())
    }
}

/// Association source with a fixed listing.
pub struct StaticSource {
    listing: Result<Vec<RawAssociation>, SourceError>,
}

impl StaticSource {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        let listing = pairs
            .iter()
            .map(|(address, attachment_point)| RawAssociation::new(*address, *attachment_point))
            .collect();
        Self { listing: Ok(listing) }
    }

    pub fn failing(error: SourceError) -> Self {
        Self { listing: Err(error) }
    }
}

#[async_trait]
impl AssociationSource for StaticSource {
    async fn list_associated(&self) -> Result<Vec<RawAssociation>, SourceError> {
        self.listing.clone()
    }
}
