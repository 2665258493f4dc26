//! # Device Resolver
//!
//! Resolves one hardware address against every configured prefix of the
//! identity store and reconciles the replicas into a single answer.
//!
//! For `P` prefixes, `2 × P` lookups run concurrently: one lease key and one
//! info key per prefix. Every lookup reports exactly once. A lookup that fails
//! is logged and contributes nothing; it never fails the resolution.

use std::net::IpAddr;
use std::sync::Arc;

use apdash_common::network::device::IdentityRecord;
use apdash_common::network::mac::HardwareAddress;
use apdash_common::ports::IdentityStore;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, instrument, warn};

pub const LEASED_NAMESPACE: &str = "nics::leased::";
pub const INFO_NAMESPACE: &str = "nics::info::";

/// Leases and identity resolved for one address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Unioned across prefixes, in no particular order.
    pub ips: Vec<IpAddr>,
    /// Zero value when no prefix holds a record.
    pub identity: IdentityRecord,
    /// Replicas that disagreed with the chosen identity record.
    pub conflicts: usize,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("deadline exceeded before anything was resolved for {0}")]
    DeadlineExceeded(HardwareAddress),
}

pub fn lease_key(prefix: &str, address: HardwareAddress) -> String {
    format!("{prefix}{LEASED_NAMESPACE}{address}")
}

pub fn info_key(prefix: &str, address: HardwareAddress) -> String {
    format!("{prefix}{INFO_NAMESPACE}{address}")
}

pub struct DeviceResolver {
    store: Arc<dyn IdentityStore>,
    prefixes: Vec<String>,
}

impl DeviceResolver {
    pub fn new(store: Arc<dyn IdentityStore>, prefixes: Vec<String>) -> Self {
        Self { store, prefixes }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Resolves `address`, giving up on outstanding lookups at `deadline`.
    ///
    /// Lookups still running at the deadline are aborted. Whatever was merged
    /// by then is returned; if nothing was, the deadline is reported instead.
    #[instrument(level = "debug", skip_all, fields(address = %address))]
    pub async fn resolve(
        &self,
        address: HardwareAddress,
        deadline: Instant,
    ) -> Result<Resolution, ResolveError> {
        let mut lookups: JoinSet<Lookup> = JoinSet::new();

        for prefix in &self.prefixes {
            let store = Arc::clone(&self.store);
            let key = lease_key(prefix, address);
            lookups.spawn(async move { lookup_lease(store.as_ref(), key, deadline).await });

            let store = Arc::clone(&self.store);
            let key = info_key(prefix, address);
            lookups.spawn(async move { lookup_identity(store.as_ref(), key, deadline).await });
        }

        let expected: usize = lookups.len();
        let mut merged = Reconciler::new(address);

        for _ in 0..expected {
            match timeout_at(deadline, lookups.join_next()).await {
                Ok(Some(Ok(lookup))) => merged.absorb(lookup),
                Ok(Some(Err(e))) => {
                    error!(%address, error = %e, "identity lookup task failed");
                }
                Ok(None) => break,
                Err(_elapsed) => {
                    merged.timed_out = true;
                    break;
                }
            }
        }

        merged.finish()
    }
}

/// One completed lookup, lease or identity.
#[derive(Debug)]
enum Lookup {
    Lease(Fetched<IpAddr>),
    Identity(Fetched<IdentityRecord>),
}

#[derive(Debug)]
enum Fetched<T> {
    Value(T),
    Nothing,
    TimedOut,
}

impl<T> Fetched<T> {
    fn map_value<U>(self, f: impl FnOnce(T) -> Option<U>) -> Fetched<U> {
        match self {
            Fetched::Value(v) => f(v).map_or(Fetched::Nothing, Fetched::Value),
            Fetched::Nothing => Fetched::Nothing,
            Fetched::TimedOut => Fetched::TimedOut,
        }
    }
}

async fn fetch_single(store: &dyn IdentityStore, key: &str, deadline: Instant) -> Fetched<Vec<u8>> {
    match timeout_at(deadline, store.get(key)).await {
        Err(_elapsed) => {
            warn!(key, "lookup abandoned at deadline");
            Fetched::TimedOut
        }
        Ok(Err(e)) => {
            error!(key, error = %e, "unable to get key from identity store");
            Fetched::Nothing
        }
        Ok(Ok(mut values)) => {
            if values.len() > 1 {
                error!(key, count = values.len(), "invalid response for single key request");
                return Fetched::Nothing;
            }
            values.pop().map_or(Fetched::Nothing, Fetched::Value)
        }
    }
}

async fn lookup_lease(store: &dyn IdentityStore, key: String, deadline: Instant) -> Lookup {
    let fetched = fetch_single(store, &key, deadline).await;
    Lookup::Lease(fetched.map_value(|raw| parse_lease(&key, &raw)))
}

async fn lookup_identity(store: &dyn IdentityStore, key: String, deadline: Instant) -> Lookup {
    let fetched = fetch_single(store, &key, deadline).await;
    Lookup::Identity(fetched.map_value(|raw| match IdentityRecord::decode_record(&raw) {
        Ok(record) => Some(record),
        Err(e) => {
            error!(key = %key, error = %e, "unable to decode client info");
            None
        }
    }))
}

fn parse_lease(key: &str, raw: &[u8]) -> Option<IpAddr> {
    let parsed = std::str::from_utf8(raw)
        .ok()
        .and_then(|text| text.parse::<IpAddr>().ok());
    if parsed.is_none() {
        warn!(key, value = %String::from_utf8_lossy(raw), "unable to parse leased ip");
    }
    parsed
}

/// Folds lookups into a [`Resolution`] in completion order.
///
/// Leases are unioned. The first identity record wins; later ones are only
/// compared against it.
struct Reconciler {
    address: HardwareAddress,
    ips: Vec<IpAddr>,
    identity: Option<IdentityRecord>,
    conflicts: usize,
    timed_out: bool,
}

impl Reconciler {
    fn new(address: HardwareAddress) -> Self {
        Self {
            address,
            ips: Vec::new(),
            identity: None,
            conflicts: 0,
            timed_out: false,
        }
    }

    fn absorb(&mut self, lookup: Lookup) {
        match lookup {
            Lookup::Lease(Fetched::Value(ip)) => self.ips.push(ip),
            Lookup::Identity(Fetched::Value(candidate)) => self.absorb_identity(candidate),
            Lookup::Lease(Fetched::TimedOut) | Lookup::Identity(Fetched::TimedOut) => {
                self.timed_out = true;
            }
            Lookup::Lease(Fetched::Nothing) | Lookup::Identity(Fetched::Nothing) => {}
        }
    }

    fn absorb_identity(&mut self, candidate: IdentityRecord) {
        if self.identity.is_none() {
            self.identity = Some(candidate);
            return;
        }
        if self.identity.as_ref() != Some(&candidate) {
            self.conflicts += 1;
            debug!(
                address = %self.address,
                chosen = ?self.identity,
                candidate = ?candidate,
                "identity replicas disagree"
            );
        }
    }

    fn is_empty(&self) -> bool {
        self.ips.is_empty() && self.identity.is_none()
    }

    fn finish(self) -> Result<Resolution, ResolveError> {
        if self.timed_out {
            if self.is_empty() {
                return Err(ResolveError::DeadlineExceeded(self.address));
            }
            warn!(address = %self.address, "deadline reached, returning partial resolution");
        }
        Ok(Resolution {
            ips: self.ips,
            identity: self.identity.unwrap_or_default(),
            conflicts: self.conflicts,
        })
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
