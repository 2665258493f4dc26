//! # etcd v3 Identity Store
//!
//! Exact-key reads against the etcd KV service, balanced over the configured
//! endpoints. The endpoint list is periodically refreshed from the cluster's
//! member list so that members added after startup are used too.

use std::collections::HashSet;
use std::time::Duration;

use apdash_common::config::StoreConfig;
use apdash_common::ports::{IdentityStore, StoreError};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tonic::transport::{Channel, Endpoint};
use tower::discover::Change;
use tracing::{debug, info, warn};

use crate::grpc::{self, endpoint, normalize_url};

const RANGE_PATH: &str = "/etcdserverpb.KV/Range";
const MEMBER_LIST_PATH: &str = "/etcdserverpb.Cluster/MemberList";
const CHANGE_CAPACITY: usize = 16;

#[derive(Clone, PartialEq, prost::Message)]
pub struct RangeRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
    /// Empty for a single key.
    #[prost(bytes = "vec", tag = "2")]
    pub range_end: Vec<u8>,
    #[prost(int64, tag = "3")]
    pub limit: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct KeyValue {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
    #[prost(int64, tag = "2")]
    pub create_revision: i64,
    #[prost(int64, tag = "3")]
    pub mod_revision: i64,
    #[prost(int64, tag = "4")]
    pub version: i64,
    #[prost(bytes = "vec", tag = "5")]
    pub value: Vec<u8>,
    #[prost(int64, tag = "6")]
    pub lease: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RangeResponse {
    #[prost(message, repeated, tag = "2")]
    pub kvs: Vec<KeyValue>,
    #[prost(bool, tag = "3")]
    pub more: bool,
    #[prost(int64, tag = "4")]
    pub count: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MemberListRequest {
    #[prost(bool, tag = "1")]
    pub linearizable: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Member {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, repeated, tag = "3")]
    pub peer_urls: Vec<String>,
    #[prost(string, repeated, tag = "4")]
    pub client_urls: Vec<String>,
    #[prost(bool, tag = "5")]
    pub is_learner: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MemberListResponse {
    #[prost(message, repeated, tag = "2")]
    pub members: Vec<Member>,
}

impl RangeRequest {
    pub fn exact(key: &str) -> Self {
        Self {
            key: key.as_bytes().to_vec(),
            range_end: Vec::new(),
            limit: 0,
        }
    }
}

impl RangeResponse {
    pub fn into_values(self) -> Vec<Vec<u8>> {
        self.kvs.into_iter().map(|kv| kv.value).collect()
    }
}

#[derive(Debug, Error)]
pub enum EtcdError {
    #[error("at least one etcd endpoint must be provided")]
    NoEndpoints,
    #[error("invalid etcd endpoint: {0}")]
    Endpoint(#[from] tonic::transport::Error),
    #[error("etcd endpoint balancer closed")]
    BalancerClosed,
}

type EndpointChanges = Sender<Change<String, Endpoint>>;

/// Identity store client over etcd v3.
pub struct EtcdStore {
    channel: Channel,
    resync: Option<JoinHandle<()>>,
    // Keeps the balancer's discovery stream open when resync is disabled.
    _changes: Option<EndpointChanges>,
}

impl EtcdStore {
    pub async fn connect(cfg: &StoreConfig) -> Result<Self, EtcdError> {
        let urls: HashSet<String> = cfg
            .endpoints
            .iter()
            .filter(|url| !url.trim().is_empty())
            .map(|url| normalize_url(url))
            .collect();
        if urls.is_empty() {
            return Err(EtcdError::NoEndpoints);
        }

        let (channel, changes) = Channel::balance_channel::<String>(CHANGE_CAPACITY);
        for url in &urls {
            let ep = endpoint(url, cfg.dial_timeout())?;
            changes
                .send(Change::Insert(url.clone(), ep))
                .await
                .map_err(|_| EtcdError::BalancerClosed)?;
        }
        info!(endpoints = urls.len(), "connected to etcd");

        let (resync, changes) = match cfg.auto_sync_interval() {
            Some(period) => {
                let task = resync_endpoints(channel.clone(), changes, urls, period, cfg.dial_timeout());
                (Some(tokio::spawn(task)), None)
            }
            None => (None, Some(changes)),
        };

        Ok(Self {
            channel,
            resync,
            _changes: changes,
        })
    }

    pub async fn range(&self, request: RangeRequest) -> Result<RangeResponse, tonic::Status> {
        grpc::unary(self.channel.clone(), RANGE_PATH, request).await
    }

    pub async fn member_list(&self) -> Result<MemberListResponse, tonic::Status> {
        member_list(self.channel.clone()).await
    }
}

impl Drop for EtcdStore {
    fn drop(&mut self) {
        if let Some(task) = self.resync.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl IdentityStore for EtcdStore {
    async fn get(&self, key: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        let response = self
            .range(RangeRequest::exact(key))
            .await
            .map_err(grpc::store_error)?;
        Ok(response.into_values())
    }
}

async fn member_list(channel: Channel) -> Result<MemberListResponse, tonic::Status> {
    let request = MemberListRequest {
        linearizable: false,
    };
    grpc::unary(channel, MEMBER_LIST_PATH, request).await
}

fn client_urls(members: &[Member]) -> HashSet<String> {
    members
        .iter()
        .filter(|member| !member.is_learner)
        .flat_map(|member| member.client_urls.iter())
        .map(|url| normalize_url(url))
        .collect()
}

/// Endpoints to add and to remove, each sorted.
fn diff_endpoints(known: &HashSet<String>, current: &HashSet<String>) -> (Vec<String>, Vec<String>) {
    let mut added: Vec<String> = current.difference(known).cloned().collect();
    let mut removed: Vec<String> = known.difference(current).cloned().collect();
    added.sort();
    removed.sort();
    (added, removed)
}

async fn resync_endpoints(
    channel: Channel,
    changes: EndpointChanges,
    mut known: HashSet<String>,
    period: Duration,
    dial_timeout: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let current = match member_list(channel.clone()).await {
            Ok(response) => client_urls(&response.members),
            Err(e) => {
                warn!(error = %e, "unable to sync etcd endpoints");
                continue;
            }
        };
        if current.is_empty() {
            warn!("etcd member list has no client urls, keeping current endpoints");
            continue;
        }

        let (added, removed) = diff_endpoints(&known, &current);
        for url in added {
            match endpoint(&url, dial_timeout) {
                Ok(ep) => {
                    if changes.send(Change::Insert(url.clone(), ep)).await.is_err() {
                        return;
                    }
                    known.insert(url);
                }
                Err(e) => warn!(url = %url, error = %e, "ignoring invalid etcd member url"),
            }
        }
        for url in removed {
            if changes.send(Change::Remove(url.clone())).await.is_err() {
                return;
            }
            known.remove(&url);
        }
        debug!(endpoints = known.len(), "synced etcd endpoints");
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
