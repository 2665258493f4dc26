//! # hostapd Control Client
//!
//! Lists the stations currently associated with the access point daemon.
//! Each station is reported with the socket (radio interface) it is attached
//! through, which becomes the device's attachment point.

use std::time::Duration;

use apdash_common::network::device::RawAssociation;
use apdash_common::ports::{AssociationSource, SourceError};
use async_trait::async_trait;
use tonic::transport::Channel;
use tracing::debug;

use crate::grpc::{self, endpoint};

const LIST_CLIENTS_PATH: &str = "/hostapd.HostapdControl/ListClients";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListClientsRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Client {
    #[prost(string, tag = "1")]
    pub addr: String,
    #[prost(string, tag = "2")]
    pub socket_name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListClientsResponse {
    #[prost(message, repeated, tag = "1")]
    pub client: Vec<Client>,
}

impl From<Client> for RawAssociation {
    fn from(client: Client) -> Self {
        RawAssociation::new(client.addr, client.socket_name)
    }
}

pub struct HostapdControl {
    channel: Channel,
}

impl HostapdControl {
    /// The connection is established on first use, and re-established by the
    /// channel after failures.
    pub fn connect(address: &str) -> Result<Self, tonic::transport::Error> {
        let channel = endpoint(address, CONNECT_TIMEOUT)?.connect_lazy();
        Ok(Self { channel })
    }

    pub async fn list_clients(&self) -> Result<ListClientsResponse, tonic::Status> {
        grpc::unary(self.channel.clone(), LIST_CLIENTS_PATH, ListClientsRequest {}).await
    }
}

#[async_trait]
impl AssociationSource for HostapdControl {
    async fn list_associated(&self) -> Result<Vec<RawAssociation>, SourceError> {
        let response = self.list_clients().await.map_err(grpc::source_error)?;
        debug!(clients = response.client.len(), "listed hostapd clients");
        Ok(response.client.into_iter().map(RawAssociation::from).collect())
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
