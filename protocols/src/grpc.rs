//! Plumbing shared by the gRPC clients.
//!
//! The services are small enough that the client stubs are written out by hand
//! instead of generated from `.proto` files at build time.

use std::time::Duration;

use apdash_common::ports::{SourceError, StoreError};
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Status};

/// Issues one unary call on `channel`.
pub(crate) async fn unary<Req, Resp>(
    channel: Channel,
    path: &'static str,
    message: Req,
) -> Result<Resp, Status>
where
    Req: prost::Message + Send + Sync + 'static,
    Resp: prost::Message + Default + Send + Sync + 'static,
{
    let mut grpc = Grpc::new(channel);
    grpc.ready()
        .await
        .map_err(|e| Status::unavailable(format!("service was not ready: {e}")))?;

    let codec: ProstCodec<Req, Resp> = ProstCodec::default();
    let response = grpc
        .unary(Request::new(message), PathAndQuery::from_static(path), codec)
        .await?;
    Ok(response.into_inner())
}

/// Endpoints may be configured without a scheme (`10.0.0.2:2379`).
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

pub(crate) fn endpoint(url: &str, connect_timeout: Duration) -> Result<Endpoint, tonic::transport::Error> {
    Ok(Endpoint::from_shared(normalize_url(url))?.connect_timeout(connect_timeout))
}

fn is_transport_failure(status: &Status) -> bool {
    matches!(
        status.code(),
        Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled
    )
}

pub(crate) fn store_error(status: Status) -> StoreError {
    if is_transport_failure(&status) {
        StoreError::Unreachable(status.message().to_string())
    } else {
        StoreError::Rejected(format!("{}: {}", status.code(), status.message()))
    }
}

pub(crate) fn source_error(status: Status) -> SourceError {
    if is_transport_failure(&status) {
        SourceError::Unreachable(status.message().to_string())
    } else {
        SourceError::Rejected(format!("{}: {}", status.code(), status.message()))
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
