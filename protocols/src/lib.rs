//! # apdash Protocols
//!
//! gRPC clients for the backends a render talks to:
//! - [`etcd::EtcdStore`] implements the identity store over etcd v3.
//! - [`hostapd::HostapdControl`] implements the association source.

pub mod etcd;
pub mod grpc;
pub mod hostapd;
