//! # Presence Aggregator
//!
//! Implements the "render" use case: who is associated where, and who are they.
//!
//! One render lists the associated devices once, resolves every device
//! concurrently against the identity store, and groups the results by
//! attachment point. A device whose resolution fails is still listed, just
//! without leases or identity.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use apdash_common::network::device::{AssociatedDevice, ResolvedDevice};
use apdash_common::network::mac::AddressParseError;
use apdash_common::network::page::ResultPage;
use apdash_common::ports::{AssociationSource, SourceError, VendorRepository};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, Span, debug, error, field, info_span, warn};

use crate::resolver::{DeviceResolver, Resolution, ResolveError};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Association(#[from] SourceError),
    #[error("deadline exceeded while listing associated devices")]
    DeadlineExceeded,
    #[error("association source returned a malformed address: {0}")]
    MalformedAddress(#[from] AddressParseError),
}

/// Application service for the presence page.
///
/// Orchestrates a render by:
/// 1. listing associated devices through the [`AssociationSource`].
/// 2. resolving each of them with the [`DeviceResolver`].
/// 3. enriching the results (friendly names, manufacturers) and grouping them.
pub struct PresenceAggregator {
    source: Arc<dyn AssociationSource>,
    resolver: Arc<DeviceResolver>,
    rename: HashMap<String, String>,
    vendor_repo: Option<Arc<dyn VendorRepository>>,
}

impl PresenceAggregator {
    pub fn new(source: Arc<dyn AssociationSource>, resolver: Arc<DeviceResolver>) -> Self {
        Self {
            source,
            resolver,
            rename: HashMap::new(),
            vendor_repo: None,
        }
    }

    /// Friendly names for attachment points. Unmapped names pass through.
    pub fn with_rename(mut self, rename: HashMap<String, String>) -> Self {
        self.rename = rename;
        self
    }

    pub fn with_vendor_repository(mut self, vendor_repo: Arc<dyn VendorRepository>) -> Self {
        self.vendor_repo = Some(vendor_repo);
        self
    }

    /// Renders with a deadline `budget` from now.
    pub async fn render_within(&self, budget: Duration) -> Result<ResultPage, RenderError> {
        self.render(Instant::now() + budget).await
    }

    /// Executes one render, bounded by `deadline` at every level.
    ///
    /// Fails only when the associated devices cannot be listed or one of their
    /// addresses does not parse.
    pub async fn render(&self, deadline: Instant) -> Result<ResultPage, RenderError> {
        let span = info_span!("render", devices = field::Empty);

        async move {
            let devices: Vec<AssociatedDevice> = self.list_devices(deadline).await?;
            Span::current().record("devices", devices.len());

            let resolutions = self.resolve_all(&devices, deadline).await;

            let resolved = devices
                .into_iter()
                .zip(resolutions)
                .map(|(device, resolution)| self.present(device, resolution));

            Ok::<_, RenderError>(ResultPage::from_devices(resolved))
        }
        .instrument(span)
        .await
    }

    async fn list_devices(&self, deadline: Instant) -> Result<Vec<AssociatedDevice>, RenderError> {
        let raw = timeout_at(deadline, self.source.list_associated())
            .await
            .map_err(|_| RenderError::DeadlineExceeded)??;

        let devices = raw
            .into_iter()
            .map(AssociatedDevice::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(devices)
    }

    /// One resolution per device, in `devices` order.
    async fn resolve_all(
        &self,
        devices: &[AssociatedDevice],
        deadline: Instant,
    ) -> Vec<Option<Resolution>> {
        let mut pending: JoinSet<(usize, Result<Resolution, ResolveError>)> = JoinSet::new();
        for (idx, device) in devices.iter().enumerate() {
            let resolver = Arc::clone(&self.resolver);
            let address = device.address;
            pending.spawn(async move { (idx, resolver.resolve(address, deadline).await) });
        }

        let mut resolutions: Vec<Option<Resolution>> = Vec::with_capacity(devices.len());
        resolutions.resize_with(devices.len(), || None);

        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok((idx, Ok(resolution))) => resolutions[idx] = Some(resolution),
                Ok((idx, Err(e))) => {
                    warn!(address = %devices[idx].address, error = %e, "error looking up device");
                }
                Err(e) => error!(error = %e, "device resolver task failed"),
            }
        }
        resolutions
    }

    fn present(&self, mut device: AssociatedDevice, resolution: Option<Resolution>) -> ResolvedDevice {
        if let Some(friendly) = self.rename.get(&device.attachment_point) {
            device.attachment_point = friendly.clone();
        }
        let address = device.address;

        let resolved = match resolution {
            Some(resolution) => ResolvedDevice::new(device, resolution.ips, resolution.identity),
            None => {
                debug!(%address, "listing device without identity");
                ResolvedDevice::unresolved(device)
            }
        };

        let manufacturer = self
            .vendor_repo
            .as_ref()
            .and_then(|repo| repo.get_vendor(address));
        resolved.with_manufacturer(manufacturer)
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
