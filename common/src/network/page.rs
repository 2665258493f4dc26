use std::collections::BTreeMap;

use serde::Serialize;

use super::device::ResolvedDevice;

/// All devices associated with one (possibly renamed) attachment point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationGroup {
    pub name: String,
    pub members: Vec<ResolvedDevice>,
}

/// Resolved devices grouped by attachment point.
///
/// Groups are ordered by name and members by hardware address. Neither order
/// depends on the order devices were resolved in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultPage {
    pub groups: Vec<PresentationGroup>,
}

impl ResultPage {
    /// Groups devices by their `attachment_point`.
    pub fn from_devices(devices: impl IntoIterator<Item = ResolvedDevice>) -> Self {
        let mut by_name: BTreeMap<String, Vec<ResolvedDevice>> = BTreeMap::new();
        for device in devices {
            by_name
                .entry(device.attachment_point.clone())
                .or_default()
                .push(device);
        }

        let groups = by_name
            .into_iter()
            .map(|(name, mut members)| {
                members.sort_by_key(|member| member.address);
                PresentationGroup { name, members }
            })
            .collect();

        Self { groups }
    }

    pub fn total_devices(&self) -> usize {
        self.groups.iter().map(|group| group.members.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, name: &str) -> Option<&PresentationGroup> {
        self.groups.iter().find(|group| group.name == name)
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
