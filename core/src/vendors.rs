use std::sync::OnceLock;

use apdash_common::network::mac::HardwareAddress;
use apdash_common::ports::VendorRepository;
use mac_oui::Oui;
use tracing::warn;

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

/// Retrieves or initializes the **Organizationally unique identifier** database.
///
/// A database that fails to load is reported once and disables the lookup.
fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                warn!(error = ?e, "failed to load OUI database, manufacturer lookup disabled");
                None
            }
        })
        .as_ref()
}

/// Manufacturer lookup backed by the bundled OUI database.
pub struct MacOuiRepo;

impl VendorRepository for MacOuiRepo {
    fn get_vendor(&self, address: HardwareAddress) -> Option<String> {
        let oui_db: &Oui = get_oui_db()?;
        match oui_db.lookup_by_mac(&address.to_string()) {
            Ok(Some(entry)) => Some(entry.company_name.clone()),
            Ok(None) => None,
            Err(_) => None,
        }
    }
}
