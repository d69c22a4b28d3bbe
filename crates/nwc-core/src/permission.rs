//! The permission catalog.
//!
//! A fixed, ordered table of capability keys a connection can be granted.
//! Each entry also lists the wallet-connect methods it covers, so a transport
//! can authorize either by key (`pay_invoice`) or by the concrete method it
//! received (`multi_pay_invoice`).

use serde::Serialize;

/// One capability in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionEntry {
    /// Stable identifier stored in connection grants.
    pub key: &'static str,
    /// Human readable name.
    pub name: &'static str,
    /// Whether the dashboard pre-selects this permission.
    pub default: bool,
    /// Wallet-connect methods this permission covers.
    pub methods: &'static [&'static str],
}

const STANDARD_ENTRIES: &[PermissionEntry] = &[
    PermissionEntry {
        key: "pay_invoice",
        name: "Send payments",
        default: true,
        methods: &["pay_invoice", "multi_pay_invoice", "fetch_invoice"],
    },
    PermissionEntry {
        key: "pay_keysend",
        name: "Send keysend payments",
        default: true,
        methods: &["pay_keysend", "multi_pay_keysend"],
    },
    PermissionEntry {
        key: "make_invoice",
        name: "Create invoices",
        default: true,
        methods: &["make_invoice"],
    },
    PermissionEntry {
        key: "lookup_invoice",
        name: "Lookup status of invoice",
        default: true,
        methods: &["lookup_invoice"],
    },
    PermissionEntry {
        key: "list_transactions",
        name: "Read transaction history",
        default: true,
        methods: &["list_transactions"],
    },
    PermissionEntry {
        key: "get_balance",
        name: "Read wallet balance",
        default: true,
        methods: &["get_balance"],
    },
    PermissionEntry {
        key: "get_info",
        name: "Read account info",
        default: true,
        methods: &["get_info"],
    },
    PermissionEntry {
        key: "make_offer",
        name: "Create offer",
        default: true,
        methods: &["make_offer"],
    },
    PermissionEntry {
        key: "lookup_offer",
        name: "Lookup status of offer",
        default: true,
        methods: &["lookup_offer"],
    },
    PermissionEntry {
        key: "list_offers",
        name: "Read list of offers",
        default: true,
        methods: &["list_offers"],
    },
    PermissionEntry {
        key: "enable_disable_offer",
        name: "Enabling/disabling an offer",
        default: true,
        methods: &["enable_offer", "disable_offer"],
    },
];

/// Read-only, process-wide table of grantable permissions.
///
/// # Example
///
/// ```
/// use nwc_core::PermissionCatalog;
///
/// let catalog = PermissionCatalog::standard();
/// let granted = vec!["pay_invoice".to_string()];
///
/// assert!(catalog.grants(&granted, "pay_invoice"));
/// assert!(catalog.grants(&granted, "multi_pay_invoice"));
/// assert!(!catalog.grants(&granted, "get_balance"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PermissionCatalog {
    entries: &'static [PermissionEntry],
}

impl PermissionCatalog {
    /// The standard wallet-connect catalog.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            entries: STANDARD_ENTRIES,
        }
    }

    /// Build a catalog over a custom static table.
    #[must_use]
    pub const fn from_static(entries: &'static [PermissionEntry]) -> Self {
        Self { entries }
    }

    /// All entries, in catalog order.
    #[must_use]
    pub fn list(&self) -> &'static [PermissionEntry] {
        self.entries
    }

    /// Look up an entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'static PermissionEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Whether `key` is a catalog key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The first key in `keys` that is not in the catalog, if any.
    #[must_use]
    pub fn first_unknown<'a, I>(&self, keys: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter().find(|k| !self.contains(k))
    }

    /// The entry covering a wallet-connect method.
    #[must_use]
    pub fn permission_for_method(&self, method: &str) -> Option<&'static PermissionEntry> {
        self.entries.iter().find(|e| e.methods.contains(&method))
    }

    /// Keys that are granted by default.
    pub fn defaults(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().filter(|e| e.default).map(|e| e.key)
    }

    /// Whether `granted` keys cover the `requested` capability.
    ///
    /// Matches an exact key first, then any method listed for a granted key.
    /// A granted key that has since left the catalog still matches exactly.
    #[must_use]
    pub fn grants<S: AsRef<str>>(&self, granted: &[S], requested: &str) -> bool {
        granted.iter().any(|key| {
            let key = key.as_ref();
            key == requested
                || self
                    .get(key)
                    .is_some_and(|entry| entry.methods.contains(&requested))
        })
    }

    /// Supported methods covered by the granted keys, in `supported` order.
    #[must_use]
    pub fn allowed_methods<'a, S: AsRef<str>>(
        &self,
        granted: &[S],
        supported: &[&'a str],
    ) -> Vec<&'a str> {
        supported
            .iter()
            .copied()
            .filter(|method| self.grants(granted, method))
            .collect()
    }
}

impl Default for PermissionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
