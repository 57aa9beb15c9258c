//! Runtime toggles read by the inventory step.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

/// File whose content switches the inventory outage simulation on.
pub const INVENTORY_SERVICE_AVAILABLE_FILE: &str = "inventory-service-available";

/// File whose content switches item name normalization on.
pub const ITEM_NAMES_BUG_FIX_FILE: &str = "item-names-bug-fix";

/// Provider of the toggles checked at the start of every inventory attempt.
#[async_trait]
pub trait FeatureFlags: Send + Sync {
    /// Returns false while the inventory outage is simulated. Defaults to true.
    async fn inventory_service_available(&self) -> bool;

    /// Returns true if malformed item names are repaired before lookup.
    /// Defaults to false.
    async fn item_names_fix_enabled(&self) -> bool;
}

/// In-memory flags that can be flipped while sagas are running.
#[derive(Debug)]
pub struct StaticFlags {
    inventory_available: AtomicBool,
    item_names_fix: AtomicBool,
}

impl Default for StaticFlags {
    fn default() -> Self {
        Self {
            inventory_available: AtomicBool::new(true),
            item_names_fix: AtomicBool::new(false),
        }
    }
}

impl StaticFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_inventory_available(&self, available: bool) {
        self.inventory_available.store(available, Ordering::SeqCst);
    }

    pub fn set_item_names_fix(&self, enabled: bool) {
        self.item_names_fix.store(enabled, Ordering::SeqCst);
    }
}

#[async_trait]
impl FeatureFlags for StaticFlags {
    async fn inventory_service_available(&self) -> bool {
        self.inventory_available.load(Ordering::SeqCst)
    }

    async fn item_names_fix_enabled(&self) -> bool {
        self.item_names_fix.load(Ordering::SeqCst)
    }
}

/// Flags backed by marker files in a directory.
///
/// - `inventory-service-available`: the service is down only if the file
///   holds `0`, `false` or `no`.
/// - `item-names-bug-fix`: normalization is on only if the file holds `1`,
///   `true` or `yes`.
///
/// Content is trimmed and compared case-insensitively. A missing or
/// unreadable file means the default.
#[derive(Debug, Clone)]
pub struct FileFlags {
    dir: PathBuf,
}

impl FileFlags {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_flag(&self, file: &str) -> Option<String> {
        let path = self.dir.join(file);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Some(content.trim().to_lowercase()),
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "flag file not readable");
                None
            }
        }
    }
}

#[async_trait]
impl FeatureFlags for FileFlags {
    async fn inventory_service_available(&self) -> bool {
        !matches!(
            self.read_flag(INVENTORY_SERVICE_AVAILABLE_FILE).await.as_deref(),
            Some("0" | "false" | "no")
        )
    }

    async fn item_names_fix_enabled(&self) -> bool {
        matches!(
            self.read_flag(ITEM_NAMES_BUG_FIX_FILE).await.as_deref(),
            Some("1" | "true" | "yes")
        )
    }
}
