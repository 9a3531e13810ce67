//! Ephemeral Device Filter
//!
//! Card readers, loop devices and optical drives belong to the scanning
//! setup rather than the asset. Disk nodes whose logical name starts with one
//! of these prefixes never reach the drive list.

use crate::config::ExtractorConfig;

/// Built-in prefixes: MMC/SD card readers, loopback devices, SCSI CD-ROMs.
pub const BUILTIN_EPHEMERAL_PREFIXES: [&str; 3] = ["mmc", "loop", "sr"];

/// Prefix denylist matched against logical names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralFilter {
    prefixes: Vec<String>,
}

impl Default for EphemeralFilter {
    fn default() -> Self {
        Self::with_extra(&[])
    }
}

impl EphemeralFilter {
    /// Built-in prefixes plus `extra`.
    pub fn with_extra(extra: &[String]) -> Self {
        let mut prefixes: Vec<String> = BUILTIN_EPHEMERAL_PREFIXES
            .iter()
            .map(|p| p.to_string())
            .collect();
        for prefix in extra {
            let prefix = prefix.trim().to_ascii_lowercase();
            if !prefix.is_empty() && !prefixes.contains(&prefix) {
                prefixes.push(prefix);
            }
        }
        Self { prefixes }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::with_extra(&config.extra_ephemeral_prefixes)
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// True when the device name (with or without `/dev/`) is ephemeral.
    pub fn is_ephemeral(&self, logical_name: &str) -> bool {
        let trimmed = logical_name.trim();
        let name = trimmed.strip_prefix("/dev/").unwrap_or(trimmed);
        let name = name.to_ascii_lowercase();
        self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// True when any of a node's logical names is ephemeral.
    pub fn any_ephemeral<'a>(&self, logical_names: impl IntoIterator<Item = &'a String>) -> bool {
        logical_names.into_iter().any(|n| self.is_ephemeral(n))
    }
}
