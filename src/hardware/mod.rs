//! Hardware Extraction Module
//!
//! Turns the hardware-lister (`lshw`) tree of a scan bundle into a flat
//! [`HardwareSummary`]: device serial, CPU, memory total and slots, drives,
//! graphics, network, battery and multimedia facts.
//!
//! # Example
//!
//! ```ignore
//! use scan_intake::hardware::HardwareExtractor;
//!
//! let extractor = HardwareExtractor::default();
//! let summary = extractor.extract_bundle(&bundle)?;
//!
//! println!("RAM: {}", summary.ram_label().unwrap_or_default());
//! for drive in &summary.drives {
//!     println!("  {:?} {:?}", drive.logical_path, drive.serial);
//! }
//! ```

pub mod ephemeral;
pub mod extractor;
pub mod format;
pub mod lshw;

use serde::{Deserialize, Serialize};

pub use ephemeral::{EphemeralFilter, BUILTIN_EPHEMERAL_PREFIXES};
pub use extractor::HardwareExtractor;
pub use format::{format_bytes, parse_human_size};
pub use lshw::{LshwNode, NodeClass};

/// Values lshw and firmware use when a serial is not really known.
pub const PLACEHOLDER_SERIALS: [&str; 10] = [
    "unknown",
    "none",
    "n/a",
    "na",
    "null",
    "0",
    "0000000",
    "00000000",
    "000000000",
    "not specified",
];

/// Minimum length of a plausible device serial
pub const MIN_DEVICE_SERIAL_LEN: usize = 6;

/// True when the trimmed value is blank or a known placeholder.
pub fn is_placeholder_serial(serial: &str) -> bool {
    let s = serial.trim();
    s.is_empty()
        || PLACEHOLDER_SERIALS
            .iter()
            .any(|p| s.eq_ignore_ascii_case(p))
}

/// True when the value can serve as a device serial.
pub fn looks_like_serial(serial: &str) -> bool {
    !is_placeholder_serial(serial) && serial.trim().chars().count() >= MIN_DEVICE_SERIAL_LEN
}

// =============================================================================
// Warnings
// =============================================================================

/// Fact category, used to attribute parse warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareCategory {
    System,
    Processor,
    Memory,
    Storage,
    Display,
    Network,
    Power,
    Multimedia,
    /// Tree structure itself (depth, unclassified nodes)
    Tree,
}

/// Non-fatal problem found while extracting one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub category: HardwareCategory,
    pub node_path: String,
    pub message: String,
}

impl ParseWarning {
    pub fn new(category: HardwareCategory, node_path: &str, message: impl Into<String>) -> Self {
        Self {
            category,
            node_path: node_path.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}: {}", self.category, self.node_path, self.message)
    }
}

// =============================================================================
// Facts
// =============================================================================

/// Vendor / product / serial of the machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub vendor: Option<String>,
    pub product: Option<String>,
    pub serial: Option<String>,
}

/// CPU descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuInfo {
    /// `"<vendor> <product>"`, or the product alone
    pub model: String,
    pub vendor: Option<String>,
    pub product: String,
    pub cores: Option<u32>,
    pub threads: Option<u32>,
}

/// How the memory total was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTotalSource {
    /// The single "System Memory" node
    SystemMemory,
    /// Sum of the memory-bank leaves
    BankSum,
    /// The bundle's human-readable summary field
    Summary,
    Unknown,
}

/// One memory bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySlot {
    pub slot: Option<String>,
    pub size_bytes: Option<u64>,
    /// Rendering of `size_bytes`; the byte value itself is never rounded
    pub size_human: Option<String>,
    pub vendor: Option<String>,
    pub product: Option<String>,
    pub serial: Option<String>,
}

impl MemorySlot {
    pub fn new(
        slot: Option<String>,
        size_bytes: Option<u64>,
        vendor: Option<String>,
        product: Option<String>,
        serial: Option<String>,
    ) -> Self {
        let size_human = size_bytes.filter(|b| *b > 0).map(format_bytes);
        Self {
            slot,
            size_bytes,
            size_human,
            vendor,
            product,
            serial,
        }
    }

    pub fn is_populated(&self) -> bool {
        self.size_bytes.is_some_and(|b| b > 0)
    }
}

/// A drive seen in one scan. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFact {
    pub logical_path: Option<String>,
    pub capacity_bytes: Option<u64>,
    pub model: Option<String>,
    pub vendor: Option<String>,
    /// `None` when absent, blank or a placeholder
    pub serial: Option<String>,
}

impl DriveFact {
    /// Serial usable as a drive identity.
    pub fn identity(&self) -> Option<&str> {
        self.serial
            .as_deref()
            .map(str::trim)
            .filter(|s| !is_placeholder_serial(s))
    }

    /// Operator-facing label, e.g. `256.0 GB TOSHIBA THNSFJ25 (SN 95CS1108TBZW)`.
    pub fn label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(bytes) = self.capacity_bytes.filter(|b| *b > 0) {
            parts.push(format_bytes(bytes));
        }
        if let Some(model) = &self.model {
            parts.push(model.clone());
        }
        match self.identity() {
            Some(serial) => parts.push(format!("(SN {})", serial)),
            None => parts.push("(no serial)".to_string()),
        }
        parts.join(" ")
    }
}

/// Display adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicsAdapter {
    pub product: Option<String>,
    pub vendor: Option<String>,
    pub description: Option<String>,
}

/// Kind of network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    Wireless,
    Ethernet,
    Unknown,
}

/// Network interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAdapter {
    pub product: Option<String>,
    pub logical_name: Option<String>,
    pub mac: Option<String>,
    pub kind: NetworkKind,
}

/// Battery of a portable system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryInfo {
    pub product: Option<String>,
    pub vendor: Option<String>,
    /// Reported capacity, in `units`
    pub capacity: Option<u64>,
    pub units: Option<String>,
}

/// Webcam and audio presence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultimediaInfo {
    pub webcam: bool,
    pub webcam_model: Option<String>,
    pub audio: bool,
    pub audio_model: Option<String>,
}

// =============================================================================
// Summary
// =============================================================================

/// Everything extracted from one accepted scan. Self-contained; never merged
/// with an earlier summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareSummary {
    pub device_serial: Option<String>,
    pub system: Option<SystemInfo>,
    pub cpu: Option<CpuInfo>,
    /// `None` means unknown, never zero
    pub memory_total_bytes: Option<u64>,
    pub memory_total_source: MemoryTotalSource,
    pub memory_slots: Vec<MemorySlot>,
    pub drives: Vec<DriveFact>,
    /// Disk nodes dropped by the ephemeral filter
    pub excluded_drives: usize,
    pub graphics: Vec<GraphicsAdapter>,
    pub network: Vec<NetworkAdapter>,
    pub battery: Option<BatteryInfo>,
    pub multimedia: MultimediaInfo,
    pub warnings: Vec<ParseWarning>,
}

impl HardwareSummary {
    /// Human-readable memory total.
    pub fn ram_label(&self) -> Option<String> {
        self.memory_total_bytes.map(format_bytes)
    }

    /// All drives, joined with `" + "`.
    pub fn storage_label(&self) -> Option<String> {
        if self.drives.is_empty() {
            return None;
        }
        Some(
            self.drives
                .iter()
                .map(DriveFact::label)
                .collect::<Vec<_>>()
                .join(" + "),
        )
    }

    pub fn populated_slots(&self) -> usize {
        self.memory_slots.iter().filter(|s| s.is_populated()).count()
    }
}
