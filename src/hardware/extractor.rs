//! Hardware Extractor
//!
//! Depth-first walk over the lshw tree. Each node is dispatched on its class
//! to a category handler; unrecognized classes fall through untouched. A bad
//! field or subtree costs only a [`ParseWarning`].
//!
//! # Memory total
//!
//! First success wins:
//!
//! 1. exactly one sized "System Memory" node
//! 2. the sum of the sized memory-bank leaves
//! 3. the bundle's human-readable `meta.summary.ram`
//!
//! Otherwise the total is unknown (`None`), never zero.

use serde_json::Value;
use tracing::debug;

use super::lshw::{LshwNode, NodeClass};
use super::{
    is_placeholder_serial, looks_like_serial, parse_human_size, BatteryInfo, CpuInfo, DriveFact,
    EphemeralFilter, GraphicsAdapter, HardwareCategory, HardwareSummary, MemorySlot,
    MemoryTotalSource, MultimediaInfo, NetworkAdapter, NetworkKind, ParseWarning, SystemInfo,
};
use crate::bundle::{ScanBundle, LSHW_SOURCE};
use crate::config::ExtractorConfig;
use crate::error::{Error, Result};

/// Extracts a [`HardwareSummary`] from an lshw tree.
#[derive(Debug, Clone)]
pub struct HardwareExtractor {
    max_depth: usize,
    ephemeral: EphemeralFilter,
}

impl Default for HardwareExtractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl HardwareExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            ephemeral: EphemeralFilter::from_config(config),
        }
    }

    pub fn ephemeral_filter(&self) -> &EphemeralFilter {
        &self.ephemeral
    }

    /// Extract from a validated bundle's `sources.lshw`.
    pub fn extract_bundle(&self, bundle: &ScanBundle) -> Result<HardwareSummary> {
        let source = bundle
            .lshw()
            .ok_or_else(|| Error::MissingField(format!("sources.{}", LSHW_SOURCE)))?;
        self.extract(source, bundle.summary_ram.as_deref())
    }

    /// Extract from a raw lshw payload. Fails only with `MalformedTree`.
    pub fn extract(&self, source: &Value, summary_ram: Option<&str>) -> Result<HardwareSummary> {
        let (root, warnings) = LshwNode::parse_root(source, self.max_depth)?;

        let mut walk = Walk::new(&self.ephemeral, warnings);
        walk.visit(&root, None);
        let summary = walk.finish(summary_ram);

        debug!(
            drives = summary.drives.len(),
            excluded_drives = summary.excluded_drives,
            memory_slots = summary.memory_slots.len(),
            memory_total_source = ?summary.memory_total_source,
            warnings = summary.warnings.len(),
            "Extracted hardware summary"
        );

        Ok(summary)
    }
}

// =============================================================================
// Tree Walk
// =============================================================================

struct Walk<'a> {
    ephemeral: &'a EphemeralFilter,
    device_serial: Option<String>,
    system: Option<SystemInfo>,
    cpu: Option<CpuInfo>,
    system_memory: Vec<u64>,
    slots: Vec<MemorySlot>,
    drives: Vec<DriveFact>,
    excluded_drives: usize,
    graphics: Vec<GraphicsAdapter>,
    network: Vec<NetworkAdapter>,
    battery: Option<BatteryInfo>,
    multimedia: MultimediaInfo,
    warnings: Vec<ParseWarning>,
}

impl<'a> Walk<'a> {
    fn new(ephemeral: &'a EphemeralFilter, warnings: Vec<ParseWarning>) -> Self {
        Self {
            ephemeral,
            device_serial: None,
            system: None,
            cpu: None,
            system_memory: Vec::new(),
            slots: Vec::new(),
            drives: Vec::new(),
            excluded_drives: 0,
            graphics: Vec::new(),
            network: Vec::new(),
            battery: None,
            multimedia: MultimediaInfo::default(),
            warnings,
        }
    }

    fn visit<'n>(&mut self, node: &'n LshwNode, storage: Option<&'n LshwNode>) {
        self.device_serial(node);

        if self.battery.is_none() && node.mentions("battery") {
            self.battery(node);
        }

        match &node.class {
            NodeClass::System => self.system(node),
            NodeClass::Processor => self.processor(node),
            NodeClass::Memory | NodeClass::Bank => self.memory(node),
            NodeClass::Disk => self.disk(node, storage),
            NodeClass::Display => self.display(node),
            NodeClass::Network => self.network(node),
            NodeClass::Multimedia => self.multimedia(node),
            NodeClass::Bus
            | NodeClass::Bridge
            | NodeClass::Chassis
            | NodeClass::Motherboard
            | NodeClass::Storage
            | NodeClass::Power
            | NodeClass::Other(_) => {}
        }

        let storage = if node.class == NodeClass::Storage {
            Some(node)
        } else {
            storage
        };
        for child in &node.children {
            self.visit(child, storage);
        }
    }

    fn warn(&mut self, category: HardwareCategory, node: &LshwNode, message: impl Into<String>) {
        self.warnings
            .push(ParseWarning::new(category, &node.path, message));
    }

    /// Byte size of a memory or disk node, `size` first then `capacity`.
    fn byte_size(&mut self, category: HardwareCategory, node: &LshwNode) -> Option<u64> {
        match node.size_in_bytes() {
            Ok(size) => size.or_else(|| {
                if node.units.is_none() {
                    node.capacity
                } else {
                    None
                }
            }),
            Err(message) => {
                self.warn(category, node, message);
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    fn device_serial(&mut self, node: &LshwNode) {
        if self.device_serial.is_some() {
            return;
        }

        let mut candidates = Vec::with_capacity(3);
        let is_root = node.depth == 0;
        if is_root
            || matches!(
                node.class,
                NodeClass::System
                    | NodeClass::Bus
                    | NodeClass::Bridge
                    | NodeClass::Chassis
                    | NodeClass::Motherboard
            )
        {
            candidates.push(node.serial.as_deref());
        }
        if is_root || node.class == NodeClass::System {
            candidates.push(node.uuid.as_deref());
            candidates.push(node.config("uuid"));
        }

        self.device_serial = candidates
            .into_iter()
            .flatten()
            .find(|s| looks_like_serial(s))
            .map(|s| s.trim().to_string());
    }

    fn system(&mut self, node: &LshwNode) {
        if self.system.is_none() {
            self.system = Some(SystemInfo {
                vendor: non_blank(&node.vendor),
                product: non_blank(&node.product),
                serial: non_blank(&node.serial),
            });
        }
    }

    // -------------------------------------------------------------------------
    // Processor
    // -------------------------------------------------------------------------

    fn processor(&mut self, node: &LshwNode) {
        if self.cpu.is_some() {
            return;
        }
        let Some(product) = non_blank(&node.product) else {
            return;
        };
        let vendor = non_blank(&node.vendor);
        let model = match &vendor {
            Some(vendor) => format!("{} {}", vendor, product),
            None => product.clone(),
        };

        let cores = self.config_count(node, "cores");
        let threads = self.config_count(node, "threads");

        self.cpu = Some(CpuInfo {
            model,
            vendor,
            product,
            cores,
            threads,
        });
    }

    fn config_count(&mut self, node: &LshwNode, key: &str) -> Option<u32> {
        let raw = node.config(key)?;
        match raw.trim().parse::<u32>() {
            Ok(n) => Some(n),
            Err(_) => {
                self.warn(
                    HardwareCategory::Processor,
                    node,
                    format!("configuration '{}' is not a count: '{}'", key, raw),
                );
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Memory
    // -------------------------------------------------------------------------

    fn memory(&mut self, node: &LshwNode) {
        if is_memory_bank(node) {
            if node.children.iter().any(is_memory_bank) {
                return;
            }
            let size = self.byte_size(HardwareCategory::Memory, node);
            let slot = non_blank(&node.slot)
                .or_else(|| non_blank(&node.id))
                .or_else(|| non_blank(&node.description));
            self.slots.push(MemorySlot::new(
                slot,
                size,
                non_blank(&node.vendor),
                non_blank(&node.product),
                non_blank(&node.serial),
            ));
            return;
        }

        let is_system_memory = node
            .description
            .as_deref()
            .is_some_and(|d| d.to_ascii_lowercase().contains("system memory"));
        if is_system_memory {
            if let Some(size) = self.byte_size(HardwareCategory::Memory, node) {
                if size > 0 {
                    self.system_memory.push(size);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Storage
    // -------------------------------------------------------------------------

    fn disk(&mut self, node: &LshwNode, storage: Option<&LshwNode>) {
        if self.ephemeral.any_ephemeral(&node.logical_names) {
            debug!(path = %node.path, logical_name = ?node.logical_name(), "Excluding ephemeral device");
            self.excluded_drives += 1;
            return;
        }

        let capacity_bytes = self.byte_size(HardwareCategory::Storage, node);
        let mut serial = drive_serial(&node.serial);
        let mut product = non_blank(&node.product);
        let mut vendor = non_blank(&node.vendor);

        // NVMe namespaces carry no serial; the controller does.
        if serial.is_none() {
            if let Some(controller) = storage.filter(|c| single_disk_controller(c)) {
                if let Some(inherited) = drive_serial(&controller.serial) {
                    serial = Some(inherited);
                    product = product.or_else(|| non_blank(&controller.product));
                    vendor = vendor.or_else(|| non_blank(&controller.vendor));
                }
            }
        }

        self.drives.push(DriveFact {
            logical_path: node.logical_name().map(str::to_string),
            capacity_bytes,
            model: product.or_else(|| non_blank(&node.description)),
            vendor,
            serial,
        });
    }

    // -------------------------------------------------------------------------
    // Peripherals
    // -------------------------------------------------------------------------

    fn display(&mut self, node: &LshwNode) {
        let description = non_blank(&node.description);
        self.graphics.push(GraphicsAdapter {
            product: non_blank(&node.product).or_else(|| description.clone()),
            vendor: non_blank(&node.vendor),
            description,
        });
    }

    fn network(&mut self, node: &LshwNode) {
        self.network.push(NetworkAdapter {
            product: non_blank(&node.product).or_else(|| non_blank(&node.description)),
            logical_name: node.logical_name().map(str::to_string),
            mac: non_blank(&node.serial),
            kind: network_kind(node),
        });
    }

    fn battery(&mut self, node: &LshwNode) {
        self.battery = Some(BatteryInfo {
            product: non_blank(&node.product).or_else(|| non_blank(&node.description)),
            vendor: non_blank(&node.vendor),
            capacity: node.capacity.or(node.size),
            units: non_blank(&node.units),
        });
    }

    fn multimedia(&mut self, node: &LshwNode) {
        let Some(model) = non_blank(&node.product).or_else(|| non_blank(&node.description)) else {
            return;
        };
        let text = model.to_ascii_lowercase();

        if ["camera", "webcam", "uvc"].iter().any(|k| text.contains(k)) {
            self.multimedia.webcam = true;
            if self.multimedia.webcam_model.is_none() {
                self.multimedia.webcam_model = Some(model.clone());
            }
        }
        if ["audio", "microphone", "sound"].iter().any(|k| text.contains(k)) {
            self.multimedia.audio = true;
            if self.multimedia.audio_model.is_none() {
                self.multimedia.audio_model = Some(model);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Finish
    // -------------------------------------------------------------------------

    fn finish(mut self, summary_ram: Option<&str>) -> HardwareSummary {
        let bank_sizes: Vec<u64> = self
            .slots
            .iter()
            .filter_map(|s| s.size_bytes)
            .filter(|b| *b > 0)
            .collect();

        if self.system_memory.len() > 1 {
            self.warnings.push(ParseWarning::new(
                HardwareCategory::Memory,
                "",
                format!(
                    "{} system memory nodes; falling back to memory banks",
                    self.system_memory.len()
                ),
            ));
        }

        let (memory_total_bytes, memory_total_source) = if let [total] = self.system_memory[..] {
            (Some(total), MemoryTotalSource::SystemMemory)
        } else if !bank_sizes.is_empty() {
            let total = bank_sizes.iter().fold(0u64, |acc, b| acc.saturating_add(*b));
            (Some(total), MemoryTotalSource::BankSum)
        } else {
            match summary_ram.map(|ram| (ram, parse_human_size(ram))) {
                Some((_, Some(bytes))) if bytes > 0 => (Some(bytes), MemoryTotalSource::Summary),
                Some((ram, _)) if !ram.trim().is_empty() => {
                    self.warnings.push(ParseWarning::new(
                        HardwareCategory::Memory,
                        "",
                        format!("unusable RAM summary '{}'", ram),
                    ));
                    (None, MemoryTotalSource::Unknown)
                }
                _ => (None, MemoryTotalSource::Unknown),
            }
        };

        HardwareSummary {
            device_serial: self.device_serial,
            system: self.system,
            cpu: self.cpu,
            memory_total_bytes,
            memory_total_source,
            memory_slots: self.slots,
            drives: self.drives,
            excluded_drives: self.excluded_drives,
            graphics: self.graphics,
            network: self.network,
            battery: self.battery,
            multimedia: self.multimedia,
            warnings: self.warnings,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn drive_serial(value: &Option<String>) -> Option<String> {
    non_blank(value).filter(|s| !is_placeholder_serial(s))
}

fn is_memory_bank(node: &LshwNode) -> bool {
    match node.class {
        NodeClass::Bank => true,
        NodeClass::Memory => {
            node.id
                .as_deref()
                .is_some_and(|id| id.to_ascii_lowercase().starts_with("bank"))
                || node
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_ascii_lowercase().contains("bank"))
        }
        _ => false,
    }
}

fn single_disk_controller(controller: &LshwNode) -> bool {
    controller
        .children
        .iter()
        .filter(|c| c.class == NodeClass::Disk)
        .count()
        == 1
}

fn network_kind(node: &LshwNode) -> NetworkKind {
    let flag = |key: &str| node.config(key).is_some_and(|v| !v.trim().is_empty());

    let mut kind = if flag("wireless")
        || flag("wireless-info")
        || node.config("driver").is_some_and(|d| d.contains("wlan"))
    {
        NetworkKind::Wireless
    } else if flag("ip") || flag("ip6") {
        NetworkKind::Ethernet
    } else {
        NetworkKind::Unknown
    };

    let description = node
        .description
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ["wireless", "wifi", "wlan"].iter().any(|k| description.contains(k)) {
        kind = NetworkKind::Wireless;
    } else if kind == NetworkKind::Unknown && description.contains("ethernet") {
        kind = NetworkKind::Ethernet;
    }
    kind
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    const GIB: u64 = 1 << 30;

    fn machine(children: Value) -> Value {
        json!({
            "id": "computer",
            "class": "system",
            "vendor": "LENOVO",
            "product": "20L5CTO1WW",
            "serial": "PF1ABCDE",
            "configuration": { "uuid": "6b1f7c2e-0000-4000-8000-1234567890ab" },
            "children": [{ "id": "core", "class": "bus", "serial": "L1HF81N00AB", "children": children }]
        })
    }

    fn bank(id: &str, size: Option<u64>) -> Value {
        let mut node = json!({
            "id": id,
            "class": "memory",
            "description": "SODIMM DDR4 Synchronous 2667 MHz",
            "vendor": "Samsung",
            "product": "M471A1K43CB1-CTD",
            "serial": "12345678",
            "slot": format!("ChannelA-{}", id),
            "units": "bytes"
        });
        if let Some(size) = size {
            node["size"] = json!(size);
        }
        node
    }

    fn system_memory(size: Option<u64>, banks: Vec<Value>) -> Value {
        let mut node = json!({
            "id": "memory",
            "class": "memory",
            "description": "System Memory",
            "units": "bytes",
            "children": banks
        });
        if let Some(size) = size {
            node["size"] = json!(size);
        }
        node
    }

    fn disk(logical: &str, serial: Option<&str>) -> Value {
        let mut node = json!({
            "id": "disk",
            "class": "disk",
            "description": "ATA Disk",
            "product": "TOSHIBA THNSFJ25",
            "logicalname": logical,
            "size": 256 * GIB,
            "units": "bytes"
        });
        if let Some(serial) = serial {
            node["serial"] = json!(serial);
        }
        node
    }

    fn extract(tree: Value) -> HardwareSummary {
        HardwareExtractor::default().extract(&tree, None).unwrap()
    }

    #[test]
    fn test_single_bank() {
        let summary = extract(machine(json!([system_memory(None, vec![bank("bank:0", Some(8 * GIB))])])));

        assert_eq!(summary.memory_total_bytes, Some(8 * GIB));
        assert_eq!(summary.memory_total_source, MemoryTotalSource::BankSum);
        assert_eq!(summary.memory_slots.len(), 1);
        assert_eq!(summary.memory_slots[0].size_bytes, Some(8 * GIB));
        assert_eq!(summary.memory_slots[0].size_human.as_deref(), Some("8.0 GB"));
        assert_eq!(summary.memory_slots[0].slot.as_deref(), Some("ChannelA-bank:0"));
    }

    #[test]
    fn test_two_banks_sum() {
        let summary = extract(machine(json!([system_memory(
            None,
            vec![bank("bank:0", Some(8 * GIB)), bank("bank:1", Some(8 * GIB))]
        )])));

        assert_eq!(summary.memory_total_bytes, Some(16 * GIB));
        assert_eq!(summary.memory_slots.len(), 2);
        assert_eq!(summary.ram_label().as_deref(), Some("16.0 GB"));
    }

    #[test]
    fn test_system_memory_node_wins() {
        let summary = extract(machine(json!([system_memory(
            Some(16 * GIB),
            vec![bank("bank:0", Some(8 * GIB)), bank("bank:1", None)]
        )])));

        assert_eq!(summary.memory_total_bytes, Some(16 * GIB));
        assert_eq!(summary.memory_total_source, MemoryTotalSource::SystemMemory);
        assert_eq!(summary.memory_slots.len(), 2);
        assert_eq!(summary.populated_slots(), 1);
    }

    #[test]
    fn test_no_memory_is_unknown() {
        let summary = extract(machine(json!([])));

        assert_eq!(summary.memory_total_bytes, None);
        assert_eq!(summary.memory_total_source, MemoryTotalSource::Unknown);
        assert!(summary.memory_slots.is_empty());
        assert_eq!(summary.ram_label(), None);
    }

    #[test]
    fn test_summary_ram_fallback() {
        let extractor = HardwareExtractor::default();

        let summary = extractor.extract(&machine(json!([])), Some("16.0 GB")).unwrap();
        assert_eq!(summary.memory_total_bytes, Some(16 * GIB));
        assert_eq!(summary.memory_total_source, MemoryTotalSource::Summary);

        let summary = extractor.extract(&machine(json!([])), Some("lots")).unwrap();
        assert_eq!(summary.memory_total_bytes, None);
        assert_eq!(summary.warnings.len(), 1);

        let summary = extractor.extract(&machine(json!([])), Some("0 GB")).unwrap();
        assert_eq!(summary.memory_total_bytes, None);
    }

    #[test]
    fn test_cache_is_not_memory() {
        let cache = json!({ "id": "cache:0", "class": "memory", "description": "L1 cache", "size": 262144, "units": "bytes" });
        let summary = extract(machine(json!([cache])));
        assert_eq!(summary.memory_total_bytes, None);
        assert!(summary.memory_slots.is_empty());
    }

    #[test]
    fn test_ephemeral_disks_excluded() {
        let summary = extract(machine(json!([
            disk("/dev/mmcblk0", Some("CARDREADER01")),
            disk("/dev/loop0", Some("LOOPSERIAL01")),
            { "id": "cdrom", "class": "disk", "logicalname": ["/dev/cdrom", "/dev/sr0"], "serial": "OPTICAL0001" },
            disk("/dev/sda", Some("95CS1108TBZW"))
        ])));

        assert_eq!(summary.excluded_drives, 3);
        assert_eq!(summary.drives.len(), 1);
        let drive = &summary.drives[0];
        assert_eq!(drive.logical_path.as_deref(), Some("/dev/sda"));
        assert_eq!(drive.serial.as_deref(), Some("95CS1108TBZW"));
        assert_eq!(drive.capacity_bytes, Some(256 * GIB));
        assert_eq!(
            summary.storage_label().as_deref(),
            Some("256.0 GB TOSHIBA THNSFJ25 (SN 95CS1108TBZW)")
        );
    }

    #[test]
    fn test_placeholder_drive_serial_is_absent() {
        let summary = extract(machine(json!([disk("/dev/sdb", Some("Not Specified")), disk("/dev/sdc", None)])));
        assert_eq!(summary.drives.len(), 2);
        assert!(summary.drives.iter().all(|d| d.serial.is_none()));
    }

    #[test]
    fn test_nvme_serial_inherited_from_controller() {
        let summary = extract(machine(json!([{
            "id": "nvme",
            "class": "storage",
            "product": "SAMSUNG MZVLB512HAJQ-000L7",
            "vendor": "Samsung Electronics Co Ltd",
            "serial": "S3W8NX0M123456",
            "children": [{
                "id": "namespace",
                "class": "disk",
                "description": "NVMe disk",
                "logicalname": "/dev/nvme0n1",
                "size": 512_110_190_592u64,
                "units": "bytes"
            }]
        }])));

        let drive = &summary.drives[0];
        assert_eq!(drive.serial.as_deref(), Some("S3W8NX0M123456"));
        assert_eq!(drive.model.as_deref(), Some("SAMSUNG MZVLB512HAJQ-000L7"));
        assert_eq!(drive.vendor.as_deref(), Some("Samsung Electronics Co Ltd"));
    }

    #[test]
    fn test_no_inheritance_from_multi_disk_controller() {
        let summary = extract(machine(json!([{
            "id": "raid",
            "class": "storage",
            "serial": "RAIDCTRL0001",
            "children": [disk("/dev/sda", None), disk("/dev/sdb", None)]
        }])));

        assert_eq!(summary.drives.len(), 2);
        assert!(summary.drives.iter().all(|d| d.serial.is_none()));
    }

    #[test]
    fn test_device_serial_and_system() {
        let summary = extract(machine(json!([])));
        assert_eq!(summary.device_serial.as_deref(), Some("PF1ABCDE"));

        let system = summary.system.unwrap();
        assert_eq!(system.vendor.as_deref(), Some("LENOVO"));
        assert_eq!(system.product.as_deref(), Some("20L5CTO1WW"));
    }

    #[test]
    fn test_device_serial_falls_back_past_placeholders() {
        let mut tree = machine(json!([]));
        tree["serial"] = json!("0000000");
        let summary = extract(tree);
        // Root serial rejected; the system uuid comes next.
        assert_eq!(
            summary.device_serial.as_deref(),
            Some("6b1f7c2e-0000-4000-8000-1234567890ab")
        );
    }

    #[test]
    fn test_device_serial_from_motherboard() {
        let summary = extract(json!({
            "id": "computer",
            "class": "system",
            "vendor": "Dell Inc.",
            "children": [
                { "id": "input", "class": "input", "serial": "KBD-000991" },
                { "id": "board", "class": "motherboard", "product": "0XR72K", "serial": "/7Q2XJK2/CN1296" }
            ]
        }));
        assert_eq!(summary.device_serial.as_deref(), Some("/7Q2XJK2/CN1296"));
        assert_eq!(summary.system.unwrap().vendor.as_deref(), Some("Dell Inc."));
    }

    #[test]
    fn test_device_serial_from_unclassed_root() {
        let summary = extract(json!({
            "id": "host",
            "class": "generic",
            "uuid": "0f7c92d0-1c4e-11ea-8000-3c18a0a1b2c3",
            "children": []
        }));
        assert_eq!(
            summary.device_serial.as_deref(),
            Some("0f7c92d0-1c4e-11ea-8000-3c18a0a1b2c3")
        );
    }

    #[test]
    fn test_cpu() {
        let summary = extract(machine(json!([
            { "id": "cpu:0", "class": "processor", "product": "  " },
            {
                "id": "cpu:1",
                "class": "processor",
                "vendor": "Intel Corp.",
                "product": "Intel(R) Core(TM) i5-8350U CPU @ 1.70GHz",
                "configuration": { "cores": "4", "threads": "8" }
            }
        ])));

        let cpu = summary.cpu.unwrap();
        assert_eq!(cpu.model, "Intel Corp. Intel(R) Core(TM) i5-8350U CPU @ 1.70GHz");
        assert_eq!(cpu.cores, Some(4));
        assert_eq!(cpu.threads, Some(8));
    }

    #[test]
    fn test_network_kinds() {
        let summary = extract(machine(json!([
            { "id": "network", "class": "network", "description": "Wireless interface", "product": "Wireless 8265 / 8275", "logicalname": "wlp2s0", "serial": "00:11:22:33:44:55" },
            { "id": "network", "class": "network", "description": "Ethernet interface", "logicalname": "enp0s31f6", "configuration": { "ip": "10.0.0.5" } },
            { "id": "network", "class": "network", "description": "Network controller" }
        ])));

        let kinds: Vec<NetworkKind> = summary.network.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NetworkKind::Wireless, NetworkKind::Ethernet, NetworkKind::Unknown]
        );
        assert_eq!(summary.network[0].mac.as_deref(), Some("00:11:22:33:44:55"));
        assert_eq!(summary.network[1].product.as_deref(), Some("Ethernet interface"));
    }

    #[test]
    fn test_graphics_battery_multimedia() {
        let summary = extract(machine(json!([
            { "id": "display", "class": "display", "description": "VGA compatible controller", "vendor": "Intel Corporation" },
            { "id": "battery", "class": "power", "product": "01AV430", "vendor": "SMP", "capacity": 57000, "units": "mWh" },
            { "id": "multimedia", "class": "multimedia", "product": "Sunrise Point-LP HD Audio" },
            { "id": "usb", "class": "multimedia", "product": "Integrated Camera" }
        ])));

        assert_eq!(summary.graphics.len(), 1);
        assert_eq!(summary.graphics[0].product.as_deref(), Some("VGA compatible controller"));

        let battery = summary.battery.unwrap();
        assert_eq!(battery.product.as_deref(), Some("01AV430"));
        assert_eq!(battery.capacity, Some(57000));
        assert_eq!(battery.units.as_deref(), Some("mWh"));

        assert!(summary.multimedia.audio);
        assert!(summary.multimedia.webcam);
        assert_eq!(summary.multimedia.webcam_model.as_deref(), Some("Integrated Camera"));
    }

    #[test]
    fn test_malformed_subtree_is_skipped_not_fatal() {
        let summary = extract(machine(json!([
            { "id": "bank:0", "class": "memory", "size": { "oops": 1 } },
            "not a node",
            disk("/dev/sda", Some("95CS1108TBZW")),
            { "id": "cpu", "class": "processor", "product": "Ryzen 5", "configuration": { "cores": "many" } }
        ])));

        assert_eq!(summary.drives.len(), 1);
        assert_eq!(summary.memory_slots.len(), 1);
        assert_eq!(summary.memory_total_bytes, None);
        assert_eq!(summary.cpu.unwrap().cores, None);
        assert_eq!(summary.warnings.len(), 3);
        assert!(summary.warnings.iter().any(|w| w.category == HardwareCategory::Memory));
        assert!(summary.warnings.iter().any(|w| w.category == HardwareCategory::Processor));
    }

    #[test]
    fn test_root_failure_is_fatal() {
        let extractor = HardwareExtractor::default();
        assert_matches!(extractor.extract(&json!(17), None), Err(Error::MalformedTree(_)));
    }

    #[test]
    fn test_extra_ephemeral_prefix() {
        let extractor = HardwareExtractor::new(&ExtractorConfig {
            extra_ephemeral_prefixes: vec!["zram".into()],
            ..Default::default()
        });
        let summary = extractor
            .extract(&machine(json!([disk("/dev/zram0", Some("ZRAMSERIAL1"))])), None)
            .unwrap();
        assert!(summary.drives.is_empty());
        assert_eq!(summary.excluded_drives, 1);
    }
}
