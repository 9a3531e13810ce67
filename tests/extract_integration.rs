//! Hardware extraction over realistic lshw trees.

use assert_matches::assert_matches;
use serde_json::{json, Value};

use scan_intake::config::ExtractorConfig;
use scan_intake::hardware::{HardwareCategory, MemoryTotalSource, NetworkKind};
use scan_intake::{Error, HardwareExtractor};

const GIB: u64 = 1 << 30;

fn workstation() -> Value {
    json!({
        "id": "latitude",
        "class": "system",
        "description": "Notebook",
        "product": "Latitude 7490 (0817)",
        "vendor": "Dell Inc.",
        "serial": "7H2KLM2",
        "configuration": { "uuid": "4C4C4544-0048-3210-804B-B7C04F4D4C32" },
        "children": [{
            "id": "core",
            "class": "bus",
            "description": "Motherboard",
            "serial": "/7H2KLM2/CNCMK0087Q0039/",
            "children": [
                {
                    "id": "cpu",
                    "class": "processor",
                    "product": "Intel(R) Core(TM) i5-8350U CPU @ 1.70GHz",
                    "vendor": "Intel Corp.",
                    "configuration": { "cores": "4", "enabledcores": "4", "threads": "8" }
                },
                {
                    "id": "memory",
                    "class": "memory",
                    "description": "System Memory",
                    "children": [
                        {
                            "id": "bank:0",
                            "class": "memory",
                            "description": "SODIMM DDR4 Synchronous 2400 MHz",
                            "product": "M471A1K43CB1-CRC",
                            "vendor": "Samsung",
                            "serial": "12345678",
                            "slot": "DIMM A",
                            "size": 8 * GIB,
                            "units": "bytes"
                        },
                        { "id": "bank:1", "class": "memory", "description": "[empty]", "slot": "DIMM B" }
                    ]
                },
                {
                    "id": "pci",
                    "class": "bridge",
                    "children": [
                        { "id": "display", "class": "display", "product": "UHD Graphics 620", "vendor": "Intel Corporation" },
                        {
                            "id": "network",
                            "class": "network",
                            "description": "Wireless interface",
                            "product": "Wireless 8265 / 8275",
                            "logicalname": "wlp2s0",
                            "serial": "a0:c5:89:12:34:56",
                            "configuration": { "driver": "iwlwifi", "wireless": "IEEE 802.11" }
                        },
                        {
                            "id": "network",
                            "class": "network",
                            "description": "Ethernet interface",
                            "product": "Ethernet Connection (4) I219-LM",
                            "logicalname": "enp0s31f6",
                            "serial": "54:bf:64:aa:bb:cc",
                            "configuration": { "driver": "e1000e", "ip": "10.0.4.21" }
                        },
                        { "id": "multimedia", "class": "multimedia", "product": "Sunrise Point-LP HD Audio" },
                        {
                            "id": "nvme",
                            "class": "storage",
                            "description": "NVMe device",
                            "product": "SAMSUNG MZVLB256HAHQ-000L7",
                            "vendor": "Samsung Electronics Co Ltd",
                            "serial": "S4EMNX0N123456",
                            "children": [{
                                "id": "namespace",
                                "class": "disk",
                                "description": "NVMe disk",
                                "logicalname": "/dev/nvme0n1",
                                "size": 256_060_514_304u64,
                                "units": "bytes"
                            }]
                        },
                        {
                            "id": "sdcard",
                            "class": "storage",
                            "product": "RTS525A PCI Express Card Reader",
                            "serial": "CARDREADER01",
                            "children": [{ "id": "disk", "class": "disk", "logicalname": "/dev/mmcblk0", "size": 32 * GIB }]
                        },
                        {
                            "id": "usb",
                            "class": "bus",
                            "children": [
                                { "id": "webcam", "class": "multimedia", "product": "Integrated_Webcam_HD" },
                                { "id": "cdrom", "class": "disk", "logicalname": ["/dev/cdrom", "/dev/sr0"] }
                            ]
                        }
                    ]
                },
                {
                    "id": "battery",
                    "class": "power",
                    "product": "DELL 0F5KN",
                    "vendor": "SMP",
                    "capacity": 60000,
                    "units": "mWh"
                }
            ]
        }]
    })
}

fn extractor() -> HardwareExtractor {
    HardwareExtractor::new(&ExtractorConfig::default())
}

#[test]
fn test_workstation_summary() {
    let summary = extractor().extract(&workstation(), None).unwrap();

    assert_eq!(summary.device_serial.as_deref(), Some("7H2KLM2"));
    let system = summary.system.as_ref().unwrap();
    assert_eq!(system.vendor.as_deref(), Some("Dell Inc."));

    let cpu = summary.cpu.as_ref().unwrap();
    assert!(cpu.model.contains("i5-8350U"));
    assert_eq!(cpu.cores, Some(4));
    assert_eq!(cpu.threads, Some(8));

    // "System Memory" has no size, so the banks are summed.
    assert_eq!(summary.memory_total_bytes, Some(8 * GIB));
    assert_eq!(summary.memory_total_source, MemoryTotalSource::BankSum);
    assert_eq!(summary.memory_slots.len(), 2);
    assert_eq!(summary.populated_slots(), 1);
    assert_eq!(summary.ram_label().as_deref(), Some("8.0 GB"));

    assert_eq!(summary.drives.len(), 1);
    assert_eq!(summary.excluded_drives, 2);
    let nvme = &summary.drives[0];
    assert_eq!(nvme.logical_path.as_deref(), Some("/dev/nvme0n1"));
    assert_eq!(nvme.identity(), Some("S4EMNX0N123456"));
    assert_eq!(nvme.capacity_bytes, Some(256_060_514_304));
    assert_eq!(
        summary.storage_label().as_deref(),
        Some("238.5 GB SAMSUNG MZVLB256HAHQ-000L7 (SN S4EMNX0N123456)")
    );

    assert_eq!(summary.graphics.len(), 1);
    let kinds: Vec<_> = summary.network.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NetworkKind::Wireless, NetworkKind::Ethernet]);
    assert_eq!(summary.network[0].mac.as_deref(), Some("a0:c5:89:12:34:56"));

    let battery = summary.battery.as_ref().unwrap();
    assert_eq!(battery.product.as_deref(), Some("DELL 0F5KN"));
    assert_eq!(battery.capacity, Some(60000));

    assert!(summary.multimedia.webcam);
    assert!(summary.multimedia.audio);
    assert!(summary.warnings.is_empty());
}

#[test]
fn test_string_encoded_array_payload() {
    let encoded = Value::String(serde_json::to_string(&json!([workstation()])).unwrap());
    let direct = extractor().extract(&workstation(), None).unwrap();
    let decoded = extractor().extract(&encoded, None).unwrap();
    assert_eq!(direct, decoded);
}

#[test]
fn test_extra_ephemeral_prefix() {
    let mut tree = workstation();
    tree["children"][0]["children"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "id": "disk", "class": "disk", "logicalname": "/dev/zram0", "serial": "ZRAMDEVICE", "size": 4 * GIB }));

    let default = extractor().extract(&tree, None).unwrap();
    assert_eq!(default.drives.len(), 2);

    let config = ExtractorConfig {
        extra_ephemeral_prefixes: vec!["zram".to_string()],
        ..ExtractorConfig::default()
    };
    let filtered = HardwareExtractor::new(&config).extract(&tree, None).unwrap();
    assert_eq!(filtered.drives.len(), 1);
    assert_eq!(filtered.excluded_drives, 3);
}

#[test]
fn test_memory_falls_back_to_summary() {
    let tree = json!({ "id": "box", "class": "system", "children": [] });

    let summary = extractor().extract(&tree, Some("16 GB")).unwrap();
    assert_eq!(summary.memory_total_bytes, Some(16 * GIB));
    assert_eq!(summary.memory_total_source, MemoryTotalSource::Summary);

    let summary = extractor().extract(&tree, Some("lots")).unwrap();
    assert_eq!(summary.memory_total_bytes, None);
    assert_eq!(summary.memory_total_source, MemoryTotalSource::Unknown);
    assert!(summary
        .warnings
        .iter()
        .any(|w| w.category == HardwareCategory::Memory));

    let summary = extractor().extract(&tree, None).unwrap();
    assert_eq!(summary.memory_total_bytes, None);
    assert!(summary.warnings.is_empty());
}

#[test]
fn test_bad_field_is_a_warning() {
    let tree = json!({
        "id": "box",
        "class": "system",
        "children": [{
            "id": "disk",
            "class": "disk",
            "logicalname": "/dev/sda",
            "serial": "WD-WX11A",
            "size": { "value": 12 }
        }]
    });

    let summary = extractor().extract(&tree, None).unwrap();
    assert_eq!(summary.drives.len(), 1);
    assert_eq!(summary.drives[0].capacity_bytes, None);
    assert!(!summary.warnings.is_empty());
}

#[test]
fn test_depth_limit_drops_subtrees() {
    let config = ExtractorConfig {
        max_depth: 1,
        ..ExtractorConfig::default()
    };
    let summary = HardwareExtractor::new(&config)
        .extract(&workstation(), None)
        .unwrap();

    assert!(summary.drives.is_empty());
    assert!(summary
        .warnings
        .iter()
        .any(|w| w.category == HardwareCategory::Tree));
}

#[test]
fn test_unreadable_tree_is_fatal() {
    for payload in [json!(42), json!("not json"), json!([]), json!([{}, {}]), Value::Null] {
        let result = extractor().extract(&payload, None);
        assert_matches!(result, Err(Error::MalformedTree(_)), "payload {}", payload);
    }
}
