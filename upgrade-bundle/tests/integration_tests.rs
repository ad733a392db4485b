//! Integration tests for upgrade-bundle

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tempfile::{NamedTempFile, TempDir};
use upgrade_bundle::{
    Bundle, BundleBuilder, BundleConfig, BundleError, Component, FlashSize, MANIFEST_TERMINATOR,
    fingerprint,
};

fn image_file(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

/// Split the output into its raw manifest JSON and payload area
fn split(bytes: &[u8]) -> (Value, &[u8]) {
    let end = bytes.iter().position(|&b| b == 0).unwrap();
    let manifest = serde_json::from_slice(&bytes[..end]).unwrap();
    (manifest, &bytes[end + 1..])
}

/// Boot-only 8MB bundle
#[test]
fn test_boot_only_bundle() {
    let boot = image_file(&[0x42; 4096]);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("upgrade.bin");

    let config = BundleConfig::new(&output).boot(boot.path());
    BundleBuilder::from_config(&config)
        .unwrap()
        .write_to_file(&output)
        .unwrap();

    let bytes = fs::read(&output).unwrap();
    let (manifest, payload) = split(&bytes);

    assert!(manifest.get("skip").is_none());
    assert!(manifest.get("additionalCmdline").is_none());
    assert_eq!(manifest["kernelMem"], "${osmem}");
    assert_eq!(manifest["setTotalMem"], true);
    assert_eq!(manifest["mtdPrefix"], "hi_sfc:");
    assert_eq!(manifest["osmem"], "32M");

    let partitions = manifest["partitions"].as_array().unwrap();
    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions[0]["name"], "boot");
    assert_eq!(partitions[0]["payloadSize"], 4096);
    assert_eq!(partitions[0]["sha1"], fingerprint(&[0x42; 4096]));
    assert_eq!(partitions[0]["partitionSize"], 0x40000);

    assert_eq!(payload, &[0x42; 4096][..]);
}

/// Every input appears once, in boot/kernel/rootfs order, with no padding
#[test]
fn test_full_bundle_layout() {
    let boot = image_file(b"u-boot");
    let kernel = image_file(&vec![0x11; 0x1234]);
    let rootfs = image_file(&vec![0x22; 0x4321]);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("upgrade.bin");

    // arguments given out of order still pack boot, kernel, rootfs
    let config = BundleConfig::new(&output)
        .rootfs(rootfs.path())
        .kernel(kernel.path())
        .boot(boot.path())
        .flash(FlashSize::Mb16);
    BundleBuilder::from_config(&config)
        .unwrap()
        .write_to_file(&output)
        .unwrap();

    let bytes = fs::read(&output).unwrap();
    let (manifest, payload) = split(&bytes);

    let names: Vec<_> = manifest["partitions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["boot", "kernel", "rootfs"]);
    assert_eq!(manifest["partitions"][1]["partitionSize"], 0x300000);
    assert_eq!(manifest["partitions"][2]["partitionSize"], 0xA00000);

    let mut expected = b"u-boot".to_vec();
    expected.extend(vec![0x11; 0x1234]);
    expected.extend(vec![0x22; 0x4321]);
    assert_eq!(payload, expected.as_slice());
}

/// Fingerprints survive a write and read back
#[test]
fn test_fingerprint_round_trip() {
    let kernel = image_file(b"some kernel bytes");
    let rootfs = image_file(b"some rootfs bytes");
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("upgrade.bin");

    let config = BundleConfig::new(&output)
        .kernel(kernel.path())
        .rootfs(rootfs.path())
        .pack(true);
    BundleBuilder::from_config(&config)
        .unwrap()
        .write_to_file(&output)
        .unwrap();

    let bundle = Bundle::read_from_file(&output).unwrap();
    bundle.verify().unwrap();
    for (partition, payload) in bundle.manifest().partitions.iter().zip(bundle.payloads()) {
        assert_eq!(partition.sha1, fingerprint(payload));
        assert_eq!(partition.sha1.len(), 8);
        assert!(partition.sha1.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

/// Tight packing drops partitionSize for everything but boot
#[test]
fn test_pack_mode() {
    let boot = image_file(b"boot");
    let kernel = image_file(b"kernel");
    let rootfs = image_file(b"rootfs");

    let config = BundleConfig::new("unused.bin")
        .boot(boot.path())
        .kernel(kernel.path())
        .rootfs(rootfs.path())
        .pack(true);
    let bundle = BundleBuilder::from_config(&config).unwrap();

    let sizes: Vec<_> = bundle
        .manifest()
        .partitions
        .iter()
        .map(|p| (p.name, p.partition_size))
        .collect();
    assert_eq!(
        sizes,
        [
            (Component::Boot, Some(0x40000)),
            (Component::Kernel, None),
            (Component::Rootfs, None),
        ]
    );
}

/// Kernel exactly the size of its partition is accepted
#[test]
fn test_kernel_fills_partition() {
    let kernel = image_file(&vec![0u8; 0x200000]);
    let config = BundleConfig::new("unused.bin").kernel(kernel.path());
    let bundle = BundleBuilder::from_config(&config).unwrap();
    assert_eq!(bundle.manifest().partitions[0].payload_size, 0x200000);
}

/// One byte too many aborts without touching the output
#[test]
fn test_kernel_overflow_writes_nothing() {
    let kernel = image_file(&vec![0u8; 0x200001]);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("upgrade.bin");

    let config = BundleConfig::new(&output).kernel(kernel.path());
    let err = BundleBuilder::from_config(&config).unwrap_err();

    assert!(matches!(
        err,
        BundleError::PartitionOverflow {
            component: Component::Kernel,
            size: 0x200001,
            capacity: 0x200000,
        }
    ));
    assert!(!output.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// Rootfs limits differ between the two flash sizes
#[test]
fn test_rootfs_limit_per_flash() {
    let rootfs = image_file(&vec![0u8; 0x500001]);

    let small = BundleConfig::new("unused.bin").rootfs(rootfs.path());
    assert!(matches!(
        BundleBuilder::from_config(&small),
        Err(BundleError::PartitionOverflow { .. })
    ));

    let large = small.clone().flash(FlashSize::Mb16);
    assert!(BundleBuilder::from_config(&large).is_ok());
}

/// Command line fragments and memory placeholder
#[test]
fn test_cmdline_and_kernel_mem() {
    let kernel = image_file(b"kernel");

    let cases = [
        (false, None, None, "${osmem}"),
        (true, None, Some("init=/init"), "${osmem}"),
        (false, Some("cma=16M"), Some("cma=16M"), "${totalmem}"),
        (true, Some("cma=16M"), Some("init=/init cma=16M"), "${totalmem}"),
    ];

    for (init, cma, cmdline, kernel_mem) in cases {
        let mut config = BundleConfig::new("unused.bin")
            .kernel(kernel.path())
            .init(init);
        if let Some(cma) = cma {
            config = config.cma(cma);
        }
        let bundle = BundleBuilder::from_config(&config).unwrap();
        let manifest = bundle.manifest();

        assert_eq!(manifest.additional_cmdline.as_deref(), cmdline);
        assert_eq!(manifest.kernel_mem, kernel_mem);
        assert_eq!(
            manifest.skip.as_deref(),
            Some(&["boot".to_string(), "env".to_string()][..])
        );
    }
}

/// A missing input is reported with its path
#[test]
fn test_missing_input() {
    let config = BundleConfig::new("unused.bin").kernel("/nonexistent/uImage");
    match BundleBuilder::from_config(&config) {
        Err(BundleError::Io { path, .. }) => assert_eq!(path, Path::new("/nonexistent/uImage")),
        other => panic!("expected Io error, got {other:?}"),
    }
}

/// An empty bundle still carries a manifest and terminator
#[test]
fn test_empty_bundle() {
    let bundle = BundleBuilder::from_config(&BundleConfig::new("unused.bin")).unwrap();
    let bytes = bundle.to_bytes().unwrap();

    assert_eq!(bytes.last(), Some(&MANIFEST_TERMINATOR));
    let (manifest, payload) = split(&bytes);
    assert!(payload.is_empty());
    assert_eq!(manifest["partitions"], Value::Array(vec![]));
    assert_eq!(manifest["skip"], serde_json::json!(["boot", "env"]));
}

/// An existing output is replaced only on success
#[test]
fn test_existing_output_replaced() {
    let kernel = image_file(b"new kernel");
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("upgrade.bin");
    fs::write(&output, b"stale").unwrap();

    let config = BundleConfig::new(&output).kernel(kernel.path());
    let bundle = BundleBuilder::from_config(&config).unwrap();
    bundle.write_to_file(&output).unwrap();

    assert_eq!(fs::read(&output).unwrap(), bundle.to_bytes().unwrap());
}
