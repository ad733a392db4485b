//! Bundle manifest: the JSON header the device updater reads first

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, Serializer};
use sha1::{Digest, Sha1};

use crate::config::BundleConfig;
use crate::layout::Component;

/// `kernelMem` placeholder when the kernel gets the fixed OS memory size
pub const KERNEL_MEM_OS: &str = "${osmem}";
/// `kernelMem` placeholder when CMA carves its pool out of total RAM
pub const KERNEL_MEM_TOTAL: &str = "${totalmem}";
pub const MTD_PREFIX: &str = "hi_sfc:";
pub const DEFAULT_OSMEM: &str = "32M";
pub const INIT_CMDLINE: &str = "init=/init";
/// Stages skipped by the updater when no bootloader is shipped
pub const SKIP_WITHOUT_BOOT: [&str; 2] = ["boot", "env"];

/// Number of hex digits kept from the SHA-1 digest
pub const FINGERPRINT_LEN: usize = 8;

/// Short SHA-1 fingerprint of `data`: the first 8 lowercase hex digits.
pub fn fingerprint(data: &[u8]) -> String {
    let mut digest = hex::encode(Sha1::digest(data));
    digest.truncate(FINGERPRINT_LEN);
    digest
}

/// One flashed component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionDescriptor {
    pub name: Component,
    pub payload_size: u64,
    pub sha1: String,
    /// Fixed partition size; absent for tightly packed partitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_size: Option<u64>,
}

impl PartitionDescriptor {
    pub fn new(name: Component, data: &[u8], partition_size: Option<u64>) -> Self {
        Self {
            name,
            payload_size: data.len() as u64,
            sha1: fingerprint(data),
            partition_size,
        }
    }
}

impl fmt::Display for PartitionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} size {:#09x} sha1 {}",
            self.name, self.payload_size, self.sha1
        )?;
        match self.partition_size {
            Some(size) => write!(f, " partition {:#09x}", size),
            None => write!(f, " packed"),
        }
    }
}

/// Manifest written in front of the payloads
///
/// Field order is the serialization order: the fixed keys and
/// `partitions` first, then the optional `skip` and `additionalCmdline`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub kernel_mem: String,
    pub set_total_mem: bool,
    pub mtd_prefix: String,
    pub osmem: String,
    pub partitions: Vec<PartitionDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_cmdline: Option<String>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            kernel_mem: KERNEL_MEM_OS.to_string(),
            set_total_mem: true,
            mtd_prefix: MTD_PREFIX.to_string(),
            osmem: DEFAULT_OSMEM.to_string(),
            partitions: Vec::new(),
            skip: None,
            additional_cmdline: None,
        }
    }
}

impl Manifest {
    /// Manifest skeleton for `config`, with no partitions yet
    pub fn new(config: &BundleConfig) -> Self {
        let mut manifest = Self::default();

        if config.boot.is_none() {
            manifest.skip = Some(SKIP_WITHOUT_BOOT.iter().map(|s| s.to_string()).collect());
        }

        let mut cmdline = Vec::new();
        if config.init {
            cmdline.push(INIT_CMDLINE);
        }
        if let Some(cma) = &config.cma {
            cmdline.push(cma.as_str());
            manifest.kernel_mem = KERNEL_MEM_TOTAL.to_string();
        }
        if !cmdline.is_empty() {
            manifest.additional_cmdline = Some(cmdline.join(" "));
        }

        manifest
    }

    /// Append `partition` and return it as stored
    pub fn push(&mut self, partition: PartitionDescriptor) -> &PartitionDescriptor {
        let index = self.partitions.len();
        self.partitions.push(partition);
        &self.partitions[index]
    }

    /// Sum of all payload sizes
    pub fn payload_size(&self) -> u64 {
        self.partitions.iter().map(|p| p.payload_size).sum()
    }

    /// Encode the manifest as the updater expects it
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(256);
        self.write_json(&mut out)?;
        Ok(out)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        let mut ser = Serializer::with_formatter(writer, ManifestFormatter);
        self.serialize(&mut ser)
    }
}

/// Single-line JSON with `", "` and `": "` separators and every non-ASCII
/// character escaped as `\uXXXX`, the encoding the device updater was
/// written against.
struct ManifestFormatter;

impl Formatter for ManifestFormatter {
    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "kernelMem: {}", self.kernel_mem)?;
        if let Some(skip) = &self.skip {
            writeln!(f, "skip: {}", skip.join(", "))?;
        }
        if let Some(cmdline) = &self.additional_cmdline {
            writeln!(f, "cmdline: {}", cmdline)?;
        }
        for partition in &self.partitions {
            writeln!(f, "  {}", partition)?;
        }
        Ok(())
    }
}
