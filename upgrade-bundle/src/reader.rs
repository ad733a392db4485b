//! Reading back an existing bundle

use std::path::Path;

use crate::bundle::{Bundle, MANIFEST_TERMINATOR};
use crate::error::{BundleError, Result};
use crate::manifest::{Manifest, fingerprint};

impl Bundle {
    /// Split an encoded bundle into its manifest and payloads.
    ///
    /// Only the container structure is checked here; use [`Bundle::verify`]
    /// to check fingerprints and partition sizes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let end = data
            .iter()
            .position(|&b| b == MANIFEST_TERMINATOR)
            .ok_or_else(|| BundleError::malformed("manifest terminator not found"))?;

        let manifest: Manifest = serde_json::from_slice(&data[..end])?;

        let mut rest = &data[end + 1..];
        let mut payloads = Vec::with_capacity(manifest.partitions.len());
        for partition in &manifest.partitions {
            let size = usize::try_from(partition.payload_size)
                .ok()
                .filter(|&size| size <= rest.len())
                .ok_or_else(|| {
                    BundleError::malformed(format!(
                        "{} payload truncated: expected {} bytes, {} left",
                        partition.name,
                        partition.payload_size,
                        rest.len()
                    ))
                })?;
            let (payload, tail) = rest.split_at(size);
            payloads.push(payload.to_vec());
            rest = tail;
        }

        if !rest.is_empty() {
            return Err(BundleError::malformed(format!(
                "{} trailing bytes after last payload",
                rest.len()
            )));
        }

        Ok(Self::new(manifest, payloads))
    }

    /// Read and parse the bundle stored at `path`
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| BundleError::io(path, e))?;
        Self::parse(&data)
    }

    /// Check every payload against its fingerprint and partition size
    pub fn verify(&self) -> Result<()> {
        for (partition, payload) in self.manifest().partitions.iter().zip(self.payloads()) {
            let actual = fingerprint(payload);
            if actual != partition.sha1 {
                return Err(BundleError::malformed(format!(
                    "{} fingerprint mismatch: manifest {}, payload {}",
                    partition.name, partition.sha1, actual
                )));
            }
            if let Some(capacity) = partition.partition_size
                && partition.payload_size > capacity
            {
                return Err(BundleError::PartitionOverflow {
                    component: partition.name,
                    size: partition.payload_size,
                    capacity,
                });
            }
        }
        Ok(())
    }
}
