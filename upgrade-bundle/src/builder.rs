//! Bundle builder: checks each component against its partition and
//! collects the payloads in flashing order

use std::path::Path;

use crate::bundle::Bundle;
use crate::config::BundleConfig;
use crate::error::{BundleError, Result};
use crate::layout::{Component, PartitionLayout};
use crate::manifest::{Manifest, PartitionDescriptor};

/// Builder for upgrade bundles
///
/// Components must be added in flashing order (boot, kernel, rootfs);
/// [`BundleBuilder::from_config`] does that for a whole [`BundleConfig`].
#[derive(Debug, Clone)]
pub struct BundleBuilder {
    layout: PartitionLayout,
    pack: bool,
    manifest: Manifest,
    payloads: Vec<Vec<u8>>,
}

impl BundleBuilder {
    /// Start a bundle for `config` without reading any component yet
    pub fn new(config: &BundleConfig) -> Self {
        Self {
            layout: config.flash.layout(),
            pack: config.pack,
            manifest: Manifest::new(config),
            payloads: Vec::new(),
        }
    }

    /// Read every configured component and assemble the bundle
    pub fn from_config(config: &BundleConfig) -> Result<Bundle> {
        debug!("building bundle for {} flash", config.flash);

        let mut builder = Self::new(config);
        for (component, path) in config.components() {
            builder.add_file(component, path)?;
        }
        Ok(builder.build())
    }

    /// Whether `component` keeps a fixed-size partition.
    ///
    /// The bootloader always sits at a fixed offset; the rest only when
    /// packing is off.
    pub fn has_fixed_partition(&self, component: Component) -> bool {
        !self.pack || component == Component::Boot
    }

    /// Add a component image held in memory
    pub fn add(&mut self, component: Component, data: Vec<u8>) -> Result<&PartitionDescriptor> {
        let partition_size = if self.has_fixed_partition(component) {
            let capacity = self.layout.capacity(component);
            let size = data.len() as u64;
            if size > capacity {
                return Err(BundleError::PartitionOverflow {
                    component,
                    size,
                    capacity,
                });
            }
            Some(capacity)
        } else {
            None
        };

        let partition = PartitionDescriptor::new(component, &data, partition_size);
        info!("{}", partition);

        self.payloads.push(data);
        Ok(self.manifest.push(partition))
    }

    /// Read a component image from `path` and add it
    pub fn add_file<P: AsRef<Path>>(
        &mut self,
        component: Component,
        path: P,
    ) -> Result<&PartitionDescriptor> {
        let path = path.as_ref();
        debug!("reading {} image from {}", component, path.display());
        let data = std::fs::read(path).map_err(|e| BundleError::io(path, e))?;
        self.add(component, data)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn build(self) -> Bundle {
        Bundle::new(self.manifest, self.payloads)
    }
}
